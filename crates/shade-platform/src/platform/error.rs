use thiserror::Error;

/// Failure of one step of windowless context creation.
///
/// Every variant leaves the owning [`WindowlessContext`](super::WindowlessContext)
/// in the `Uninitialized` state; handles acquired before the failing step have
/// already been released when this value is observed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The hidden anchor window (or its window class) could not be created.
    #[error("cannot create hidden window: {reason}")]
    SurfaceCreation { reason: String },

    /// No hardware-accelerated pixel format matches the requested capabilities.
    #[error("no accelerated pixel format available: {reason}")]
    PixelFormatUnavailable { reason: String },

    /// The driver refused to create a rendering context.
    #[error("cannot create rendering context: {reason}")]
    ContextCreation { reason: String },

    /// The rendering context exists but cannot be made current on this thread.
    #[error("cannot make rendering context current: {reason}")]
    MakeCurrent { reason: String },

    /// A context is already active on this owner.
    #[error("context already created")]
    AlreadyCreated,
}

impl ContextError {
    pub fn surface_creation(reason: impl Into<String>) -> Self {
        Self::SurfaceCreation { reason: reason.into() }
    }

    pub fn pixel_format_unavailable(reason: impl Into<String>) -> Self {
        Self::PixelFormatUnavailable { reason: reason.into() }
    }

    pub fn context_creation(reason: impl Into<String>) -> Self {
        Self::ContextCreation { reason: reason.into() }
    }

    pub fn make_current(reason: impl Into<String>) -> Self {
        Self::MakeCurrent { reason: reason.into() }
    }

    /// Human-readable name of the creation step that failed.
    pub fn step(&self) -> &'static str {
        match self {
            Self::SurfaceCreation { .. } => "hidden window creation",
            Self::PixelFormatUnavailable { .. } => "pixel format selection",
            Self::ContextCreation { .. } => "rendering context creation",
            Self::MakeCurrent { .. } => "context activation",
            Self::AlreadyCreated => "context creation",
        }
    }
}
