use std::fmt;

use raw_window_handle::RawWindowHandle;

use super::{ContextError, PixelFormat};

/// Native operations needed to bring up a windowless rendering context.
///
/// Creation steps run in declaration order; each teardown operation undoes
/// exactly one of them and is only called with handles the matching creation
/// step returned. [`WindowlessContext`](super::WindowlessContext) owns the
/// sequencing and rollback, so implementations stay stateless per handle.
pub trait ContextDriver {
    type Window: Copy + fmt::Debug;
    type DeviceContext: Copy + fmt::Debug;
    type RenderingContext: Copy + fmt::Debug;

    /// Engine-facing object built from a current rendering context.
    type Context;

    /// Resolves a host-created window into a handle this driver can draw
    /// through, or `None` if it belongs to another windowing system.
    ///
    /// An adopted window is borrowed: it is never passed to
    /// [`destroy_window`](Self::destroy_window).
    fn adopt_window(&mut self, host: RawWindowHandle) -> Option<Self::Window>;

    /// Creates an invisible window whose only purpose is to own a device context.
    fn create_hidden_window(&mut self) -> Result<Self::Window, ContextError>;

    /// Obtains the window's device context and configures an accelerated pixel
    /// format on it.
    ///
    /// On error, any device context obtained along the way is already released.
    fn acquire_device_context(
        &mut self,
        window: Self::Window,
        format: &PixelFormat,
    ) -> Result<Self::DeviceContext, ContextError>;

    fn create_rendering_context(
        &mut self,
        device_context: Self::DeviceContext,
    ) -> Result<Self::RenderingContext, ContextError>;

    /// Binds the rendering context to the calling thread.
    fn make_current(
        &mut self,
        rendering_context: Self::RenderingContext,
        device_context: Self::DeviceContext,
    ) -> Result<(), ContextError>;

    /// Loads function pointers and capabilities for the current context.
    fn load_context(
        &mut self,
        device_context: Self::DeviceContext,
        rendering_context: Self::RenderingContext,
    ) -> Result<Self::Context, ContextError>;

    /// Detaches whatever context is current on the calling thread.
    fn release_current(&mut self, device_context: Self::DeviceContext);

    fn delete_rendering_context(&mut self, rendering_context: Self::RenderingContext);

    fn release_device_context(&mut self, window: Self::Window, device_context: Self::DeviceContext);

    fn destroy_window(&mut self, window: Self::Window);
}
