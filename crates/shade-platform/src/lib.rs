//! Shade platform crate.
//!
//! Offscreen OpenGL without a visible window: a hidden anchor window, its
//! device context and a current rendering context, owned as a unit by
//! [`platform::WindowlessContext`], plus the entry point that runs an
//! application hook inside a minimal event loop.

pub mod gl;
pub mod logging;
pub mod platform;

pub use gl::GlContext;
pub use platform::{Arguments, Configuration, ContextError, WindowlessContext};
