//! Windowless rendering-context platform layer.
//!
//! This module is responsible for:
//! - anchoring on the host's hidden window (or creating one) and obtaining
//!   its device context
//! - negotiating a pixel format and a rendering context, and making it current
//! - owning those handles and releasing them in reverse order
//! - the process entry point that hosts the application hook
//!
//! Native calls sit behind [`ContextDriver`]; [`WglDriver`] is the Windows
//! implementation.

mod args;
mod config;
mod driver;
mod entry;
mod error;
mod windowless;

#[cfg(windows)]
mod wgl;

#[cfg(test)]
pub(crate) mod testing;

pub use args::Arguments;
pub use config::{Configuration, PixelFormat};
pub use driver::ContextDriver;
pub use entry::{FAILURE_STATUS, Launcher, exit_status_byte, run};
pub use error::ContextError;
pub use windowless::{ContextState, WindowlessContext};

#[cfg(windows)]
pub use wgl::WglDriver;
#[cfg(windows)]
pub use windowless::WglContext;
