//! OpenGL-side collaborators of the windowless context.
//!
//! - [`context`] -- the engine-facing context object (function table, driver info).
//! - [`texture`] -- dimension-generic texture objects.

pub mod context;
pub mod texture;

pub use context::GlContext;
pub use texture::{
    Filter, ImageFormat, MAX_LAYERS, Mipmap, Texture, Texture1D, Texture2D, Texture3D,
    TextureError, TextureTarget, Wrapping,
};
