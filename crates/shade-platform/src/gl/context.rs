//! GL context object handed to the rest of the engine.
//!
//! `GlContext` wraps a `glow::Context` loaded for the currently bound
//! rendering context and records what the driver reported about itself.

use std::collections::HashSet;

use glow::HasContext;

/// A loaded `glow::Context` plus the driver's identification strings.
///
/// Only valid while the rendering context it was loaded for is current.
pub struct GlContext {
    gl: glow::Context,
    vendor: String,
    renderer: String,
    version_string: String,
}

impl GlContext {
    /// Wraps `gl`, querying vendor/renderer/version strings once.
    pub fn new(gl: glow::Context) -> Self {
        // SAFETY: glGetString with these enums has no preconditions beyond a
        // current context, which `gl` was loaded against.
        let (vendor, renderer, version_string) = unsafe {
            (
                gl.get_parameter_string(glow::VENDOR),
                gl.get_parameter_string(glow::RENDERER),
                gl.get_parameter_string(glow::VERSION),
            )
        };

        log::info!("GL {version_string} on {renderer} ({vendor})");

        Self {
            gl,
            vendor,
            renderer,
            version_string,
        }
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// Parsed GL version.
    pub fn version(&self) -> &glow::Version {
        self.gl.version()
    }

    /// Raw `GL_VERSION` string.
    pub fn version_string(&self) -> &str {
        &self.version_string
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn renderer(&self) -> &str {
        &self.renderer
    }

    pub fn extensions(&self) -> &HashSet<String> {
        self.gl.supported_extensions()
    }

    pub fn supports_extension(&self, name: &str) -> bool {
        self.extensions().contains(name)
    }

    /// Whether the context reports at least `major.minor`.
    pub fn is_version_at_least(&self, major: u32, minor: u32) -> bool {
        version_at_least(self.version(), major, minor)
    }
}

fn version_at_least(version: &glow::Version, major: u32, minor: u32) -> bool {
    (version.major, version.minor) >= (major, minor)
}
