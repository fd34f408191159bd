/// Pixel format request handed to the device context acquirer.
///
/// Values are minimums; the driver picks the closest accelerated match.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PixelFormat {
    /// Color buffer depth, excluding alpha on most drivers.
    pub color_bits: u8,
    pub depth_bits: u8,
    pub stencil_bits: u8,
    pub double_buffered: bool,
}

impl Default for PixelFormat {
    fn default() -> Self {
        Self {
            color_bits: 32,
            depth_bits: 24,
            stencil_bits: 8,
            double_buffered: true,
        }
    }
}

/// Options for windowless context creation.
///
/// Cheap to copy and always valid; `Configuration::default()` requests a
/// double-buffered 32-bit RGBA format with a 24/8 depth-stencil buffer.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Configuration {
    pixel_format: PixelFormat,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pixel_format(&self) -> &PixelFormat {
        &self.pixel_format
    }

    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = pixel_format;
        self
    }

    pub fn with_color_bits(mut self, bits: u8) -> Self {
        self.pixel_format.color_bits = bits;
        self
    }

    pub fn with_depth_bits(mut self, bits: u8) -> Self {
        self.pixel_format.depth_bits = bits;
        self
    }

    pub fn with_stencil_bits(mut self, bits: u8) -> Self {
        self.pixel_format.stencil_bits = bits;
        self
    }

    pub fn with_double_buffer(mut self, enabled: bool) -> Self {
        self.pixel_format.double_buffered = enabled;
        self
    }
}
