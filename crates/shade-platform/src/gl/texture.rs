//! Dimension-generic texture wrapper.
//!
//! `Texture<D>` owns one GL texture object of a 1-, 2- or 3-dimensional
//! target. Wrapping takes exactly one mode per dimension, and image uploads
//! take a `[u32; D]` size, so the dimension count is checked at compile time.
//! Target/dimension agreement and rectangle-texture restrictions are checked
//! at runtime and reported as [`TextureError`].
//!
//! Wrapping and both filters must be set before sampling, otherwise the
//! texture is incomplete.

use glow::HasContext;
use thiserror::Error;

/// Number of texture units a layer may address.
pub const MAX_LAYERS: u32 = 32;

/// GL texture target.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureTarget {
    Texture1D,
    Texture2D,
    Texture3D,
    /// Array of 1D textures, two dimensions in total.
    Array1D,
    /// Array of 2D textures, three dimensions in total.
    Array2D,
    /// Unnormalized coordinates; no mipmaps and no repeating wrap modes.
    Rectangle,
}

impl TextureTarget {
    pub fn dimensions(self) -> usize {
        match self {
            Self::Texture1D => 1,
            Self::Texture2D | Self::Array1D | Self::Rectangle => 2,
            Self::Texture3D | Self::Array2D => 3,
        }
    }

    /// Plain target for a dimension count.
    pub fn default_for(dimensions: usize) -> Option<Self> {
        match dimensions {
            1 => Some(Self::Texture1D),
            2 => Some(Self::Texture2D),
            3 => Some(Self::Texture3D),
            _ => None,
        }
    }

    pub fn gl_enum(self) -> u32 {
        match self {
            Self::Texture1D => glow::TEXTURE_1D,
            Self::Texture2D => glow::TEXTURE_2D,
            Self::Texture3D => glow::TEXTURE_3D,
            Self::Array1D => glow::TEXTURE_1D_ARRAY,
            Self::Array2D => glow::TEXTURE_2D_ARRAY,
            Self::Rectangle => glow::TEXTURE_RECTANGLE,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Wrapping {
    ClampToEdge,
    ClampToBorder,
    Repeat,
    MirroredRepeat,
}

impl Wrapping {
    pub fn gl_enum(self) -> u32 {
        match self {
            Self::ClampToEdge => glow::CLAMP_TO_EDGE,
            Self::ClampToBorder => glow::CLAMP_TO_BORDER,
            Self::Repeat => glow::REPEAT,
            Self::MirroredRepeat => glow::MIRRORED_REPEAT,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Mip level selection for minification.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Mipmap {
    /// Sample level 0 only.
    Base,
    Nearest,
    Linear,
}

fn minification_enum(filter: Filter, mipmap: Mipmap) -> u32 {
    match (filter, mipmap) {
        (Filter::Nearest, Mipmap::Base) => glow::NEAREST,
        (Filter::Linear, Mipmap::Base) => glow::LINEAR,
        (Filter::Nearest, Mipmap::Nearest) => glow::NEAREST_MIPMAP_NEAREST,
        (Filter::Nearest, Mipmap::Linear) => glow::NEAREST_MIPMAP_LINEAR,
        (Filter::Linear, Mipmap::Nearest) => glow::LINEAR_MIPMAP_NEAREST,
        (Filter::Linear, Mipmap::Linear) => glow::LINEAR_MIPMAP_LINEAR,
    }
}

fn magnification_enum(filter: Filter) -> u32 {
    match filter {
        Filter::Nearest => glow::NEAREST,
        Filter::Linear => glow::LINEAR,
    }
}

/// Internal format plus the layout of uploaded pixel data.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ImageFormat {
    pub internal_format: u32,
    pub format: u32,
    pub ty: u32,
}

impl ImageFormat {
    pub const RGBA8: Self = Self {
        internal_format: glow::RGBA8,
        format: glow::RGBA,
        ty: glow::UNSIGNED_BYTE,
    };

    pub const R8: Self = Self {
        internal_format: glow::R8,
        format: glow::RED,
        ty: glow::UNSIGNED_BYTE,
    };

    /// Bytes per texel of the upload layout, for byte-per-channel layouts.
    pub fn bytes_per_texel(&self) -> Option<usize> {
        if !matches!(self.ty, glow::UNSIGNED_BYTE | glow::BYTE) {
            return None;
        }
        match self.format {
            glow::RED | glow::RED_INTEGER => Some(1),
            glow::RG | glow::RG_INTEGER => Some(2),
            glow::RGB | glow::BGR => Some(3),
            glow::RGBA | glow::BGRA => Some(4),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum TextureError {
    #[error("target {target:?} is {expected}-dimensional, texture is {actual}-dimensional")]
    DimensionMismatch {
        target: TextureTarget,
        expected: usize,
        actual: usize,
    },

    #[error("no default target for {0}-dimensional textures")]
    UnsupportedDimensions(usize),

    #[error("texture layer {0} out of range (0..32)")]
    LayerOutOfRange(u32),

    #[error("{0:?} wrapping is not supported on rectangle textures")]
    UnsupportedWrapping(Wrapping),

    #[error("rectangle textures cannot be mipmapped")]
    MipmapOnRectangle,

    #[error("image size must be non-zero in every dimension, got {0:?}")]
    EmptyImage(Vec<u32>),

    #[error("image extent {0} exceeds the GL size range")]
    SizeOutOfRange(u32),

    #[error("sub-image offset must be non-negative in every dimension, got {0:?}")]
    NegativeOffset(Vec<i32>),

    #[error("image data holds {actual} bytes, {expected} needed")]
    DataTooShort { expected: usize, actual: usize },

    #[error("cannot create texture: {0}")]
    Creation(String),
}

fn check_target(target: TextureTarget, dimensions: usize) -> Result<(), TextureError> {
    if target.dimensions() != dimensions {
        return Err(TextureError::DimensionMismatch {
            target,
            expected: target.dimensions(),
            actual: dimensions,
        });
    }
    Ok(())
}

fn check_layer(layer: u32) -> Result<(), TextureError> {
    if layer >= MAX_LAYERS {
        return Err(TextureError::LayerOutOfRange(layer));
    }
    Ok(())
}

fn check_wrapping(target: TextureTarget, modes: &[Wrapping]) -> Result<(), TextureError> {
    if target != TextureTarget::Rectangle {
        return Ok(());
    }
    match modes
        .iter()
        .find(|m| matches!(m, Wrapping::Repeat | Wrapping::MirroredRepeat))
    {
        Some(&mode) => Err(TextureError::UnsupportedWrapping(mode)),
        None => Ok(()),
    }
}

fn check_mipmap(target: TextureTarget, mipmap: Mipmap) -> Result<(), TextureError> {
    if target == TextureTarget::Rectangle && mipmap != Mipmap::Base {
        return Err(TextureError::MipmapOnRectangle);
    }
    Ok(())
}

fn check_size(size: &[u32]) -> Result<(), TextureError> {
    if size.contains(&0) {
        return Err(TextureError::EmptyImage(size.to_vec()));
    }
    Ok(())
}

/// Validates `size` and converts it to the signed extents GL takes.
fn gl_extents<const D: usize>(size: [u32; D]) -> Result<[i32; D], TextureError> {
    check_size(&size)?;
    let mut extents = [0; D];
    for (extent, s) in extents.iter_mut().zip(size) {
        *extent = i32::try_from(s).map_err(|_| TextureError::SizeOutOfRange(s))?;
    }
    Ok(extents)
}

fn check_offset(offset: &[i32]) -> Result<(), TextureError> {
    if offset.iter().any(|&o| o < 0) {
        return Err(TextureError::NegativeOffset(offset.to_vec()));
    }
    Ok(())
}

/// Rejects `data` shorter than `size` texels of `format`. Layouts without a
/// known texel size are passed through.
fn check_data(format: ImageFormat, size: &[u32], data: &[u8]) -> Result<(), TextureError> {
    let Some(texel) = format.bytes_per_texel() else {
        return Ok(());
    };
    let expected = size
        .iter()
        .try_fold(texel, |acc, &s| acc.checked_mul(s as usize))
        .unwrap_or(usize::MAX);
    if data.len() < expected {
        return Err(TextureError::DataTooShort {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

const WRAP_AXES: [u32; 3] = [glow::TEXTURE_WRAP_S, glow::TEXTURE_WRAP_T, glow::TEXTURE_WRAP_R];

/// One GL texture object with `D` dimensions, bound to texture unit `layer`.
///
/// Not deleted on drop, since that needs the `glow::Context`; call
/// [`delete`](Self::delete) while the context is still current.
#[derive(Debug)]
pub struct Texture<const D: usize> {
    raw: glow::Texture,
    target: TextureTarget,
    layer: u32,
}

pub type Texture1D = Texture<1>;
pub type Texture2D = Texture<2>;
pub type Texture3D = Texture<3>;

impl<const D: usize> Texture<D> {
    pub const DIMENSIONS: usize = D;

    /// Creates a texture with the plain target for `D` dimensions.
    ///
    /// # Errors
    ///
    /// `layer` outside `0..MAX_LAYERS`, or GL refusing to create the object.
    pub fn new(gl: &glow::Context, layer: u32) -> Result<Self, TextureError> {
        let target = TextureTarget::default_for(D).ok_or(TextureError::UnsupportedDimensions(D))?;
        Self::with_target(gl, layer, target)
    }

    /// Creates a texture with an explicit target, e.g. `Array1D` or `Rectangle`.
    ///
    /// # Errors
    ///
    /// Also fails when `target` does not have `D` dimensions.
    pub fn with_target(
        gl: &glow::Context,
        layer: u32,
        target: TextureTarget,
    ) -> Result<Self, TextureError> {
        check_target(target, D)?;
        check_layer(layer)?;

        // SAFETY: object creation has no preconditions beyond a current context.
        let raw = unsafe { gl.create_texture() }.map_err(TextureError::Creation)?;
        Ok(Self { raw, target, layer })
    }

    pub fn target(&self) -> TextureTarget {
        self.target
    }

    pub fn layer(&self) -> u32 {
        self.layer
    }

    pub fn raw(&self) -> glow::Texture {
        self.raw
    }

    /// Activates this texture's unit and binds the texture to it.
    pub fn bind(&self, gl: &glow::Context) {
        unsafe {
            gl.active_texture(glow::TEXTURE0 + self.layer);
            gl.bind_texture(self.target.gl_enum(), Some(self.raw));
        }
    }

    /// Sets the wrap mode of each coordinate (S, T, R).
    ///
    /// # Errors
    ///
    /// Rectangle textures only accept clamping modes.
    pub fn set_wrapping(
        &self,
        gl: &glow::Context,
        modes: [Wrapping; D],
    ) -> Result<(), TextureError> {
        check_wrapping(self.target, &modes)?;

        self.bind(gl);
        for (axis, mode) in WRAP_AXES.iter().zip(modes) {
            unsafe {
                gl.tex_parameter_i32(self.target.gl_enum(), *axis, mode.gl_enum() as i32);
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Rectangle textures only accept [`Mipmap::Base`].
    pub fn set_minification_filter(
        &self,
        gl: &glow::Context,
        filter: Filter,
        mipmap: Mipmap,
    ) -> Result<(), TextureError> {
        check_mipmap(self.target, mipmap)?;

        self.bind(gl);
        unsafe {
            gl.tex_parameter_i32(
                self.target.gl_enum(),
                glow::TEXTURE_MIN_FILTER,
                minification_enum(filter, mipmap) as i32,
            );
        }
        Ok(())
    }

    pub fn set_magnification_filter(&self, gl: &glow::Context, filter: Filter) {
        self.bind(gl);
        unsafe {
            gl.tex_parameter_i32(
                self.target.gl_enum(),
                glow::TEXTURE_MAG_FILTER,
                magnification_enum(filter) as i32,
            );
        }
    }

    /// Allocates mip `level` with `size` and optionally uploads `data` into it.
    ///
    /// # Errors
    ///
    /// Any zero extent or one beyond `i32::MAX` in `size`, or `data` too short
    /// for `size`.
    pub fn set_image(
        &self,
        gl: &glow::Context,
        level: i32,
        format: ImageFormat,
        size: [u32; D],
        data: Option<&[u8]>,
    ) -> Result<(), TextureError> {
        let extents = gl_extents(size)?;
        if let Some(data) = data {
            check_data(format, &size, data)?;
        }

        let target = self.target.gl_enum();
        let internal = format.internal_format as i32;
        let pixels = glow::PixelUnpackData::Slice(data);

        self.bind(gl);
        // SAFETY: the texture is bound to `target`. When present, `data` must
        // cover `size` texels laid out as `format`.
        unsafe {
            match extents.as_slice() {
                &[w] => gl.tex_image_1d(
                    target,
                    level,
                    internal,
                    w,
                    0,
                    format.format,
                    format.ty,
                    pixels,
                ),
                &[w, h] => gl.tex_image_2d(
                    target,
                    level,
                    internal,
                    w,
                    h,
                    0,
                    format.format,
                    format.ty,
                    pixels,
                ),
                &[w, h, d] => gl.tex_image_3d(
                    target,
                    level,
                    internal,
                    w,
                    h,
                    d,
                    0,
                    format.format,
                    format.ty,
                    pixels,
                ),
                _ => return Err(TextureError::UnsupportedDimensions(D)),
            }
        }
        Ok(())
    }

    /// Replaces a `size` region of mip `level` starting at `offset`.
    ///
    /// The level must already be allocated with [`set_image`](Self::set_image).
    ///
    /// # Errors
    ///
    /// A negative `offset`, the same size checks as `set_image`, or `data`
    /// too short for `size`.
    pub fn set_sub_image(
        &self,
        gl: &glow::Context,
        level: i32,
        offset: [i32; D],
        format: ImageFormat,
        size: [u32; D],
        data: &[u8],
    ) -> Result<(), TextureError> {
        check_offset(&offset)?;
        let extents = gl_extents(size)?;
        check_data(format, &size, data)?;

        let target = self.target.gl_enum();
        let pixels = glow::PixelUnpackData::Slice(Some(data));

        self.bind(gl);
        // SAFETY: the texture is bound to `target` and `data` was checked
        // against `size` where the layout is known.
        unsafe {
            match (offset.as_slice(), extents.as_slice()) {
                (&[x], &[w]) => {
                    gl.tex_sub_image_1d(target, level, x, w, format.format, format.ty, pixels)
                }
                (&[x, y], &[w, h]) => gl.tex_sub_image_2d(
                    target,
                    level,
                    x,
                    y,
                    w,
                    h,
                    format.format,
                    format.ty,
                    pixels,
                ),
                (&[x, y, z], &[w, h, d]) => gl.tex_sub_image_3d(
                    target,
                    level,
                    x,
                    y,
                    z,
                    w,
                    h,
                    d,
                    format.format,
                    format.ty,
                    pixels,
                ),
                _ => return Err(TextureError::UnsupportedDimensions(D)),
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Rectangle textures have no mip chain.
    pub fn generate_mipmap(&self, gl: &glow::Context) -> Result<(), TextureError> {
        if self.target == TextureTarget::Rectangle {
            return Err(TextureError::MipmapOnRectangle);
        }

        self.bind(gl);
        unsafe { gl.generate_mipmap(self.target.gl_enum()) };
        Ok(())
    }

    pub fn delete(self, gl: &glow::Context) {
        unsafe { gl.delete_texture(self.raw) };
    }
}
