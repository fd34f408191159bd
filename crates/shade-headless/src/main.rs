//! Offscreen smoke application.
//!
//! Brings up a windowless GL context, reports what the driver offers, uploads
//! a small checkerboard texture and exits.
//!
//! Flags:
//! - `--deferred`: create the context through the recoverable path, retrying
//!   with a single-buffered format if the default one is refused.
//! - `--status <n>`: exit with `n` after a successful run.

use anyhow::Result;
use clap::Parser;
use shade_platform::Arguments;

#[derive(Parser, Debug)]
#[command(name = "shade-headless", about = "Offscreen OpenGL smoke test")]
#[cfg_attr(not(windows), allow(dead_code))]
struct Options {
    /// Create the context through the recoverable path, with a fallback format.
    #[arg(long)]
    deferred: bool,

    /// Exit status reported after a successful run.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    status: i32,
}

/// Parses the raw argument vector handed over by the platform layer.
fn parse(args: &[String]) -> Result<Options> {
    Ok(Options::try_parse_from(args)?)
}

#[cfg(windows)]
fn exec(args: Arguments<'_>) -> Result<i32> {
    use shade_platform::gl::{Filter, ImageFormat, Mipmap, Texture2D, Wrapping};
    use shade_platform::Configuration;
    use shade_platform::platform::WglContext;

    let options = parse(args.args())?;

    let ctx = if options.deferred {
        let mut ctx = WglContext::no_create_native(&args);
        let preferred = Configuration::default();
        let fallback = preferred.with_double_buffer(false).with_stencil_bits(0);
        if !ctx.try_create_context(&preferred) && !ctx.try_create_context(&fallback) {
            anyhow::bail!("no usable pixel format, double- or single-buffered");
        }
        ctx
    } else {
        WglContext::new(&args, &Configuration::default())?
    };

    let Some(context) = ctx.context() else {
        anyhow::bail!("context reported active without a GL context object");
    };

    println!("vendor:     {}", context.vendor());
    println!("renderer:   {}", context.renderer());
    println!("version:    {}", context.version_string());
    println!("extensions: {}", context.extensions().len());

    let gl = context.gl();
    let texture = Texture2D::new(gl, 0)?;
    texture.set_wrapping(gl, [Wrapping::ClampToEdge; 2])?;
    texture.set_minification_filter(gl, Filter::Nearest, Mipmap::Base)?;
    texture.set_magnification_filter(gl, Filter::Nearest);
    texture.set_image(gl, 0, ImageFormat::RGBA8, [4, 4], Some(&checkerboard(4)))?;
    texture.set_sub_image(gl, 0, [1, 1], ImageFormat::RGBA8, [2, 2], &checkerboard(2))?;
    log::info!("uploaded 4x4 checkerboard to {:?}", texture.raw());
    texture.delete(gl);

    Ok(options.status)
}

#[cfg(not(windows))]
fn exec(args: Arguments<'_>) -> Result<i32> {
    parse(args.args())?;
    anyhow::bail!("the windowless WGL backend is only available on Windows")
}

#[cfg_attr(not(windows), allow(dead_code))]
fn checkerboard(size: usize) -> Vec<u8> {
    (0..size * size)
        .flat_map(|i| {
            let (x, y) = (i % size, i / size);
            let v = if (x + y) % 2 == 0 { 0xff } else { 0x20 };
            [v, v, v, 0xff]
        })
        .collect()
}

shade_platform::windowless_main!(exec);

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(rest: &[&str]) -> Vec<String> {
        std::iter::once("shade-headless")
            .chain(rest.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn parses_status_and_deferred() {
        let options = parse(&argv(&["--deferred", "--status", "42"])).expect("valid flags");
        assert!(options.deferred);
        assert_eq!(options.status, 42);

        let options = parse(&argv(&["--status=-3"])).expect("negative status");
        assert!(!options.deferred);
        assert_eq!(options.status, -3);
    }

    #[test]
    fn defaults_to_eager_success() {
        let options = parse(&argv(&[])).expect("no flags");
        assert!(!options.deferred);
        assert_eq!(options.status, 0);
    }

    #[test]
    fn options_definition_is_consistent() {
        use clap::CommandFactory;
        Options::command().debug_assert();
    }

    #[test]
    fn rejects_unknown_and_incomplete_flags() {
        assert!(parse(&argv(&["--frobnicate"])).is_err());
        assert!(parse(&argv(&["--status"])).is_err());
        assert!(parse(&argv(&["--status", "abc"])).is_err());
    }

    #[test]
    fn checkerboard_alternates_texels() {
        let data = checkerboard(2);
        assert_eq!(data.len(), 16);
        assert_eq!(&data[0..4], &[0xff, 0xff, 0xff, 0xff]);
        assert_eq!(&data[4..8], &[0x20, 0x20, 0x20, 0xff]);
        assert_eq!(&data[12..16], &[0xff, 0xff, 0xff, 0xff]);
    }
}
