// src/app.rs

//! One run: decode the text, load the fonts, lay out the strip, write it.

use crate::cli::Args;
use crate::config::{Config, RenderConfig};
use crate::layout::{LayoutEngine, Strip};
use crate::rasterizer::{FontDriver, FontFallbackChain, FreeTypeFontDriver, SourceOptions};
use crate::text;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Apply command-line overrides on top of the loaded configuration.
pub fn effective_config(args: &Args, base: &Config) -> Config {
    let mut config = base.clone();
    if let Some(pixel_size) = args.pixel_size {
        config.render.pixel_size = pixel_size;
    }
    if let Some(output) = &args.output {
        config.output.path = output.clone();
    }
    config
}

/// The codepoints to render, from either UTF-8 text or hex notation.
pub fn codepoints(args: &Args) -> Result<Vec<char>> {
    let raw = args.text();
    let chars = if args.hex {
        let hex = text::decode_arg(raw)?.into_iter().collect::<String>();
        text::parse_hex_codepoints(&hex)?
    } else {
        text::decode_arg(raw)?
    };
    Ok(chars)
}

/// Load `fonts` through `driver` and lay out `text` with them.
pub fn render_text<D, P>(driver: &D, fonts: &[P], text: &[char], render: &RenderConfig) -> Result<Strip>
where
    D: FontDriver,
    P: AsRef<Path>,
{
    let options = SourceOptions {
        pixel_size: render.pixel_size,
        hinting: render.hinting,
    };
    let mut chain = FontFallbackChain::load(driver, fonts, options)?;
    let mut engine = LayoutEngine::new(&mut chain, render.space_width());
    Ok(engine.layout(text))
}

pub fn run(args: &Args, base: &Config) -> Result<()> {
    let config = effective_config(args, base);
    info!(
        "Rendering at {}px (space {}px) to '{}'",
        config.render.pixel_size,
        config.render.space_width(),
        config.output.path.display()
    );

    let chars = codepoints(args)?;
    let driver = FreeTypeFontDriver::new()?;
    let strip = render_text(&driver, &args.fonts(), &chars, &config.render)?;

    let (width, height) = (strip.canvas.width(), strip.canvas.height());
    strip
        .canvas
        .save_ppm(&config.output.path)
        .with_context(|| format!("Failed to write '{}'", config.output.path.display()))?;
    info!(
        "Wrote {}x{} image to '{}'",
        width,
        height,
        config.output.path.display()
    );
    Ok(())
}
