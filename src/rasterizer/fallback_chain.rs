//! Ordered font fallback.
//!
//! The `FontFallbackChain` holds the loaded glyph sources in priority order
//! and resolves each codepoint to the first source that can render it.

use super::font_driver::{FontDriver, FontFace};
use super::glyph_source::{GlyphSource, Size, SourceOptions};
use crate::canvas::PixelCanvas;
use crate::error::GlyphStripError;
use anyhow::Result;
use log::*;
use std::path::{Path, PathBuf};

/// A codepoint resolved against a source, borrowed until the next resolve.
pub struct ResolvedGlyph<'a, F: FontFace> {
    /// Position of the source in the chain.
    pub source_index: usize,
    pub size: Size,
    source: &'a GlyphSource<F>,
}

impl<F: FontFace> ResolvedGlyph<'_, F> {
    pub fn source(&self) -> &GlyphSource<F> {
        self.source
    }

    /// Composite the resolved glyph at column `x`; returns its advance.
    pub fn draw(&self, canvas: &mut PixelCanvas, x: u32) -> u32 {
        self.source.draw(canvas, x)
    }
}

/// Glyph sources in priority order. Fixed after construction.
pub struct FontFallbackChain<F: FontFace> {
    sources: Vec<GlyphSource<F>>,
}

impl<F: FontFace> FontFallbackChain<F> {
    pub fn new(sources: Vec<GlyphSource<F>>) -> Self {
        Self { sources }
    }

    /// Load every font in `paths`, in order.
    ///
    /// Fonts that fail to open are left out with a warning. A color font
    /// with no fixed bitmap sizes aborts the whole load.
    pub fn load<D, P>(driver: &D, paths: &[P], options: SourceOptions) -> Result<Self>
    where
        D: FontDriver<Face = F>,
        P: AsRef<Path>,
    {
        info!("FontFallbackChain: Loading {} fonts", paths.len());

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            match GlyphSource::load(driver, path, options) {
                Ok(source) => {
                    debug!(
                        "FontFallbackChain: [{}] '{}' as {:?} for {}px",
                        sources.len(),
                        path.display(),
                        source.format(),
                        source.pixel_size()
                    );
                    sources.push(source);
                }
                Err(e) if e.downcast_ref::<GlyphStripError>().is_some() => return Err(e),
                Err(e) => {
                    warn!(
                        "FontFallbackChain: Skipping font '{}': {:#}",
                        path.display(),
                        e
                    );
                }
            }
        }

        if sources.is_empty() {
            warn!("FontFallbackChain: No usable fonts; every glyph will be missing");
        }

        Ok(Self { sources })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|s| s.path().to_path_buf()).collect()
    }

    /// Render `ch` with the first source that can, and report its size.
    ///
    /// Each call overwrites the render slot of whichever sources it tries.
    pub fn resolve(&mut self, ch: char) -> Option<ResolvedGlyph<'_, F>> {
        for (source_index, source) in self.sources.iter_mut().enumerate() {
            if source.render_glyph(ch) {
                let size = source.glyph_size();
                trace!(
                    "FontFallbackChain: U+{:04X} -> {} ({}px advance, {}px high)",
                    ch as u32,
                    source.path().display(),
                    size.advance,
                    size.height
                );
                return Some(ResolvedGlyph {
                    source_index,
                    size,
                    source,
                });
            }
        }
        None
    }
}
