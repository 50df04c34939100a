// src/layout.rs

//! Two-pass strip layout.
//!
//! The canvas cannot be allocated until every glyph has been measured, and a
//! source's render slot only ever holds one glyph. So the engine walks the
//! text twice: once to measure, once to draw, re-rendering every glyph on
//! the second walk.

use crate::canvas::PixelCanvas;
use crate::rasterizer::{FontFace, FontFallbackChain};
use log::*;

const SPACE: char = ' ';

/// Final strip dimensions produced by the measure pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

/// Output of the draw pass.
#[derive(Debug)]
pub struct Strip {
    pub canvas: PixelCanvas,
    /// Codepoints no font could render, in text order.
    pub unresolved: Vec<char>,
}

pub struct LayoutEngine<'a, F: FontFace> {
    chain: &'a mut FontFallbackChain<F>,
    space_width: u32,
}

impl<'a, F: FontFace> LayoutEngine<'a, F> {
    pub fn new(chain: &'a mut FontFallbackChain<F>, space_width: u32) -> Self {
        Self { chain, space_width }
    }

    /// Pass 1: total advance and tallest glyph over `text`.
    pub fn measure(&mut self, text: &[char]) -> Extent {
        let mut extent = Extent::default();
        for &ch in text {
            if ch == SPACE {
                extent.width = extent.width.saturating_add(self.space_width);
                continue;
            }
            match self.chain.resolve(ch) {
                Some(resolved) => {
                    extent.width = extent.width.saturating_add(resolved.size.advance);
                    extent.height = extent.height.max(resolved.size.height);
                }
                None => debug!("LayoutEngine: U+{:04X} unresolved while measuring", ch as u32),
            }
        }
        extent
    }

    /// Pass 2: allocate a canvas of `extent` and draw `text` left to right.
    pub fn draw(&mut self, text: &[char], extent: Extent) -> Strip {
        let mut canvas = PixelCanvas::new(extent.width, extent.height);
        let mut unresolved = Vec::new();

        for &ch in text {
            if ch == SPACE {
                canvas.advance(self.space_width);
                continue;
            }
            match self.chain.resolve(ch) {
                Some(resolved) => {
                    let x = canvas.cursor();
                    let advance = resolved.draw(&mut canvas, x);
                    canvas.advance(advance);
                }
                None => {
                    warn!("Missing glyph for codepoint U+{:04X}", ch as u32);
                    unresolved.push(ch);
                }
            }
        }

        if canvas.cursor() != extent.width {
            warn!(
                "LayoutEngine: drew {}px but measured {}px",
                canvas.cursor(),
                extent.width
            );
        }

        Strip { canvas, unresolved }
    }

    /// Measure then draw.
    pub fn layout(&mut self, text: &[char]) -> Strip {
        let extent = self.measure(text);
        info!("width: {}, height: {}", extent.width, extent.height);
        self.draw(text, extent)
    }
}
