//! One loaded font and the rules for drawing its glyphs into a canvas.
//!
//! A `GlyphSource` is classified once, when it is loaded, as either a color
//! bitmap font (emoji, BGRA glyphs at a handful of fixed sizes) or a
//! monochrome font (scalable outlines rendered to coverage). The class picks
//! both the load flags and the compositing rule.

use super::font_driver::{BitmapView, FixedSize, FontDriver, FontFace, LoadFlags, PixelMode, CBDT};
use crate::canvas::{PixelCanvas, Rgba, BYTES_PER_PIXEL};
use crate::error::GlyphStripError;
use anyhow::{Context, Result};
use log::*;
use std::path::{Path, PathBuf};

/// Pixel format of a source's glyph bitmaps, fixed at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// BGRA bitmaps copied through with a channel swap.
    Color,
    /// Coverage bitmaps drawn as black ink with coverage as alpha.
    Monochrome,
}

impl PixelFormat {
    /// Color if the face has a non-empty `CBDT` table.
    pub fn classify<F: FontFace>(face: &mut F) -> Self {
        if face.sfnt_table_len(CBDT) != 0 {
            PixelFormat::Color
        } else {
            PixelFormat::Monochrome
        }
    }

    fn load_flags(self) -> LoadFlags {
        match self {
            PixelFormat::Color => LoadFlags::COLOR,
            PixelFormat::Monochrome => LoadFlags::empty(),
        }
    }
}

/// Advance and height of a rendered glyph, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub advance: u32,
    pub height: u32,
}

/// Per-source settings taken from the render configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceOptions {
    pub pixel_size: u32,
    pub hinting: bool,
}

/// BGRA source pixel to RGBA, alpha untouched.
pub fn bgra_to_rgba(bgra: [u8; 4]) -> Rgba {
    let [b, g, r, a] = bgra;
    Rgba::new(r, g, b, a)
}

/// Coverage value to black-on-transparent ink.
pub fn coverage_to_rgba(coverage: u8) -> Rgba {
    let ink = 255 - coverage;
    Rgba::new(ink, ink, ink, coverage)
}

/// Index of the fixed size whose width is closest to `target`.
///
/// Ties go to the earliest size in the list.
pub fn nearest_fixed_size(sizes: &[FixedSize], target: u32) -> Option<usize> {
    sizes
        .iter()
        .enumerate()
        .min_by_key(|(_, size)| (i64::from(size.width) - i64::from(target)).unsigned_abs())
        .map(|(index, _)| index)
}

fn truncate_26_6(value: i64) -> u32 {
    (value >> 6).clamp(0, i64::from(u32::MAX)) as u32
}

pub struct GlyphSource<F: FontFace> {
    face: F,
    format: PixelFormat,
    load_flags: LoadFlags,
    pixel_size: u32,
    path: PathBuf,
}

impl<F: FontFace> GlyphSource<F> {
    /// Open `path` through `driver` and configure it for `options`.
    ///
    /// Errors (open failure, pixel size rejected) mean the font is unusable
    /// for this run. A color font without fixed sizes fails with
    /// [`GlyphStripError::NoFixedSizes`].
    pub fn load<D>(driver: &D, path: &Path, options: SourceOptions) -> Result<Self>
    where
        D: FontDriver<Face = F>,
    {
        let mut face = driver.load_face(path)?;
        let format = PixelFormat::classify(&mut face);

        match format {
            PixelFormat::Color => {
                let sizes = face.fixed_sizes();
                let best = nearest_fixed_size(&sizes, options.pixel_size)
                    .ok_or_else(|| GlyphStripError::NoFixedSizes(path.to_path_buf()))?;
                face.select_fixed_size(best).with_context(|| {
                    format!("Failed to select fixed size in '{}'", path.display())
                })?;
                info!(
                    "{} is a color font, using fixed size {}x{} for target {}px",
                    path.display(),
                    sizes[best].width,
                    sizes[best].height,
                    options.pixel_size
                );
            }
            PixelFormat::Monochrome => {
                face.set_pixel_size(options.pixel_size).with_context(|| {
                    format!("Failed to configure '{}'", path.display())
                })?;
                info!(
                    "{} is a monochrome font at {}px",
                    path.display(),
                    options.pixel_size
                );
            }
        }

        let mut load_flags = format.load_flags();
        if !options.hinting {
            load_flags |= LoadFlags::NO_HINTING;
        }

        Ok(Self {
            face,
            format,
            load_flags,
            pixel_size: options.pixel_size,
            path: path.to_path_buf(),
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    pub fn face(&self) -> &F {
        &self.face
    }

    /// Load and rasterize the glyph for `ch` into this source's render slot.
    ///
    /// Returns false when the font has no glyph for `ch` or the library
    /// fails to load or render it.
    pub fn render_glyph(&mut self, ch: char) -> bool {
        let Some(glyph_index) = self.face.char_index(ch) else {
            return false;
        };
        if let Err(e) = self.face.load_glyph(glyph_index, self.load_flags) {
            debug!(
                "GlyphSource: {} failed to load U+{:04X}: {:#}",
                self.path.display(),
                ch as u32,
                e
            );
            return false;
        }
        if let Err(e) = self.face.render_glyph() {
            debug!(
                "GlyphSource: {} failed to render U+{:04X}: {:#}",
                self.path.display(),
                ch as u32,
                e
            );
            return false;
        }
        true
    }

    /// Size of the glyph rendered by the last successful `render_glyph`.
    pub fn glyph_size(&self) -> Size {
        let slot = self.face.glyph();
        Size {
            advance: truncate_26_6(slot.advance_x),
            height: truncate_26_6(slot.height),
        }
    }

    /// Composite the last rendered glyph into `canvas` at column `x`,
    /// bottom-aligned. Returns the glyph's advance in pixels.
    ///
    /// Rows that do not fit above the bottom edge are clipped from the
    /// bottom of the bitmap (the vertical offset is clamped to 0), and
    /// columns past the right edge are dropped.
    pub fn draw(&self, canvas: &mut PixelCanvas, x: u32) -> u32 {
        let slot = self.face.glyph();
        let bitmap = slot.bitmap;

        let visible_rows = bitmap.rows.min(canvas.height());
        if visible_rows < bitmap.rows {
            warn!(
                "GlyphSource: glyph from {} is {} rows, canvas is {}; clipping",
                self.path.display(),
                bitmap.rows,
                canvas.height()
            );
        }
        let y_offset = canvas.height() - visible_rows;

        match (self.format, bitmap.mode) {
            (PixelFormat::Color, PixelMode::Bgra) => {
                for y in 0..visible_rows {
                    if let (Some(src), Some(dest)) = (bitmap.row(y), canvas.span_mut(x, y + y_offset)) {
                        composite_bgra_row(src, dest);
                    }
                }
            }
            (PixelFormat::Monochrome, PixelMode::Gray | PixelMode::Mono) => {
                for y in 0..visible_rows {
                    if let Some(dest) = canvas.span_mut(x, y + y_offset) {
                        composite_coverage_row(&bitmap, y, dest);
                    }
                }
            }
            (format, mode) => {
                if bitmap.rows > 0 {
                    warn!(
                        "GlyphSource: {:?} font {} produced a {:?} bitmap; not drawing it",
                        format,
                        self.path.display(),
                        mode
                    );
                }
            }
        }

        truncate_26_6(slot.advance_x)
    }
}

fn composite_bgra_row(src: &[u8], dest: &mut [u8]) {
    for (src_px, dest_px) in src
        .chunks_exact(4)
        .zip(dest.chunks_exact_mut(BYTES_PER_PIXEL))
    {
        let rgba = bgra_to_rgba([src_px[0], src_px[1], src_px[2], src_px[3]]);
        dest_px.copy_from_slice(&rgba.to_bytes());
    }
}

fn composite_coverage_row(bitmap: &BitmapView<'_>, y: u32, dest: &mut [u8]) {
    let Some(src) = bitmap.row(y) else {
        return;
    };
    for (x, dest_px) in dest
        .chunks_exact_mut(BYTES_PER_PIXEL)
        .take(bitmap.width as usize)
        .enumerate()
    {
        let coverage = match bitmap.mode {
            PixelMode::Mono => {
                if src[x / 8] & (0x80 >> (x % 8)) != 0 {
                    255
                } else {
                    0
                }
            }
            _ => src[x],
        };
        dest_px.copy_from_slice(&coverage_to_rgba(coverage).to_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::headless_font_driver::{
        HeadlessFace, HeadlessFaceSpec, HeadlessFontDriver, HeadlessGlyph,
    };
    use test_log::test;

    const OPTIONS: SourceOptions = SourceOptions {
        pixel_size: 100,
        hinting: true,
    };

    fn load(spec: HeadlessFaceSpec) -> Result<GlyphSource<HeadlessFace>> {
        let driver = HeadlessFontDriver::new().with_face("font.ttf", spec);
        GlyphSource::load(&driver, Path::new("font.ttf"), OPTIONS)
    }

    #[test]
    fn test_coverage_extremes() {
        assert_eq!(coverage_to_rgba(255), Rgba::new(0, 0, 0, 255));
        assert_eq!(coverage_to_rgba(0), Rgba::new(255, 255, 255, 0));
        assert_eq!(coverage_to_rgba(100), Rgba::new(155, 155, 155, 100));
    }

    #[test]
    fn test_bgra_is_channel_permutation() {
        assert_eq!(bgra_to_rgba([1, 2, 3, 4]), Rgba::new(3, 2, 1, 4));
        assert_eq!(bgra_to_rgba([200, 0, 17, 0]), Rgba::new(17, 0, 200, 0));
    }

    #[test]
    fn test_nearest_fixed_size() {
        let sizes: Vec<FixedSize> = [64, 96, 160]
            .iter()
            .map(|&width| FixedSize { width, height: width })
            .collect();
        assert_eq!(nearest_fixed_size(&sizes, 100), Some(1));
        assert_eq!(nearest_fixed_size(&sizes, 10), Some(0));
        assert_eq!(nearest_fixed_size(&sizes, 500), Some(2));
        assert_eq!(nearest_fixed_size(&[], 100), None);
    }

    #[test]
    fn test_nearest_fixed_size_tie_picks_first() {
        let sizes = [
            FixedSize { width: 90, height: 90 },
            FixedSize { width: 110, height: 110 },
        ];
        assert_eq!(nearest_fixed_size(&sizes, 100), Some(0));
    }

    #[test]
    fn test_classification_follows_cbdt_table() {
        let mono = load(HeadlessFaceSpec::monochrome()).unwrap();
        assert_eq!(mono.format(), PixelFormat::Monochrome);
        assert_eq!(mono.face().pixel_size(), Some(100));
        assert_eq!(mono.face().selected_size(), None);

        let color = load(HeadlessFaceSpec::color(&[64, 96, 160])).unwrap();
        assert_eq!(color.format(), PixelFormat::Color);
        assert_eq!(color.face().selected_size(), Some(1));
        assert_eq!(color.face().pixel_size(), None);
    }

    #[test]
    fn test_source_remembers_target_pixel_size() {
        let mono = load(HeadlessFaceSpec::monochrome()).unwrap();
        assert_eq!(mono.pixel_size(), 100);

        // Color fonts keep the requested size even though a strike is used.
        let color = load(HeadlessFaceSpec::color(&[64, 96, 160])).unwrap();
        assert_eq!(color.pixel_size(), 100);
    }

    #[test]
    fn test_fixed_sizes_without_cbdt_stay_monochrome() {
        let mut spec = HeadlessFaceSpec::monochrome();
        spec.fixed_sizes = vec![FixedSize { width: 16, height: 16 }];
        let source = load(spec).unwrap();
        assert_eq!(source.format(), PixelFormat::Monochrome);
    }

    #[test]
    fn test_color_font_without_fixed_sizes_is_fatal() {
        let err = load(HeadlessFaceSpec::color(&[])).err().unwrap();
        assert_eq!(
            err.downcast_ref::<GlyphStripError>(),
            Some(&GlyphStripError::NoFixedSizes(PathBuf::from("font.ttf")))
        );
    }

    #[test]
    fn test_rejected_pixel_size_fails_load() {
        let mut spec = HeadlessFaceSpec::monochrome();
        spec.reject_pixel_size = true;
        let err = load(spec).err().unwrap();
        assert!(err.downcast_ref::<GlyphStripError>().is_none());
    }

    #[test]
    fn test_render_missing_glyph_is_soft_failure() {
        let mut source = load(HeadlessFaceSpec::monochrome()).unwrap();
        assert!(!source.render_glyph('A'));
    }

    #[test]
    fn test_render_failure_is_soft_failure() {
        let mut source = load(
            HeadlessFaceSpec::monochrome().with_broken_glyph('A', HeadlessGlyph::block(5, 2, 2)),
        )
        .unwrap();
        assert!(!source.render_glyph('A'));
    }

    #[test]
    fn test_color_source_loads_with_color_flag() {
        let mut source = load(
            HeadlessFaceSpec::color(&[96])
                .with_glyph('x', HeadlessGlyph::bgra(2, &[&[[1, 2, 3, 4], [5, 6, 7, 8]]])),
        )
        .unwrap();
        assert!(source.render_glyph('x'));
        assert_eq!(source.face().last_flags(), Some(LoadFlags::COLOR));
    }

    #[test]
    fn test_hinting_disabled_adds_flag() {
        let driver = HeadlessFontDriver::new().with_face(
            "font.ttf",
            HeadlessFaceSpec::monochrome().with_glyph('A', HeadlessGlyph::block(3, 1, 1)),
        );
        let options = SourceOptions {
            pixel_size: 32,
            hinting: false,
        };
        let mut source = GlyphSource::load(&driver, Path::new("font.ttf"), options).unwrap();
        assert!(source.render_glyph('A'));
        assert_eq!(source.face().last_flags(), Some(LoadFlags::NO_HINTING));
    }

    #[test]
    fn test_glyph_size_truncates_fixed_point() {
        let glyph = HeadlessGlyph::block(0, 1, 1).with_metrics((7 << 6) + 63, (9 << 6) + 1);
        let mut source = load(HeadlessFaceSpec::monochrome().with_glyph('A', glyph)).unwrap();
        assert!(source.render_glyph('A'));
        assert_eq!(source.glyph_size(), Size { advance: 7, height: 9 });
    }

    #[test]
    fn test_negative_metrics_clamp_to_zero() {
        let glyph = HeadlessGlyph::block(0, 1, 1).with_metrics(-128, -64);
        let mut source = load(HeadlessFaceSpec::monochrome().with_glyph('A', glyph)).unwrap();
        assert!(source.render_glyph('A'));
        assert_eq!(source.glyph_size(), Size::default());
    }

    #[test]
    fn test_draw_monochrome_bottom_aligned() {
        let glyph = HeadlessGlyph::gray(3, &[&[255, 0]]);
        let mut source = load(HeadlessFaceSpec::monochrome().with_glyph('A', glyph)).unwrap();
        assert!(source.render_glyph('A'));

        let mut canvas = PixelCanvas::new(4, 2);
        let advance = source.draw(&mut canvas, 1);
        assert_eq!(advance, 3);

        // Top row untouched, glyph on the bottom row starting at column 1.
        assert_eq!(canvas.pixel(1, 0), Some(Rgba::default()));
        assert_eq!(canvas.pixel(0, 1), Some(Rgba::default()));
        assert_eq!(canvas.pixel(1, 1), Some(Rgba::new(0, 0, 0, 255)));
        assert_eq!(canvas.pixel(2, 1), Some(Rgba::new(255, 255, 255, 0)));
        assert_eq!(canvas.pixel(3, 1), Some(Rgba::default()));
    }

    #[test]
    fn test_draw_color_permutes_channels() {
        let glyph = HeadlessGlyph::bgra(2, &[&[[10, 20, 30, 40], [50, 60, 70, 80]]]);
        let mut source = load(HeadlessFaceSpec::color(&[96]).with_glyph('x', glyph)).unwrap();
        assert!(source.render_glyph('x'));

        let mut canvas = PixelCanvas::new(2, 1);
        assert_eq!(source.draw(&mut canvas, 0), 2);
        assert_eq!(canvas.pixels(), &[30, 20, 10, 40, 70, 60, 50, 80]);
    }

    #[test]
    fn test_draw_mono_bitmap_expands_bits() {
        let glyph = HeadlessGlyph {
            advance_x: 3 << 6,
            height: 1 << 6,
            rows: 1,
            width: 3,
            pitch: 1,
            mode: PixelMode::Mono,
            buffer: vec![0b1010_0000],
        };
        let mut source = load(HeadlessFaceSpec::monochrome().with_glyph('A', glyph)).unwrap();
        assert!(source.render_glyph('A'));

        let mut canvas = PixelCanvas::new(3, 1);
        source.draw(&mut canvas, 0);
        assert_eq!(canvas.pixel(0, 0), Some(Rgba::new(0, 0, 0, 255)));
        assert_eq!(canvas.pixel(1, 0), Some(Rgba::new(255, 255, 255, 0)));
        assert_eq!(canvas.pixel(2, 0), Some(Rgba::new(0, 0, 0, 255)));
    }

    #[test]
    fn test_draw_taller_than_canvas_is_clipped() {
        let glyph = HeadlessGlyph::gray(1, &[&[10], &[20], &[30]]);
        let mut source = load(HeadlessFaceSpec::monochrome().with_glyph('A', glyph)).unwrap();
        assert!(source.render_glyph('A'));

        let mut canvas = PixelCanvas::new(1, 2);
        assert_eq!(source.draw(&mut canvas, 0), 1);
        assert_eq!(canvas.pixel(0, 0), Some(coverage_to_rgba(10)));
        assert_eq!(canvas.pixel(0, 1), Some(coverage_to_rgba(20)));
    }

    #[test]
    fn test_draw_past_right_edge_is_clipped() {
        let glyph = HeadlessGlyph::block(4, 4, 1);
        let mut source = load(HeadlessFaceSpec::monochrome().with_glyph('A', glyph)).unwrap();
        assert!(source.render_glyph('A'));

        let mut canvas = PixelCanvas::new(3, 2);
        assert_eq!(source.draw(&mut canvas, 1), 4);
        assert_eq!(canvas.pixel(2, 1), Some(Rgba::new(0, 0, 0, 255)));
        // Nothing wrapped onto the row below the glyph's row or the row above.
        assert_eq!(canvas.pixel(0, 1), Some(Rgba::default()));
        assert_eq!(canvas.pixel(0, 0), Some(Rgba::default()));
    }

    #[test]
    fn test_draw_outside_canvas_only_advances() {
        let glyph = HeadlessGlyph::block(5, 2, 1);
        let mut source = load(HeadlessFaceSpec::monochrome().with_glyph('A', glyph)).unwrap();
        assert!(source.render_glyph('A'));

        let mut canvas = PixelCanvas::new(2, 1);
        assert_eq!(source.draw(&mut canvas, 7), 5);
        assert!(canvas.pixels().iter().all(|&b| b == 0));
    }
}
