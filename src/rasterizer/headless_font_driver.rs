//! Headless in-memory font driver.
//!
//! Serves synthetic faces registered under a path, so the fallback and
//! compositing logic can run without font files or FreeType.

use super::font_driver::{
    BitmapView, FixedSize, FontDriver, FontFace, GlyphSlot, LoadFlags, PixelMode, Tag, CBDT,
};
use anyhow::{anyhow, bail, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// One synthetic glyph: metrics in 26.6 fixed point and a pre-built bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessGlyph {
    pub advance_x: i64,
    pub height: i64,
    pub rows: u32,
    pub width: u32,
    pub pitch: i32,
    pub mode: PixelMode,
    pub buffer: Vec<u8>,
}

impl HeadlessGlyph {
    /// Grayscale glyph from coverage rows (top row first). Advance and
    /// height are whole pixels.
    pub fn gray(advance_px: u32, coverage: &[&[u8]]) -> Self {
        let rows = coverage.len() as u32;
        let width = coverage.first().map_or(0, |row| row.len()) as u32;
        Self {
            advance_x: i64::from(advance_px) << 6,
            height: i64::from(rows) << 6,
            rows,
            width,
            pitch: width as i32,
            mode: PixelMode::Gray,
            buffer: coverage.concat(),
        }
    }

    /// BGRA glyph from rows of `[b, g, r, a]` pixels (top row first).
    pub fn bgra(advance_px: u32, pixels: &[&[[u8; 4]]]) -> Self {
        let rows = pixels.len() as u32;
        let width = pixels.first().map_or(0, |row| row.len()) as u32;
        Self {
            advance_x: i64::from(advance_px) << 6,
            height: i64::from(rows) << 6,
            rows,
            width,
            pitch: width as i32 * 4,
            mode: PixelMode::Bgra,
            buffer: pixels.iter().flat_map(|row| row.iter().flatten()).copied().collect(),
        }
    }

    /// Solid grayscale block of `width` × `rows` at full coverage.
    pub fn block(advance_px: u32, width: u32, rows: u32) -> Self {
        let row = vec![255u8; width as usize];
        let coverage: Vec<&[u8]> = (0..rows).map(|_| row.as_slice()).collect();
        Self::gray(advance_px, &coverage)
    }

    /// Override the 26.6 metrics, e.g. to test fractional truncation.
    pub fn with_metrics(mut self, advance_x: i64, height: i64) -> Self {
        self.advance_x = advance_x;
        self.height = height;
        self
    }
}

/// Description of a synthetic face.
#[derive(Debug, Clone, Default)]
pub struct HeadlessFaceSpec {
    pub glyphs: HashMap<char, HeadlessGlyph>,
    pub tables: HashMap<Tag, usize>,
    pub fixed_sizes: Vec<FixedSize>,
    /// Characters that map to a glyph index but fail to render.
    pub broken: HashSet<char>,
    /// Fail `set_pixel_size`.
    pub reject_pixel_size: bool,
}

impl HeadlessFaceSpec {
    pub fn monochrome() -> Self {
        Self::default()
    }

    /// A face with a `CBDT` table and the given fixed size widths.
    pub fn color(fixed_widths: &[i32]) -> Self {
        let mut spec = Self::default();
        spec.tables.insert(CBDT, 1024);
        spec.fixed_sizes = fixed_widths
            .iter()
            .map(|&width| FixedSize {
                width,
                height: width,
            })
            .collect();
        spec
    }

    pub fn with_glyph(mut self, ch: char, glyph: HeadlessGlyph) -> Self {
        self.glyphs.insert(ch, glyph);
        self
    }

    pub fn with_broken_glyph(mut self, ch: char, glyph: HeadlessGlyph) -> Self {
        self.glyphs.insert(ch, glyph);
        self.broken.insert(ch);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessFontDriver {
    faces: HashMap<PathBuf, HeadlessFaceSpec>,
}

impl HeadlessFontDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_face(mut self, path: impl Into<PathBuf>, spec: HeadlessFaceSpec) -> Self {
        self.faces.insert(path.into(), spec);
        self
    }
}

impl FontDriver for HeadlessFontDriver {
    type Face = HeadlessFace;

    fn load_face(&self, path: &Path) -> Result<Self::Face> {
        let spec = self
            .faces
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("HeadlessFontDriver: no face at '{}'", path.display()))?;
        let mut chars: Vec<char> = spec.glyphs.keys().copied().collect();
        chars.sort_unstable();
        Ok(HeadlessFace {
            spec,
            chars,
            loaded: None,
            rendered: false,
            pixel_size: None,
            selected_size: None,
            last_flags: None,
        })
    }
}

/// A synthetic face. Glyph indices are 1-based positions in sorted char order.
#[derive(Debug, Clone)]
pub struct HeadlessFace {
    spec: HeadlessFaceSpec,
    chars: Vec<char>,
    loaded: Option<char>,
    rendered: bool,
    pixel_size: Option<u32>,
    selected_size: Option<usize>,
    last_flags: Option<LoadFlags>,
}

impl HeadlessFace {
    pub fn pixel_size(&self) -> Option<u32> {
        self.pixel_size
    }

    pub fn selected_size(&self) -> Option<usize> {
        self.selected_size
    }

    pub fn last_flags(&self) -> Option<LoadFlags> {
        self.last_flags
    }

    fn current(&self) -> Option<&HeadlessGlyph> {
        self.loaded.and_then(|ch| self.spec.glyphs.get(&ch))
    }
}

impl FontFace for HeadlessFace {
    fn char_index(&self, ch: char) -> Option<u32> {
        self.chars
            .binary_search(&ch)
            .ok()
            .map(|pos| pos as u32 + 1)
    }

    fn sfnt_table_len(&mut self, tag: Tag) -> usize {
        self.spec.tables.get(&tag).copied().unwrap_or(0)
    }

    fn fixed_sizes(&self) -> Vec<FixedSize> {
        self.spec.fixed_sizes.clone()
    }

    fn select_fixed_size(&mut self, index: usize) -> Result<()> {
        if index >= self.spec.fixed_sizes.len() {
            bail!("HeadlessFace: no fixed size {}", index);
        }
        self.selected_size = Some(index);
        Ok(())
    }

    fn set_pixel_size(&mut self, pixel_size: u32) -> Result<()> {
        if self.spec.reject_pixel_size {
            bail!("HeadlessFace: pixel size {} rejected", pixel_size);
        }
        self.pixel_size = Some(pixel_size);
        Ok(())
    }

    fn load_glyph(&mut self, glyph_index: u32, flags: LoadFlags) -> Result<()> {
        self.last_flags = Some(flags);
        self.rendered = false;
        let ch = glyph_index
            .checked_sub(1)
            .and_then(|pos| self.chars.get(pos as usize))
            .copied()
            .ok_or_else(|| anyhow!("HeadlessFace: invalid glyph index {}", glyph_index))?;
        let glyph = &self.spec.glyphs[&ch];
        if glyph.mode == PixelMode::Bgra && !flags.contains(LoadFlags::COLOR) {
            bail!("HeadlessFace: color glyph loaded without COLOR flag");
        }
        self.loaded = Some(ch);
        Ok(())
    }

    fn render_glyph(&mut self) -> Result<()> {
        let ch = self
            .loaded
            .ok_or_else(|| anyhow!("HeadlessFace: render without a loaded glyph"))?;
        if self.spec.broken.contains(&ch) {
            bail!("HeadlessFace: glyph for '{}' fails to render", ch);
        }
        self.rendered = true;
        Ok(())
    }

    fn glyph(&self) -> GlyphSlot<'_> {
        match self.current() {
            Some(glyph) => GlyphSlot {
                advance_x: glyph.advance_x,
                height: glyph.height,
                bitmap: if self.rendered {
                    BitmapView {
                        rows: glyph.rows,
                        width: glyph.width,
                        pitch: glyph.pitch,
                        mode: glyph.mode,
                        buffer: &glyph.buffer,
                    }
                } else {
                    BitmapView::EMPTY
                },
            },
            None => GlyphSlot {
                advance_x: 0,
                height: 0,
                bitmap: BitmapView::EMPTY,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_path_fails_to_load() {
        let driver = HeadlessFontDriver::new();
        assert!(driver.load_face(Path::new("missing.ttf")).is_err());
    }

    #[test]
    fn test_glyph_indices_are_nonzero() {
        let driver = HeadlessFontDriver::new().with_face(
            "a.ttf",
            HeadlessFaceSpec::monochrome()
                .with_glyph('B', HeadlessGlyph::block(4, 2, 2))
                .with_glyph('A', HeadlessGlyph::block(4, 2, 2)),
        );
        let face = driver.load_face(Path::new("a.ttf")).unwrap();
        assert_eq!(face.char_index('A'), Some(1));
        assert_eq!(face.char_index('B'), Some(2));
        assert_eq!(face.char_index('C'), None);
    }

    #[test]
    fn test_bitmap_only_visible_after_render() {
        let driver = HeadlessFontDriver::new().with_face(
            "a.ttf",
            HeadlessFaceSpec::monochrome().with_glyph('A', HeadlessGlyph::block(4, 2, 3)),
        );
        let mut face = driver.load_face(Path::new("a.ttf")).unwrap();
        let index = face.char_index('A').unwrap();
        face.load_glyph(index, LoadFlags::empty()).unwrap();
        assert_eq!(face.glyph().bitmap.rows, 0);
        face.render_glyph().unwrap();
        assert_eq!(face.glyph().bitmap.rows, 3);
        assert_eq!(face.glyph().advance_x, 4 << 6);
    }

    #[test]
    fn test_color_glyph_requires_color_flag() {
        let driver = HeadlessFontDriver::new().with_face(
            "emoji.ttf",
            HeadlessFaceSpec::color(&[64])
                .with_glyph('x', HeadlessGlyph::bgra(1, &[&[[0, 0, 0, 255]]])),
        );
        let mut face = driver.load_face(Path::new("emoji.ttf")).unwrap();
        let index = face.char_index('x').unwrap();
        assert!(face.load_glyph(index, LoadFlags::empty()).is_err());
        assert!(face.load_glyph(index, LoadFlags::COLOR).is_ok());
    }
}
