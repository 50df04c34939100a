//! Font loading and glyph rasterization primitives.
//!
//! This module defines the `FontDriver` and `FontFace` traits, thin wrappers
//! around a rasterization library (FreeType in production, an in-memory
//! headless driver in tests). `GlyphSource` builds the format-specific
//! rendering and compositing on top of these primitives.

use anyhow::Result;
use bitflags::bitflags;
use std::path::Path;

/// Four-byte sfnt table tag, e.g. `*b"CBDT"`.
pub type Tag = [u8; 4];

/// Color bitmap data table. Its presence marks a color emoji font.
pub const CBDT: Tag = *b"CBDT";

bitflags! {
    /// Flags passed to `FontFace::load_glyph`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LoadFlags: u8 {
        /// Load embedded color bitmaps (BGRA) when available.
        const COLOR      = 1 << 0;
        /// Disable hinting of scalable outlines.
        const NO_HINTING = 1 << 1;
    }
}

/// One fixed bitmap size embedded in a font, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSize {
    pub width: i32,
    pub height: i32,
}

/// Pixel layout of a rasterized glyph bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelMode {
    /// 1 bit per pixel, most significant bit first.
    Mono,
    /// 1 byte of coverage per pixel.
    Gray,
    /// 4 bytes per pixel: blue, green, red, alpha.
    Bgra,
    /// Anything else the library can produce (LCD, 2/4-bit gray, ...).
    Other(u8),
}

impl PixelMode {
    /// Bytes needed to hold `width` pixels of one row.
    pub fn row_bytes(self, width: u32) -> usize {
        match self {
            PixelMode::Mono => (width as usize).div_ceil(8),
            PixelMode::Gray => width as usize,
            PixelMode::Bgra => width as usize * 4,
            PixelMode::Other(_) => 0,
        }
    }
}

/// Borrowed view of the bitmap in a face's glyph slot.
#[derive(Debug, Clone, Copy)]
pub struct BitmapView<'a> {
    pub rows: u32,
    pub width: u32,
    /// Byte offset between rows. Negative means rows are stored bottom-up.
    pub pitch: i32,
    pub mode: PixelMode,
    pub buffer: &'a [u8],
}

impl<'a> BitmapView<'a> {
    pub const EMPTY: BitmapView<'static> = BitmapView {
        rows: 0,
        width: 0,
        pitch: 0,
        mode: PixelMode::Gray,
        buffer: &[],
    };

    /// Bytes of row `y`, counting from the top of the glyph.
    pub fn row(&self, y: u32) -> Option<&'a [u8]> {
        if y >= self.rows {
            return None;
        }
        let stride = self.pitch.unsigned_abs() as usize;
        let stored = if self.pitch < 0 { self.rows - 1 - y } else { y };
        let start = stored as usize * stride;
        let len = self.mode.row_bytes(self.width);
        self.buffer.get(start..start + len)
    }
}

/// The glyph most recently loaded (and possibly rendered) into a face.
#[derive(Debug, Clone, Copy)]
pub struct GlyphSlot<'a> {
    /// Horizontal advance in 26.6 fixed point.
    pub advance_x: i64,
    /// Glyph metrics height in 26.6 fixed point.
    pub height: i64,
    pub bitmap: BitmapView<'a>,
}

/// Rasterization library handle.
///
/// One driver is created per process and passed by reference to every
/// `load_face` call; faces keep whatever library state they need.
pub trait FontDriver {
    type Face: FontFace;

    /// Open the face at index 0 of the font file at `path`.
    fn load_face(&self, path: &Path) -> Result<Self::Face>;
}

/// A single opened font face with a one-glyph render slot.
///
/// `load_glyph`/`render_glyph` overwrite the slot; `glyph` reads it.
pub trait FontFace {
    /// Glyph index for `ch`, or `None` if the face has no mapping for it.
    fn char_index(&self, ch: char) -> Option<u32>;

    /// Length in bytes of the sfnt table `tag`, 0 if absent.
    ///
    /// Takes `&mut self` since the lookup may seek the face's stream.
    fn sfnt_table_len(&mut self, tag: Tag) -> usize;

    /// Embedded fixed bitmap sizes, in the face's order.
    fn fixed_sizes(&self) -> Vec<FixedSize>;

    fn select_fixed_size(&mut self, index: usize) -> Result<()>;

    /// Request scalable rendering at `pixel_size` pixels.
    fn set_pixel_size(&mut self, pixel_size: u32) -> Result<()>;

    fn load_glyph(&mut self, glyph_index: u32, flags: LoadFlags) -> Result<()>;

    /// Rasterize the loaded glyph in normal (anti-aliased) mode.
    fn render_glyph(&mut self) -> Result<()>;

    fn glyph(&self) -> GlyphSlot<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_bytes() {
        assert_eq!(PixelMode::Mono.row_bytes(9), 2);
        assert_eq!(PixelMode::Gray.row_bytes(9), 9);
        assert_eq!(PixelMode::Bgra.row_bytes(9), 36);
    }

    #[test]
    fn test_row_with_padding() {
        // 2x2 gray bitmap, rows padded to 4 bytes.
        let buffer = [1, 2, 0, 0, 3, 4, 0, 0];
        let bitmap = BitmapView {
            rows: 2,
            width: 2,
            pitch: 4,
            mode: PixelMode::Gray,
            buffer: &buffer,
        };
        assert_eq!(bitmap.row(0), Some(&[1, 2][..]));
        assert_eq!(bitmap.row(1), Some(&[3, 4][..]));
        assert_eq!(bitmap.row(2), None);
    }

    #[test]
    fn test_row_negative_pitch_is_bottom_up() {
        let buffer = [30, 40, 10, 20];
        let bitmap = BitmapView {
            rows: 2,
            width: 2,
            pitch: -2,
            mode: PixelMode::Gray,
            buffer: &buffer,
        };
        assert_eq!(bitmap.row(0), Some(&[10, 20][..]));
        assert_eq!(bitmap.row(1), Some(&[30, 40][..]));
    }

    #[test]
    fn test_row_truncated_buffer() {
        let buffer = [1, 2, 3];
        let bitmap = BitmapView {
            rows: 2,
            width: 2,
            pitch: 2,
            mode: PixelMode::Gray,
            buffer: &buffer,
        };
        assert!(bitmap.row(1).is_none());
    }
}
