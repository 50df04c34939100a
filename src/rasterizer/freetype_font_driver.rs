//! FreeType font driver.
//!
//! Uses the safe `freetype-rs` wrapper where it covers what we need and drops
//! to `freetype::ffi` for the few calls it does not expose (fixed-size
//! selection, char index without wrapper conversions). `FT_Load_Sfnt_Table`
//! is missing from `freetype-sys`, so it is declared here against the
//! libfreetype that crate already links.

use super::font_driver::{
    BitmapView, FixedSize, FontDriver, FontFace, GlyphSlot, LoadFlags, PixelMode, Tag,
};
use anyhow::{bail, Context, Result};
use freetype::face::LoadFlag;
use freetype::{ffi, Face, Library, RenderMode};
use log::trace;
use std::path::Path;

/// Owns the process-wide FreeType library handle.
pub struct FreeTypeFontDriver {
    library: Library,
}

impl FreeTypeFontDriver {
    pub fn new() -> Result<Self> {
        let library = Library::init().context("Failed to initialize FreeType")?;
        Ok(Self { library })
    }
}

impl FontDriver for FreeTypeFontDriver {
    type Face = FreeTypeFace;

    fn load_face(&self, path: &Path) -> Result<Self::Face> {
        let face = self
            .library
            .new_face(path, 0)
            .with_context(|| format!("Failed to open font '{}'", path.display()))?;
        trace!(
            "FreeType: opened '{}' ({} glyphs, {} fixed sizes)",
            path.display(),
            face.raw().num_glyphs,
            face.raw().num_fixed_sizes
        );
        Ok(FreeTypeFace { face })
    }
}

pub struct FreeTypeFace {
    face: Face,
}

impl FreeTypeFace {
    /// For lookups that FreeType declares on a mutable handle but that
    /// leave the face untouched.
    fn raw_ptr(&self) -> ffi::FT_Face {
        self.face.raw() as *const ffi::FT_FaceRec as ffi::FT_Face
    }
}

extern "C" {
    fn FT_Load_Sfnt_Table(
        face: ffi::FT_Face,
        tag: ffi::FT_ULong,
        offset: ffi::FT_Long,
        buffer: *mut ffi::FT_Byte,
        length: *mut ffi::FT_ULong,
    ) -> ffi::FT_Error;
}

// FT_Pixel_Mode values from ftimage.h.
const FT_PIXEL_MODE_MONO: u8 = 1;
const FT_PIXEL_MODE_GRAY: u8 = 2;
const FT_PIXEL_MODE_BGRA: u8 = 7;

fn pixel_mode(raw: u8) -> PixelMode {
    match raw {
        FT_PIXEL_MODE_MONO => PixelMode::Mono,
        FT_PIXEL_MODE_GRAY => PixelMode::Gray,
        FT_PIXEL_MODE_BGRA => PixelMode::Bgra,
        other => PixelMode::Other(other),
    }
}

impl FontFace for FreeTypeFace {
    fn char_index(&self, ch: char) -> Option<u32> {
        // SAFETY: FFI call on the face this value owns. FT_Get_Char_Index
        // only reads the active charmap.
        let index = unsafe { ffi::FT_Get_Char_Index(self.raw_ptr(), ch as ffi::FT_ULong) };
        (index != 0).then_some(index as u32)
    }

    fn sfnt_table_len(&mut self, tag: Tag) -> usize {
        let face: *mut ffi::FT_FaceRec = self.face.raw_mut();
        let mut length: ffi::FT_ULong = 0;
        // A null buffer asks FreeType for the table length only.
        // SAFETY: FFI call. `face` is exclusively borrowed for the call and
        // `length` outlives it.
        let error = unsafe {
            FT_Load_Sfnt_Table(
                face,
                u32::from_be_bytes(tag) as ffi::FT_ULong,
                0,
                std::ptr::null_mut(),
                &mut length,
            )
        };
        if error != 0 {
            0
        } else {
            length as usize
        }
    }

    fn fixed_sizes(&self) -> Vec<FixedSize> {
        let raw = self.face.raw();
        if raw.available_sizes.is_null() || raw.num_fixed_sizes <= 0 {
            return Vec::new();
        }
        // SAFETY: FreeType keeps `num_fixed_sizes` entries at
        // `available_sizes` for the lifetime of the face.
        let sizes =
            unsafe { std::slice::from_raw_parts(raw.available_sizes, raw.num_fixed_sizes as usize) };
        sizes
            .iter()
            .map(|size| FixedSize {
                width: i32::from(size.width),
                height: i32::from(size.height),
            })
            .collect()
    }

    fn select_fixed_size(&mut self, index: usize) -> Result<()> {
        let face: *mut ffi::FT_FaceRec = self.face.raw_mut();
        // SAFETY: FFI call on the exclusively borrowed face. FreeType
        // rejects an out-of-range index with an error.
        let error = unsafe { ffi::FT_Select_Size(face, index as ffi::FT_Int) };
        if error != 0 {
            bail!("FT_Select_Size({}) failed with error {}", index, error);
        }
        Ok(())
    }

    fn set_pixel_size(&mut self, pixel_size: u32) -> Result<()> {
        self.face
            .set_pixel_sizes(0, pixel_size)
            .with_context(|| format!("Failed to set pixel size {}", pixel_size))
    }

    fn load_glyph(&mut self, glyph_index: u32, flags: LoadFlags) -> Result<()> {
        let mut ft_flags = LoadFlag::DEFAULT;
        if flags.contains(LoadFlags::COLOR) {
            ft_flags |= LoadFlag::COLOR;
        }
        if flags.contains(LoadFlags::NO_HINTING) {
            ft_flags |= LoadFlag::NO_HINTING;
        }
        self.face
            .load_glyph(glyph_index, ft_flags)
            .with_context(|| format!("Failed to load glyph {}", glyph_index))
    }

    fn render_glyph(&mut self) -> Result<()> {
        self.face
            .glyph()
            .render_glyph(RenderMode::Normal)
            .context("Failed to render glyph")
    }

    fn glyph(&self) -> GlyphSlot<'_> {
        let slot = self.face.glyph().raw();
        let bitmap = &slot.bitmap;
        let rows = bitmap.rows as u32;
        let pitch = bitmap.pitch as i32;
        let len = rows as usize * pitch.unsigned_abs() as usize;
        let buffer: &[u8] = if bitmap.buffer.is_null() || len == 0 {
            &[]
        } else {
            // SAFETY: the slot bitmap holds `rows` rows of `|pitch|` bytes
            // until the next load or render, which needs `&mut self`.
            unsafe { std::slice::from_raw_parts(bitmap.buffer as *const u8, len) }
        };
        GlyphSlot {
            advance_x: slot.advance.x as i64,
            height: slot.metrics.height as i64,
            bitmap: BitmapView {
                rows,
                width: bitmap.width as u32,
                pitch,
                mode: pixel_mode(bitmap.pixel_mode as u8),
                buffer,
            },
        }
    }
}
