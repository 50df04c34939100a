// src/canvas.rs

//! The output strip: a fixed-size RGBA pixel buffer with a horizontal write
//! cursor, and its serialization to binary PPM.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// RGBA byte layout, one byte per channel.
pub const BYTES_PER_PIXEL: usize = 4;

/// RGBA color in 32-bit format (8 bits per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert to RGBA byte array
    pub fn to_bytes(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Width × height RGBA buffer, zero-initialized (transparent black).
///
/// Dimensions are fixed at construction. All writes go through
/// [`PixelCanvas::span_mut`], which never hands out bytes past the end of the
/// requested row, so a glyph that overhangs the right edge is clipped rather
/// than wrapped onto the next row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    cursor: u32,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * BYTES_PER_PIXEL;
        Self {
            width,
            height,
            pixels: vec![0; len],
            cursor: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major, top row first.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Current column of the write cursor.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Move the write cursor right by `dx` columns.
    pub fn advance(&mut self, dx: u32) {
        self.cursor = self.cursor.saturating_add(dx);
    }

    /// The bytes of row `y` from column `x` to the end of that row.
    ///
    /// Returns `None` when `(x, y)` is outside the canvas.
    pub fn span_mut(&mut self, x: u32, y: u32) -> Option<&mut [u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let row_start = y as usize * self.width as usize * BYTES_PER_PIXEL;
        let row_end = row_start + self.width as usize * BYTES_PER_PIXEL;
        let start = row_start + x as usize * BYTES_PER_PIXEL;
        self.pixels.get_mut(start..row_end)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let p = self.pixels.get(index..index + BYTES_PER_PIXEL)?;
        Some(Rgba::new(p[0], p[1], p[2], p[3]))
    }

    /// Serialize as binary PPM (`P6`). Alpha is dropped.
    pub fn write_ppm<W: Write>(&self, mut out: W) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        for pixel in self.pixels.chunks_exact(BYTES_PER_PIXEL) {
            out.write_all(&pixel[..3])?;
        }
        out.flush()
    }

    /// Write the canvas to `path` as PPM, consuming it.
    pub fn save_ppm(self, path: &Path) -> io::Result<()> {
        let file = File::create(path)?;
        self.write_ppm(BufWriter::new(file))
    }
}
