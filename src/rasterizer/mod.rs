//! Font loading, glyph rendering and font fallback.
//!
//! ```text
//! FontDriver ──load_face──▶ FontFace ──▶ GlyphSource ──▶ FontFallbackChain
//!  (library)                 (one font)   (format +        (priority order)
//!                                          compositing)
//! ```
//!
//! `FreeTypeFontDriver` is the production driver. `HeadlessFontDriver`
//! serves synthetic faces from memory.

// Font support modules
pub mod fallback_chain;
pub mod font_driver;
pub mod freetype_font_driver;
pub mod glyph_source;
pub mod headless_font_driver;

pub use fallback_chain::{FontFallbackChain, ResolvedGlyph};
pub use font_driver::{FontDriver, FontFace, LoadFlags, PixelMode};
pub use freetype_font_driver::FreeTypeFontDriver;
pub use glyph_source::{GlyphSource, PixelFormat, Size, SourceOptions};
pub use headless_font_driver::HeadlessFontDriver;
