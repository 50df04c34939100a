// src/error.rs

//! Fatal error classes that terminate a run.
//!
//! Everything recoverable (a font that will not open, a glyph that will not
//! render, a codepoint no font covers) is absorbed further down and logged.
//! What reaches `main` is one of these, each with its own exit status.

use std::fmt;
use std::path::PathBuf;

/// Exit status for failures that are not classified below (FreeType init, I/O).
pub const EXIT_FAILURE: i32 = 1;
/// Exit status clap uses for usage errors.
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_INVALID_TEXT: i32 = 3;
pub const EXIT_UNUSABLE_FONT: i32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlyphStripError {
    /// The text argument is not valid UTF-8. `offset` is the byte index of
    /// the first invalid sequence.
    InvalidText { offset: usize },
    /// A token in `--hex` mode is not a Unicode scalar value.
    InvalidCodepoint(String),
    /// The font carries a color bitmap table but no fixed bitmap sizes.
    NoFixedSizes(PathBuf),
}

impl GlyphStripError {
    pub fn exit_code(&self) -> i32 {
        match self {
            GlyphStripError::InvalidText { .. } | GlyphStripError::InvalidCodepoint(_) => {
                EXIT_INVALID_TEXT
            }
            GlyphStripError::NoFixedSizes(_) => EXIT_UNUSABLE_FONT,
        }
    }
}

impl fmt::Display for GlyphStripError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlyphStripError::InvalidText { offset } => {
                write!(f, "invalid input text: bad UTF-8 at byte {}", offset)
            }
            GlyphStripError::InvalidCodepoint(token) => {
                write!(f, "invalid codepoint: '{}'", token)
            }
            GlyphStripError::NoFixedSizes(path) => write!(
                f,
                "color font '{}' has no embedded bitmap sizes",
                path.display()
            ),
        }
    }
}

impl std::error::Error for GlyphStripError {}

/// Pick the process exit status for an error that escaped `run`.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<GlyphStripError>())
        .map(GlyphStripError::exit_code)
        .unwrap_or(EXIT_FAILURE)
}
