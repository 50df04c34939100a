// src/lib.rs

//! `glyphstrip` renders a line of text into a single-row pixel strip.
//!
//! Each codepoint is drawn with the first font in a priority list that
//! covers it. Scalable outline fonts are rasterized at a target pixel size;
//! color bitmap fonts (CBDT) use their closest embedded strike. The strip is
//! as wide as the summed advances and as tall as the tallest glyph, with
//! every glyph bottom-aligned, and is written as a binary PPM.

pub mod app;
pub mod canvas;
pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod rasterizer;
pub mod text;
