// src/cli.rs

//! Command-line arguments.

use clap::Parser;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// Render text into a PPM strip, trying each font in order for every codepoint.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Output PPM file. Defaults to the configured output path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target pixel size. Defaults to the configured pixel size.
    #[arg(short = 's', long)]
    pub pixel_size: Option<u32>,

    /// Treat TEXT as hex codepoints, e.g. "1F600 U+263A".
    #[arg(short = 'x', long)]
    pub hex: bool,

    /// Font files in priority order, then the text to render as the last value.
    #[arg(value_names = ["FONT", "TEXT"], required = true, num_args = 2..)]
    pub inputs: Vec<OsString>,
}

impl Args {
    /// Every positional value but the last.
    pub fn fonts(&self) -> Vec<PathBuf> {
        let count = self.inputs.len().saturating_sub(1);
        self.inputs[..count].iter().map(PathBuf::from).collect()
    }

    /// The last positional value.
    pub fn text(&self) -> &OsStr {
        self.inputs.last().map(OsString::as_os_str).unwrap_or_default()
    }
}
