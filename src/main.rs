// In src/main.rs

use clap::Parser;
use glyphstrip::{app, cli::Args, config::CONFIG, error::exit_code_for};
use log::{error, info};

/// Main entry point for `glyphstrip`.
fn main() {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    // Usage errors exit here with clap's own code.
    let args = Args::parse();
    info!("Starting glyphstrip with {} font(s)", args.fonts().len());

    if let Err(e) = app::run(&args, &CONFIG) {
        error!("{:#}", e);
        std::process::exit(exit_code_for(&e));
    }
}
