//! Sidecar - mirrors a primary editor's state into a hosted headless editor.

#![allow(dead_code)]

mod cli;
mod config;
mod core;
mod flags;
mod host;
mod logger;
mod server;
mod state;
mod store;
mod sync;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{SidecarConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let _config = init_config(SidecarConfig::load(cli)?);

    match &cli.command {
        Commands::Serve { .. } => cli::serve::run(),
        Commands::Send { request } => cli::send::run(request),
    }
}
