//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

/// Guided wellbeing session in your terminal
#[derive(Debug, Parser)]
#[command(name = "shanti", version, about)]
pub struct Cli {
    /// Path to a config file (default: .shanti.yml, then ~/.config/shanti/shanti.yml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
