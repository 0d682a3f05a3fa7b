//! Command-line argument definitions for the copybook CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, rules file
//! selection, report formatting and logging verbosity.

use clap::Parser;

/// Command-line arguments for the copybook layout compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input copybook
    #[arg(help = "Path to the input copybook")]
    pub input: String,

    /// Path to the output JSON report
    #[arg(short, long, default_value = "out.json")]
    pub output: String,

    /// Path to the rules file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Write the report without indentation
    #[arg(long)]
    pub compact: bool,
}
