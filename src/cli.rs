//! Command-line interface for catchword
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Recover a known phrase from a noisy recording
#[derive(Parser, Debug)]
#[command(
    name = "catchword",
    version,
    about = "Recover a known phrase from a noisy recording"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: progress, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline on one recording and print the report
    Process {
        /// Recording to process (WAV)
        file: PathBuf,

        /// Keyword vocabulary, comma-separated (overrides configuration)
        #[arg(long, value_name = "W1,W2,...", value_delimiter = ',', value_parser = parse_keyword)]
        vocab: Option<Vec<String>>,

        /// Minimum similarity score for a match, 0-100
        #[arg(long, value_name = "N")]
        threshold: Option<u8>,

        /// Language hint for transcription (e.g. he-IL, en-US)
        #[arg(long, value_name = "LANG")]
        language: Option<String>,

        /// Pack the run directory into a tar.gz after the run
        #[arg(long)]
        archive: bool,
    },

    /// Start the HTTP surface
    Serve {
        /// Address to bind
        #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:8080")]
        bind: String,
    },

    /// Check that the configured filter engine resolves
    Check,
}

/// Parse one vocabulary word (clap splits the list on commas first).
fn parse_keyword(s: &str) -> Result<String, String> {
    let word = s.trim();
    if word.is_empty() {
        return Err("vocabulary entries must not be empty".to_string());
    }
    Ok(word.to_string())
}
