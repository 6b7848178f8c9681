//! Command-line interface for signscribe
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

/// `--version` output, with the git hash when the build had one.
static VERSION: LazyLock<String> = LazyLock::new(crate::version_string);

/// Sign-language gloss recognition toolkit
#[derive(Parser, Debug)]
#[command(
    name = "signscribe",
    version = VERSION.as_str(),
    about = "Sign-language gloss recognition toolkit"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a duration string.
///
/// Bare numbers are milliseconds; anything else goes through `humantime`
/// (`500ms`, `2s`, `1s500ms`).
fn parse_pace(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the effective configuration
    Config {
        /// Print the default config file path instead
        #[arg(long)]
        path: bool,
    },

    /// Correct a JSON-lines file of landmark detections, one frame per line
    Correct {
        /// Input file; each line is a landmark set with optional
        /// `left_hand`, `right_hand` and `pose` point lists
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Reference landmarks used before anything is detected
        #[arg(long, value_name = "FILE")]
        reference: Option<PathBuf>,
    },

    /// Feed a gloss sequence through the gloss window and text generator
    Simulate {
        /// Space-separated glosses, e.g. "HELLO HOW YOU/YOUR FEEL"
        #[arg(value_name = "GLOSSES")]
        glosses: String,

        /// Delay between glosses (e.g. 500ms, 1s, 250)
        #[arg(long, value_name = "DURATION", default_value = "500ms", value_parser = parse_pace)]
        pace: Duration,

        /// Use the offline echo generator instead of the configured endpoint
        #[arg(long)]
        echo: bool,
    },
}

impl Cli {
    /// Log level filter derived from `-q` / `-v`.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
