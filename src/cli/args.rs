//! Command-line argument parsing for chathrd
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// chathrd - question answering over an internal knowledge base
#[derive(Parser, Debug)]
#[command(name = "chathrd")]
#[command(version)]
#[command(about = "Routed retrieval-augmented answers over a knowledge base", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the generation model
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Answer one question and exit
    Ask {
        /// The question
        #[arg(value_name = "QUERY")]
        query: String,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the routed branch and sub-queries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive session
    Chat,

    /// Check the generation backend, vector store and lexical index
    Doctor,

    /// Build the lexical index from every document in the vector store
    BuildLexical {
        /// Output path (defaults to index.lexical_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Default tracing filter when `RUST_LOG` is unset
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "chathrd=debug,info",
            Verbosity::VeryVerbose => "debug",
        }
    }

    /// Check if should show progress spinners
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should print the telemetry summary
    pub fn show_stats(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}
