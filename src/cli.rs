//! Command-line interface definitions for Medical Digest.
//!
//! This module defines the CLI arguments and subcommands using the `clap` crate.
//! Secrets can be provided via command-line flags or environment variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the Medical Digest application.
///
/// Global options locate the configuration file and override storage and
/// output paths; the subcommand selects which part of the pipeline runs.
///
/// # Examples
///
/// ```sh
/// # Generate articles for the configured topics
/// medical_digest generate
///
/// # Generate for ad-hoc topics and post them to the website
/// medical_digest generate -t "statins" -t "vitamin d" --publish
///
/// # Quick evidence summary for one topic
/// medical_digest search "diabetes treatment"
///
/// # Rebuild the dashboard and weekly report
/// medical_digest dashboard
/// medical_digest report
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Output directory for JSON batches and reports (overrides config)
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// NCBI E-utilities API key
    #[arg(long, env = "NCBI_API_KEY", global = true)]
    pub ncbi_api_key: Option<String>,

    /// Base URL of the website that receives posts
    #[arg(long, env = "WEBSITE_URL", global = true)]
    pub website_url: Option<String>,

    /// Bearer token for the website API
    #[arg(long, env = "WEBSITE_API_KEY", global = true, hide_env_values = true)]
    pub website_api_key: Option<String>,

    /// Pipeline step to run; `generate` when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The selected subcommand, falling back to `generate` with its default
    /// arguments when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or_default()
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Search, synthesize, store and optionally publish articles
    Generate {
        /// Topic to process instead of the configured list (repeatable)
        #[arg(short, long = "topic")]
        topics: Vec<String>,

        /// Post generated articles to the website
        #[arg(long)]
        publish: bool,

        /// Skip re-rendering the dashboard after saving
        #[arg(long)]
        no_dashboard: bool,
    },
    /// Print an evidence summary for a single topic
    Search {
        /// Topic to search for
        topic: String,
    },
    /// Render the HTML dashboard from the database
    Dashboard {
        /// Output HTML file (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write the weekly analytics report
    Report,
}

impl Default for Command {
    fn default() -> Self {
        Command::Generate {
            topics: Vec::new(),
            publish: false,
            no_dashboard: false,
        }
    }
}
