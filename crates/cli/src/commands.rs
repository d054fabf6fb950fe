//! CLI command definitions for chatlens.
//!
//! Provides the command-line interface for analyzing exported chat
//! transcripts and managing the configuration file.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Main CLI application.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Logging verbosity
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "CHATLENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze an exported chat transcript
    Analyze(AnalyzeArgs),

    /// Write a configuration file with default values
    InitConfig(InitConfigArgs),
}

/// Transcript analysis arguments.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Transcript file (`MM/DD/YY, HH:MM - Sender: Message` lines)
    pub transcript: PathBuf,

    /// Stop-word file, one word per line (defaults to the bundled Spanish list)
    #[arg(long)]
    pub stopwords: Option<PathBuf>,

    /// Sentiment model directory
    #[arg(long, env = "CHATLENS_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Entries per ranked table
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Keep the first parsed record instead of treating it as a header
    #[arg(long, default_value_t = false)]
    pub keep_first_record: bool,

    /// Maximum concurrent classifier invocations
    #[arg(long)]
    pub workers: Option<usize>,

    /// Classifier deadline for the whole run, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Configuration file arguments.
#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Destination path
    #[arg(short, long, default_value = "chatlens.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable tables
    Text,
    /// Pretty printed JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
