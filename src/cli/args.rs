//! Command line argument parsing for Unisearch CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::backend::types::SearchMode;

/// Unisearch - lexical, vector and hybrid search over two backends
#[derive(Parser, Debug, Clone)]
#[command(name = "unisearch")]
#[command(about = "Lexical, vector and hybrid search over two backends")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct UnisearchArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "UNISEARCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl UnisearchArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a search request
    Search(SearchArgs),

    /// Print the effective configuration
    Config,
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Full-text query
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    /// Term operator for the full-text query
    #[arg(short = 'm', long)]
    pub mode: Option<ModeArg>,

    /// Query embedding as comma-separated numbers
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    pub embedding: Option<Vec<f32>>,

    /// File holding the query embedding as a JSON array
    #[arg(long, value_name = "FILE", conflicts_with = "embedding")]
    pub embedding_file: Option<PathBuf>,

    /// JSON request file; flags given alongside override its values
    #[arg(short, long, value_name = "FILE")]
    pub request: Option<PathBuf>,

    /// Page number (1-based)
    #[arg(short, long)]
    pub page: Option<i64>,

    /// Results per page
    #[arg(short = 's', long)]
    pub page_size: Option<i64>,

    /// Only return files with this extension (e.g. pdf)
    #[arg(short = 't', long, value_name = "EXT")]
    pub file_type: Option<String>,

    /// Lexical weight override
    #[arg(long, requires = "vector_weight")]
    pub lexical_weight: Option<f32>,

    /// Vector weight override
    #[arg(long, requires = "lexical_weight")]
    pub vector_weight: Option<f32>,

    #[command(flatten)]
    pub backends: BackendArgs,
}

/// Where the backends live
#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    /// JSON Lines corpus for an in-memory lexical backend
    #[arg(long, value_name = "FILE")]
    pub lexical_corpus: Option<PathBuf>,

    /// JSON Lines corpus for an in-memory vector backend
    #[arg(long, value_name = "FILE")]
    pub vector_corpus: Option<PathBuf>,
}

impl BackendArgs {
    /// Whether in-memory backends were requested.
    pub fn uses_memory(&self) -> bool {
        self.lexical_corpus.is_some() || self.vector_corpus.is_some()
    }
}

/// Term operator as accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeArg {
    /// Every term must match
    And,
    /// Any term may match
    Or,
}

impl From<ModeArg> for SearchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::And => SearchMode::And,
            ModeArg::Or => SearchMode::Or,
        }
    }
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table
    Human,
    /// JSON
    Json,
}
