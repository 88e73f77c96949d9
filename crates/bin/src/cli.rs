//! CLI argument definitions for the Ensemble binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

/// Output format flag
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    /// Aligned text for terminals
    Human,
    /// One JSON document per command
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Human => OutputFormat::Human,
            Format::Json => OutputFormat::Json,
        }
    }
}

/// Inspect a set of elements with their defaults applied
#[derive(Parser, Debug)]
#[command(name = "ensemble")]
#[command(about = "Ensemble: query homogeneous value sets with layered defaults")]
#[command(version)]
pub struct Cli {
    /// Data file holding the raw elements
    #[arg(short = 'D', long, env = "ENSEMBLE_DATA")]
    pub data: PathBuf,

    /// Config file with the store options, schema and default rules
    #[arg(short, long, env = "ENSEMBLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: Format,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List element keys
    List(ListArgs),
    /// Print the value at a path of one element
    Get(GetArgs),
    /// List the keys (or indices) of a container in one element
    Keys(KeysArgs),
    /// List the elements matching every condition
    Which(WhichArgs),
    /// Print the value at a path for every element
    Paths(PathsArgs),
}

/// Arguments for the list command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Include elements with no data
    #[arg(long)]
    pub include_empty: bool,
}

/// Arguments for the get command
#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// Element name, or index in list stores
    pub element: String,

    /// Path inside the element
    #[arg(default_value = "/")]
    pub path: String,

    /// Read the authored value without defaults
    #[arg(long)]
    pub raw: bool,

    /// Also report where the value came from
    #[arg(long)]
    pub origin: bool,
}

/// Arguments for the keys command
#[derive(clap::Args, Debug)]
pub struct KeysArgs {
    /// Element name, or index in list stores
    pub element: String,

    /// Path of the container inside the element
    #[arg(default_value = "/")]
    pub path: String,

    /// Include children with no data
    #[arg(long)]
    pub include_empty: bool,

    /// Read the authored value without defaults
    #[arg(long)]
    pub raw: bool,
}

/// Arguments for the which command
#[derive(clap::Args, Debug)]
pub struct WhichArgs {
    /// Conditions such as `/port`, `!/host`, `/mode=fast` or `/retries>=3`
    #[arg(required = true)]
    pub conditions: Vec<String>,
}

/// Arguments for the paths command
#[derive(clap::Args, Debug)]
pub struct PathsArgs {
    /// Path to read in every element
    pub path: String,

    /// Include elements where the value is empty
    #[arg(long)]
    pub include_empty: bool,
}
