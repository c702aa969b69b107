use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_DATA_PATH: &str = "data/code-tree.json";

#[derive(Parser)]
#[command(
    name = "codetree",
    about = "Hierarchical classification code store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Path of the code-tree JSON document
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Store caller-supplied depths without checking them against parents
    #[arg(long, global = true)]
    pub no_depth_check: bool,
}

impl Cli {
    pub fn data_path(&self) -> PathBuf {
        self.data
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
    }
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// List codes at a depth
    List(ListArgs),
    /// List the children of a code, or the roots
    Children(ChildrenArgs),
    /// Show a code and its direct children
    Show(ShowArgs),
    /// Upsert a batch of codes from a JSON file
    Import(ImportArgs),
    /// Delete a code and everything below it
    Delete(DeleteArgs),
    /// Check the stored forest for integrity problems
    Check(CheckArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<String>,
    /// TOML server configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(short, long, default_value = "1")]
    pub depth: u32,
}

#[derive(Args)]
pub struct ChildrenArgs {
    pub parent: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub code: String,
}

#[derive(Args)]
pub struct ImportArgs {
    /// `{ "codes": [...] }` or a bare array
    pub file: PathBuf,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub code: String,
}

#[derive(Args)]
pub struct CheckArgs {}
