use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "typegraph")]
#[command(
    author,
    version,
    about = "Synthesize GraphQL type graphs from data models and compile selections into query filters"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (searches upward for .typegraph.yml by default)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write JSON logs to this file (rotated daily)
    #[arg(long, global = true, env = "TYPEGRAPH_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default .typegraph.yml in the current directory
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Synthesize a model file and print the GraphQL SDL
    Schema {
        /// YAML file with a top-level `models` list
        models: PathBuf,
    },

    /// Compile the filter and sort of every root field in a query
    #[command(visible_alias = "c")]
    Compile {
        /// GraphQL query (or a path to one with --file, '-' for stdin)
        query: String,

        /// Treat QUERY as a file path
        #[arg(short, long)]
        file: bool,

        /// Variables as a JSON object
        #[arg(long)]
        variables: Option<String>,

        /// Operation to compile when the document has several
        #[arg(short, long)]
        operation: Option<String>,
    },
}
