use anyhow::Result;
use clap::Parser;

use typegraph::cli::handlers::{self, CommandContext};
use typegraph::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    typegraph::logging::init(cli.verbose, cli.log_file.clone());

    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { force } => handlers::handle_init(&cwd, force),
        Commands::Schema { models } => {
            let ctx = CommandContext::load(cli.config.as_deref(), &cwd)?;
            handlers::handle_schema(&ctx, &models)
        }
        Commands::Compile {
            query,
            file,
            variables,
            operation,
        } => handlers::handle_compile(query, file, variables, operation),
    }
}
