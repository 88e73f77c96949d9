use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod output;

use cli::{Cli, Commands};
use config::Config;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ensemble=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format.into();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let store = config::open_store(&config, &cli.data)?;

    match &cli.command {
        Commands::List(args) => commands::query::list(&store, args, format),
        Commands::Get(args) => commands::query::get(&store, args, format),
        Commands::Keys(args) => commands::query::keys(&store, args, format),
        Commands::Which(args) => commands::query::which(&store, args, format),
        Commands::Paths(args) => commands::query::paths(&store, args, format),
    }
}
