//! Dayloop CLI entry point.

use clap::Parser;

use dayloop::cli::{commands, Cli, Commands};
use dayloop::infrastructure::config::ConfigLoader;
use dayloop::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load_layered(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => dayloop::cli::handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => dayloop::cli::handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args, config, cli.json).await,
        Commands::Show(args) => commands::show::execute(args, config, cli.json).await,
        Commands::List(args) => commands::list::execute(args, config, cli.json).await,
    };

    if let Err(err) = result {
        dayloop::cli::handle_error(err, cli.json);
    }
}
