pub mod commands;
pub mod handlers;

use clap::Parser;

use commands::{Cli, Commands};
use handlers::{AddHandler, ListHandler, RemoveHandler, SyncHandler};

/// Parses arguments and dispatches to the matching handler. Precondition
/// failures (unknown repo, unknown package, untracked package) terminate
/// the process with their contract exit code after a diagnostic.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    pacmir_logger::init_logger(false);

    let result = match &cli.command {
        Commands::Add {
            repo,
            package,
            no_sync,
            debug,
        } => AddHandler::handle(&cli.root, repo, package, *no_sync, *debug),
        Commands::Remove { package, debug } => RemoveHandler::handle(&cli.root, package, *debug),
        Commands::Sync { debug } => SyncHandler::handle(&cli.root, *debug),
        Commands::List => ListHandler::handle(&cli.root),
    };

    if let Err(e) = result {
        pacmir_logger::error(&e.to_string());
        std::process::exit(e.exit_code());
    }
    Ok(())
}
