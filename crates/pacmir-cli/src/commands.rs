use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pacmir")]
#[command(version = pacmir_constants::VERSION)]
#[command(propagate_version = true)]
#[command(about = pacmir_constants::DESCRIPTION, long_about = None)]
pub struct Cli {
    /// Mirror root directory (holds mirror.json, tracked.json and the cache)
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mirrors a package from the specified repository to the local repository
    #[command(alias = "track")]
    Add {
        /// Name of the repository from which to retrieve the package
        repo: String,
        /// Name of the package to mirror to the local repository
        package: String,
        /// Do not perform a repo sync after adding the new tracked package
        #[arg(long = "no-sync")]
        no_sync: bool,
        /// Enable debug mode for verbose output
        #[arg(long)]
        debug: bool,
    },
    /// Removes a package from being tracked and from the local repository
    #[command(aliases = ["rm", "untrack"])]
    Remove {
        /// Name of the tracked package to remove
        package: String,
        /// Enable debug mode for verbose output
        #[arg(long)]
        debug: bool,
    },
    /// Mirrors any updates for tracked packages to the local repository
    Sync {
        /// Enable debug mode for verbose output
        #[arg(long)]
        debug: bool,
    },
    /// Lists tracked packages
    #[command(alias = "ls")]
    List,
}
