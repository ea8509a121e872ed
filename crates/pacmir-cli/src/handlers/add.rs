use owo_colors::OwoColorize;
use std::path::Path;

use pacmir_error::Result;

pub struct AddHandler;

impl AddHandler {
    pub fn handle(
        root: &Path,
        repo: &str,
        package: &str,
        no_sync: bool,
        debug: bool,
    ) -> Result<()> {
        Self::print_header(repo, package);
        pacmir_core::add(root, repo, package, no_sync, debug)
    }

    fn print_header(repo: &str, package: &str) {
        println!(
            "{} {} {}",
            "pacmir".bright_cyan().bold(),
            "add".bright_white(),
            format!("{repo}/{package}").bright_white()
        );
        println!();
    }
}
