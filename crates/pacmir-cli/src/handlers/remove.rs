use owo_colors::OwoColorize;
use std::path::Path;

use pacmir_error::Result;

pub struct RemoveHandler;

impl RemoveHandler {
    pub fn handle(root: &Path, package: &str, debug: bool) -> Result<()> {
        Self::print_header(package);
        pacmir_core::remove(root, package, debug)
    }

    fn print_header(package: &str) {
        println!(
            "{} {} {}",
            "pacmir".bright_cyan().bold(),
            "remove".bright_white(),
            package.bright_white()
        );
        println!();
    }
}
