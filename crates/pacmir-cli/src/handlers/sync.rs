use owo_colors::OwoColorize;
use std::path::Path;

use pacmir_error::Result;

pub struct SyncHandler;

impl SyncHandler {
    pub fn handle(root: &Path, debug: bool) -> Result<()> {
        Self::print_header();
        let report = pacmir_core::sync(root, debug)?;
        if report.staged == 0 {
            pacmir_logger::info("Local repository is up to date");
        }
        Ok(())
    }

    fn print_header() {
        println!(
            "{} {}",
            "pacmir".bright_cyan().bold(),
            "sync".bright_white()
        );
        println!();
    }
}
