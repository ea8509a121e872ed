use owo_colors::OwoColorize;
use std::path::Path;

use pacmir_error::Result;

pub struct ListHandler;

impl ListHandler {
    pub fn handle(root: &Path) -> Result<()> {
        let entries = pacmir_core::tracked_entries(root)?;

        if entries.is_empty() {
            pacmir_logger::info("No packages are tracked");
            return Ok(());
        }

        println!(
            "{} {}",
            "pacmir".bright_cyan().bold(),
            format!("{} tracked package(s)", entries.len()).bright_white()
        );
        for entry in entries {
            println!(
                "  {} {}",
                entry.name.bright_white(),
                format!("({})", entry.repo).bright_black()
            );
        }
        Ok(())
    }
}
