use std::fs;
use std::path::Path;

use pacmir_config::MirrorConfig;
use pacmir_error::{MirrorError, Result};

pub struct InitManager;

impl InitManager {
    /// Creates the mirror root and cache directories and loads the
    /// configuration, writing a default `mirror.json` on first run.
    /// Safe to call on every startup.
    pub fn ensure_layout(&self, root: &Path) -> Result<MirrorConfig> {
        fs::create_dir_all(root)?;

        let config_path = MirrorConfig::config_path(root);
        let config = if config_path.exists() {
            MirrorConfig::load(&config_path).map_err(|e| {
                MirrorError::ConfigError(format!("{}: {e}", config_path.display()))
            })?
        } else {
            let config = MirrorConfig::default();
            config.save(&config_path)?;
            pacmir_logger::info(&format!(
                "Wrote default configuration to {}; add upstream repositories to it",
                config_path.display()
            ));
            config
        };

        fs::create_dir_all(config.cache_path(root))?;
        Ok(config)
    }
}
