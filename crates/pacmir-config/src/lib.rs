use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{fs, io};

use pacmir_constants::{CACHE_DIR, CONFIG_FILE, DEFAULT_LOCAL_NAME, TRACKED_FILE};

/// One upstream repository the mirror may pull from. `url` is the base
/// under which both the catalog metadata and the package files live.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RepoConfig {
    pub name: String,
    pub url: String,
}

/// Mirror configuration, read from `mirror.json` at the mirror root.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    /// Name of the local repository; also names the index artifact.
    pub local_name: String,
    /// Cache directory, relative to the mirror root.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    #[serde(default)]
    pub repos: Vec<RepoConfig>,
}

fn default_cache_dir() -> String {
    CACHE_DIR.to_string()
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            local_name: DEFAULT_LOCAL_NAME.to_string(),
            cache_dir: default_cache_dir(),
            repos: Vec::new(),
        }
    }
}

impl MirrorConfig {
    pub fn load(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    #[must_use]
    pub fn repo(&self, name: &str) -> Option<&RepoConfig> {
        self.repos.iter().find(|r| r.name == name)
    }

    #[must_use]
    pub fn config_path(root: &Path) -> PathBuf {
        root.join(CONFIG_FILE)
    }

    #[must_use]
    pub fn tracked_path(root: &Path) -> PathBuf {
        root.join(TRACKED_FILE)
    }

    #[must_use]
    pub fn cache_path(&self, root: &Path) -> PathBuf {
        root.join(&self.cache_dir)
    }
}
