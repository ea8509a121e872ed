use std::env;
use std::path::PathBuf;
use std::process::Command;

use pacmir_constants::{INDEX_SUFFIX, INDEX_TOOL};
use pacmir_error::{MirrorError, Result};

/// Resolves an external tool name to an executable path, or reports that
/// the tool is absent. Injected into `IndexBuilder` so callers decide how
/// tools are found.
pub trait ToolLocator: Send {
    fn locate(&self, tool: &str) -> Option<PathBuf>;
}

/// Locator that walks the `PATH` environment variable.
pub struct PathLocator;

impl ToolLocator for PathLocator {
    fn locate(&self, tool: &str) -> Option<PathBuf> {
        let path = env::var_os("PATH")?;
        locate_in(env::split_paths(&path), tool)
    }
}

fn locate_in(dirs: impl Iterator<Item = PathBuf>, tool: &str) -> Option<PathBuf> {
    for dir in dirs {
        let candidate = dir.join(tool);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Drives the external `repo-add` tool that regenerates the local repository
/// index from cached package files. The tool is a black box: file list in,
/// index artifact out, non-zero exit on failure.
pub struct IndexBuilder {
    locator: Box<dyn ToolLocator>,
    cache_dir: PathBuf,
    local_name: String,
}

impl IndexBuilder {
    #[must_use]
    pub fn new(locator: Box<dyn ToolLocator>, cache_dir: PathBuf, local_name: &str) -> Self {
        Self {
            locator,
            cache_dir,
            local_name: local_name.to_string(),
        }
    }

    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.cache_dir
            .join(format!("{}{INDEX_SUFFIX}", self.local_name))
    }

    /// Runs `repo-add -R <index> <files...>`. With the full cache file list
    /// this is a full rebuild; with only newly added files it updates the
    /// index incrementally.
    pub fn rebuild(&self, files: &[PathBuf]) -> Result<()> {
        let tool = self
            .locator
            .locate(INDEX_TOOL)
            .ok_or_else(|| MirrorError::IndexToolMissing(INDEX_TOOL.to_string()))?;

        pacmir_logger::status(&format!(
            "Rebuilding local index from {} package file(s)...",
            files.len()
        ));

        let status = Command::new(&tool)
            .arg("-R")
            .arg(self.index_path())
            .args(files)
            .status()
            .map_err(|e| {
                MirrorError::FileSystemError(format!("failed to run {}: {e}", tool.display()))
            })?;

        if !status.success() {
            return Err(MirrorError::IndexToolFailed(format!(
                "{INDEX_TOOL} exited with {status}"
            )));
        }
        Ok(())
    }

    /// Deletes every index artifact (`<local_name>*` in the cache dir) ahead
    /// of a full rebuild, mirroring how removals invalidate the old index.
    pub fn remove_index_artifacts(&self) -> Result<()> {
        if !self.cache_dir.exists() {
            return Ok(());
        }

        for entry in std::fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.starts_with(&self.local_name) {
                std::fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}

/// Returns true when `name` is an index artifact rather than a package file.
#[must_use]
pub fn is_index_artifact(name: &str, local_name: &str) -> bool {
    name.starts_with(local_name)
}
