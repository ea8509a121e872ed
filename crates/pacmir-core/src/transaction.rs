use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use pacmir_catalog::CatalogPackage;
use pacmir_error::{MirrorError, Result};

use crate::download::PackageFetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    Staged,
    Prepared,
    Committed,
    Released,
}

/// A batch, download-only unit of work. Packages are staged, the batch is
/// prepared (validated), then committed: either every staged artifact ends
/// up in the cache or none of them do. Dropping the transaction releases it
/// on every exit path.
pub struct MirrorTransaction {
    state: TransactionState,
    staged: Vec<CatalogPackage>,
    cache_dir: PathBuf,
}

impl MirrorTransaction {
    #[must_use]
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            state: TransactionState::Idle,
            staged: Vec::new(),
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    #[must_use]
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    pub fn stage(&mut self, pkg: CatalogPackage) -> Result<()> {
        match self.state {
            TransactionState::Idle | TransactionState::Staged => {
                self.staged.push(pkg);
                self.state = TransactionState::Staged;
                Ok(())
            }
            _ => Err(MirrorError::PrepareFailed(
                "cannot stage packages after prepare".to_string(),
            )),
        }
    }

    /// Validates the batch without touching the filesystem.
    pub fn prepare(&mut self) -> Result<()> {
        if self.state != TransactionState::Staged {
            return Err(MirrorError::PrepareFailed(format!(
                "nothing staged (state: {:?})",
                self.state
            )));
        }

        let mut filenames = HashSet::new();
        for pkg in &self.staged {
            if pkg.filename.is_empty() || pkg.url.is_empty() {
                return Err(MirrorError::PrepareFailed(format!(
                    "incomplete metadata for {}",
                    pkg.name
                )));
            }
            if !filenames.insert(pkg.filename.as_str()) {
                return Err(MirrorError::PrepareFailed(format!(
                    "duplicate filename {} in batch",
                    pkg.filename
                )));
            }
        }

        self.state = TransactionState::Prepared;
        Ok(())
    }

    /// Downloads every staged package and moves the batch into the cache.
    /// Artifacts land in a staging directory first; they only reach the
    /// cache by rename, and a failure rolls back every rename this commit
    /// already made. Returns the cache paths of the added files.
    pub fn commit(&mut self, fetcher: &dyn PackageFetcher, debug: bool) -> Result<Vec<PathBuf>> {
        if self.state != TransactionState::Prepared {
            return Err(MirrorError::CommitFailed(format!(
                "transaction not prepared (state: {:?})",
                self.state
            )));
        }

        let fetched = fetcher.fetch_all(&self.staged, debug).map_err(|e| {
            MirrorError::CommitFailed(format!("download batch failed: {e}"))
        })?;

        for (pkg, bytes) in &fetched {
            verify_checksum(pkg, bytes)?;
        }

        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| MirrorError::CommitFailed(e.to_string()))?;
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.cache_dir)
            .map_err(|e| MirrorError::CommitFailed(format!("staging dir: {e}")))?;

        for (pkg, bytes) in &fetched {
            fs::write(staging.path().join(&pkg.filename), bytes)
                .map_err(|e| MirrorError::CommitFailed(format!("{}: {e}", pkg.filename)))?;
        }

        // Rename into the cache; on failure undo the renames already done so
        // no partial batch is left behind.
        let mut added = Vec::with_capacity(fetched.len());
        for (pkg, _) in &fetched {
            let target = self.cache_dir.join(&pkg.filename);
            if let Err(e) = fs::rename(staging.path().join(&pkg.filename), &target) {
                for path in &added {
                    let _ = fs::remove_file(path);
                }
                return Err(MirrorError::CommitFailed(format!(
                    "{}: {e}",
                    pkg.filename
                )));
            }
            added.push(target);
        }

        self.state = TransactionState::Committed;
        Ok(added)
    }

    /// Frees the transaction. Idempotent; also runs on drop so release is
    /// guaranteed on success, validation failure, and commit failure alike.
    pub fn release(&mut self) {
        if self.state != TransactionState::Released {
            self.staged.clear();
            self.state = TransactionState::Released;
        }
    }
}

impl Drop for MirrorTransaction {
    fn drop(&mut self) {
        self.release();
    }
}

fn verify_checksum(pkg: &CatalogPackage, bytes: &[u8]) -> Result<()> {
    let Some(expected) = &pkg.sha256sum else {
        return Ok(());
    };
    let digest = format!("{:x}", Sha256::digest(bytes));
    if !digest.eq_ignore_ascii_case(expected) {
        return Err(MirrorError::CommitFailed(format!(
            "checksum mismatch for {}: expected {expected}, got {digest}",
            pkg.filename
        )));
    }
    Ok(())
}
