pub mod cache;
pub mod download;
pub mod init;
pub mod sync;
pub mod transaction;

pub use download::{DownloadClient, PackageFetcher};
pub use init::InitManager;
pub use sync::{SyncManager, SyncReport};
pub use transaction::{MirrorTransaction, TransactionState};

use std::path::Path;

use pacmir_error::Result;
use pacmir_tracked::TrackedEntry;

pub fn sync(root: &Path, debug: bool) -> Result<SyncReport> {
    let mut manager = SyncManager::open(root)?;
    manager.sync(debug)
}

pub fn add(root: &Path, repo_name: &str, package_name: &str, no_sync: bool, debug: bool) -> Result<()> {
    let mut manager = SyncManager::open(root)?;
    manager.add(repo_name, package_name, no_sync, debug)
}

pub fn remove(root: &Path, package_name: &str, debug: bool) -> Result<()> {
    let mut manager = SyncManager::open(root)?;
    manager.remove(package_name, debug)
}

pub fn tracked_entries(root: &Path) -> Result<Vec<TrackedEntry>> {
    let manager = SyncManager::open(root)?;
    Ok(manager.tracked().iter().cloned().collect())
}
