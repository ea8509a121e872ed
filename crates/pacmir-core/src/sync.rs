use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use pacmir_catalog::{Catalog, RemoteCatalog};
use pacmir_config::MirrorConfig;
use pacmir_error::{MirrorError, Result};
use pacmir_index::{IndexBuilder, PathLocator, ToolLocator};
use pacmir_tracked::{TrackedEntry, TrackedSet};

use crate::cache;
use crate::download::{DownloadClient, PackageFetcher};
use crate::init::InitManager;
use crate::transaction::MirrorTransaction;

/// What a sync pass did, for callers that want to report on it.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub staged: usize,
    pub downloaded: usize,
    pub already_cached: usize,
    pub missing_upstream: Vec<String>,
    pub index_rebuilt: bool,
}

/// Orchestrates the tracked set, the upstream catalogs, the download
/// transaction and the index rebuild. All collaborators are explicit
/// instances handed in at construction; the engine holds no global state.
pub struct SyncManager {
    config: MirrorConfig,
    cache_dir: PathBuf,
    tracked: TrackedSet,
    tracked_path: PathBuf,
    catalogs: HashMap<String, Box<dyn Catalog>>,
    fetcher: Box<dyn PackageFetcher>,
    index: IndexBuilder,
}

impl SyncManager {
    pub fn new(
        root: &Path,
        config: MirrorConfig,
        catalogs: Vec<Box<dyn Catalog>>,
        fetcher: Box<dyn PackageFetcher>,
        locator: Box<dyn ToolLocator>,
    ) -> Result<Self> {
        let cache_dir = config.cache_path(root);
        let tracked_path = MirrorConfig::tracked_path(root);
        let tracked = TrackedSet::load(&tracked_path)?;
        let index = IndexBuilder::new(locator, cache_dir.clone(), &config.local_name);

        Ok(Self {
            config,
            cache_dir,
            tracked,
            tracked_path,
            catalogs: catalogs
                .into_iter()
                .map(|c| (c.name().to_string(), c))
                .collect(),
            fetcher,
            index,
        })
    }

    /// Bootstraps the on-disk layout and wires up the default collaborators:
    /// one remote catalog per configured repository, the HTTP download
    /// client, and `repo-add` located via `PATH`.
    pub fn open(root: &Path) -> Result<Self> {
        let config = InitManager.ensure_layout(root)?;
        let catalogs = config
            .repos
            .iter()
            .map(|r| Box::new(RemoteCatalog::new(&r.name, &r.url)) as Box<dyn Catalog>)
            .collect();
        Self::new(
            root,
            config,
            catalogs,
            Box::new(DownloadClient::new()),
            Box::new(PathLocator),
        )
    }

    #[must_use]
    pub fn tracked(&self) -> &TrackedSet {
        &self.tracked
    }

    /// Mirrors any updates for tracked packages to the local repository.
    ///
    /// One batch transaction covers the whole pass. Per-entry problems
    /// (package gone upstream, already cached) are warnings; transaction or
    /// index failures abort the pass and surface to the caller.
    pub fn sync(&mut self, debug: bool) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        // Catalogs are independent, so refresh them in parallel. A failed
        // refresh only excludes that repository from this pass.
        let failures: Vec<(String, MirrorError)> = self
            .catalogs
            .par_iter_mut()
            .filter_map(|(name, catalog)| {
                catalog.refresh(true).err().map(|e| (name.clone(), e))
            })
            .collect();

        let mut unavailable = HashSet::new();
        for (name, err) in failures {
            pacmir_logger::warn(&format!("skipping repo {name} for this sync: {err}"));
            unavailable.insert(name);
        }

        let mut tx = MirrorTransaction::new(&self.cache_dir);
        for entry in self.tracked.iter() {
            if unavailable.contains(&entry.repo) {
                pacmir_logger::debug(
                    &format!("{}: repo {} unavailable, skipping", entry.name, entry.repo),
                    debug,
                );
                continue;
            }
            let Some(catalog) = self.catalogs.get(&entry.repo) else {
                pacmir_logger::warn(&format!(
                    "{} is tracked from {}, which is not a configured repository",
                    entry.name, entry.repo
                ));
                continue;
            };

            match catalog.lookup(&entry.name) {
                None => {
                    pacmir_logger::warn(&format!(
                        "{} is no longer present in repo {}",
                        entry.name, entry.repo
                    ));
                    report.missing_upstream.push(entry.name.clone());
                }
                Some(pkg) if cache::is_cached(&self.cache_dir, &pkg.filename) => {
                    pacmir_logger::debug(
                        &format!("{} is already downloaded, skipping", entry.name),
                        debug,
                    );
                    report.already_cached += 1;
                }
                Some(pkg) => {
                    tx.stage(pkg)?;
                    report.staged += 1;
                }
            }
        }

        if report.staged == 0 {
            pacmir_logger::debug("no packages were added to the sync transaction", debug);
            return Ok(report);
        }

        // Prepare/commit failures drop the transaction, which releases it.
        tx.prepare()?;
        let added = tx.commit(self.fetcher.as_ref(), debug)?;

        // The index must only be rebuilt once the whole batch is in place.
        self.index.rebuild(&added)?;
        tx.release();

        report.downloaded = added.len();
        report.index_rebuilt = true;
        pacmir_logger::success(&format!(
            "Mirrored {} package(s) to the local repository",
            report.downloaded
        ));
        Ok(report)
    }

    /// Tracks a package from the given repository and, unless suppressed,
    /// immediately syncs so the mirror reflects the new declaration.
    pub fn add(
        &mut self,
        repo_name: &str,
        package_name: &str,
        no_sync: bool,
        debug: bool,
    ) -> Result<()> {
        let catalog = self
            .catalogs
            .get_mut(repo_name)
            .ok_or_else(|| MirrorError::RepoNotConfigured(repo_name.to_string()))?;

        catalog.refresh(true)?;
        let pkg = catalog.lookup(package_name).ok_or_else(|| {
            MirrorError::PackageNotFound(package_name.to_string(), repo_name.to_string())
        })?;

        let inserted = self.tracked.add(TrackedEntry {
            name: package_name.to_string(),
            repo: repo_name.to_string(),
        });
        if inserted {
            pacmir_logger::info(&format!(
                "Now tracking {} {} from {repo_name}",
                pkg.name, pkg.version
            ));
        } else {
            pacmir_logger::debug(&format!("{package_name} is already tracked"), debug);
        }
        self.tracked.save(&self.tracked_path)?;

        if !no_sync {
            self.sync(debug)?;
        }
        Ok(())
    }

    /// Stops tracking a package, deletes its cached artifact and fully
    /// rebuilds the index from whatever remains in the cache.
    pub fn remove(&mut self, package_name: &str, debug: bool) -> Result<()> {
        let Some(entry) = self.tracked.find(package_name).cloned() else {
            return Err(MirrorError::NotTracked(package_name.to_string()));
        };

        let mut deleted = false;
        if let Some(catalog) = self.catalogs.get_mut(&entry.repo) {
            if let Err(e) = catalog.refresh(false) {
                pacmir_logger::warn(&format!("could not refresh repo {}: {e}", entry.repo));
            }
            if let Some(pkg) = catalog.lookup(package_name) {
                deleted = cache::remove_cached(&self.cache_dir, &pkg.filename)?;
                if deleted {
                    pacmir_logger::debug(&format!("deleted cached {}", pkg.filename), debug);
                }
            }
        }
        if !deleted {
            // The catalog no longer knows the filename; fall back to a
            // name-prefix scan of the cache.
            for name in cache::remove_matching(&self.cache_dir, package_name)? {
                pacmir_logger::debug(&format!("deleted cached {name}"), debug);
            }
        }

        self.tracked.remove(package_name);
        self.tracked.save(&self.tracked_path)?;

        // A removal invalidates the whole index artifact, so rebuild it from
        // the full remaining file set rather than incrementally.
        self.index.remove_index_artifacts()?;
        let remaining = cache::package_files(&self.cache_dir, &self.config.local_name)?;
        self.index.rebuild(&remaining)?;

        pacmir_logger::success(&format!(
            "{package_name} removed from the local repository"
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacmir_catalog::CatalogPackage;
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MemoryCatalog {
        name: String,
        packages: HashMap<String, CatalogPackage>,
        fail_refresh: bool,
    }

    impl MemoryCatalog {
        fn new(name: &str, packages: &[(&str, &str)]) -> Self {
            Self {
                name: name.to_string(),
                packages: packages
                    .iter()
                    .map(|(pkg_name, version)| {
                        ((*pkg_name).to_string(), test_pkg(pkg_name, version, name))
                    })
                    .collect(),
                fail_refresh: false,
            }
        }

        fn failing(name: &str) -> Self {
            Self {
                name: name.to_string(),
                packages: HashMap::new(),
                fail_refresh: true,
            }
        }
    }

    impl Catalog for MemoryCatalog {
        fn name(&self) -> &str {
            &self.name
        }

        fn refresh(&mut self, _force: bool) -> Result<()> {
            if self.fail_refresh {
                Err(MirrorError::CatalogUnavailable(
                    self.name.clone(),
                    "connection refused".to_string(),
                ))
            } else {
                Ok(())
            }
        }

        fn lookup(&self, name: &str) -> Option<CatalogPackage> {
            self.packages.get(name).cloned()
        }
    }

    struct MemoryFetcher {
        fail: bool,
        fetches: Arc<AtomicUsize>,
    }

    impl PackageFetcher for MemoryFetcher {
        fn fetch_all(
            &self,
            packages: &[CatalogPackage],
            _debug: bool,
        ) -> Result<Vec<(CatalogPackage, Vec<u8>)>> {
            if self.fail {
                return Err(MirrorError::NetworkError("download failed".to_string()));
            }
            self.fetches.fetch_add(packages.len(), Ordering::SeqCst);
            Ok(packages
                .iter()
                .map(|pkg| (pkg.clone(), format!("blob:{}", pkg.name).into_bytes()))
                .collect())
        }
    }

    struct CountingLocator {
        tool: Option<PathBuf>,
        calls: Arc<AtomicUsize>,
    }

    impl ToolLocator for CountingLocator {
        fn locate(&self, _tool: &str) -> Option<PathBuf> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.tool.clone()
        }
    }

    fn test_pkg(name: &str, version: &str, repo: &str) -> CatalogPackage {
        CatalogPackage {
            name: name.to_string(),
            version: version.to_string(),
            filename: format!("{name}-{version}-x86_64.pkg.tar.zst"),
            repo: repo.to_string(),
            url: format!("https://mirror.example.org/{repo}/{name}-{version}-x86_64.pkg.tar.zst"),
            sha256sum: None,
        }
    }

    struct Counters {
        fetches: Arc<AtomicUsize>,
        rebuilds: Arc<AtomicUsize>,
    }

    fn manager(root: &Path, catalogs: Vec<Box<dyn Catalog>>, fail_downloads: bool) -> (SyncManager, Counters) {
        let counters = Counters {
            fetches: Arc::new(AtomicUsize::new(0)),
            rebuilds: Arc::new(AtomicUsize::new(0)),
        };
        let fetcher = MemoryFetcher {
            fail: fail_downloads,
            fetches: counters.fetches.clone(),
        };
        let locator = CountingLocator {
            tool: Some(PathBuf::from("/bin/true")),
            calls: counters.rebuilds.clone(),
        };
        let mgr = SyncManager::new(
            root,
            MirrorConfig::default(),
            catalogs,
            Box::new(fetcher),
            Box::new(locator),
        )
        .unwrap();
        (mgr, counters)
    }

    #[cfg(unix)]
    #[test]
    fn sync_mirrors_a_missing_package_then_becomes_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = MemoryCatalog::new("main", &[("foo", "1.0-1")]);
        let (mut mgr, counters) = manager(dir.path(), vec![Box::new(catalog)], false);

        mgr.add("main", "foo", true, false).unwrap();

        let report = mgr.sync(false).unwrap();
        assert_eq!(report.staged, 1);
        assert_eq!(report.downloaded, 1);
        assert!(report.index_rebuilt);
        let cached = dir
            .path()
            .join(pacmir_constants::CACHE_DIR)
            .join("foo-1.0-1-x86_64.pkg.tar.zst");
        assert_eq!(fs::read(&cached).unwrap(), b"blob:foo");

        // Second pass: nothing staged, no download, no index rebuild.
        let report = mgr.sync(false).unwrap();
        assert_eq!(report.staged, 0);
        assert_eq!(report.already_cached, 1);
        assert!(!report.index_rebuilt);
        assert_eq!(counters.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(counters.rebuilds.load(Ordering::SeqCst), 1);
    }

    #[cfg(unix)]
    #[test]
    fn missing_upstream_package_is_a_warning_not_an_abort() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = MemoryCatalog::new("main", &[("present", "2.0-1")]);
        let (mut mgr, _) = manager(dir.path(), vec![Box::new(catalog)], false);

        mgr.add("main", "present", true, false).unwrap();
        // Simulate an entry whose package has vanished upstream.
        mgr.tracked.add(TrackedEntry {
            name: "vanished".to_string(),
            repo: "main".to_string(),
        });

        let report = mgr.sync(false).unwrap();
        assert_eq!(report.downloaded, 1);
        assert_eq!(report.missing_upstream, vec!["vanished".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn one_unavailable_catalog_does_not_abort_the_pass() {
        let dir = tempfile::tempdir().unwrap();
        let good = MemoryCatalog::new("main", &[("foo", "1.0-1")]);
        let bad = MemoryCatalog::failing("extra");
        let (mut mgr, _) = manager(dir.path(), vec![Box::new(good), Box::new(bad)], false);

        mgr.add("main", "foo", true, false).unwrap();
        mgr.tracked.add(TrackedEntry {
            name: "bar".to_string(),
            repo: "extra".to_string(),
        });

        let report = mgr.sync(false).unwrap();
        assert_eq!(report.downloaded, 1);
        assert!(report.missing_upstream.is_empty());
    }

    #[test]
    fn failed_commit_leaves_cache_untouched_and_skips_the_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = MemoryCatalog::new("main", &[("foo", "1.0-1")]);
        let (mut mgr, counters) = manager(dir.path(), vec![Box::new(catalog)], true);

        mgr.add("main", "foo", true, false).unwrap();
        let err = mgr.sync(false).unwrap_err();
        assert!(matches!(err, MirrorError::CommitFailed(_)));

        let cache_dir = dir.path().join(pacmir_constants::CACHE_DIR);
        assert!(!cache_dir.exists() || fs::read_dir(&cache_dir).unwrap().next().is_none());
        assert_eq!(counters.rebuilds.load(Ordering::SeqCst), 0);
        // The declaration survives; the next sync can retry.
        assert!(mgr.tracked().contains("foo"));
    }

    #[test]
    fn add_rejects_an_unconfigured_repo() {
        let dir = tempfile::tempdir().unwrap();
        let (mut mgr, _) = manager(dir.path(), vec![], false);

        let err = mgr.add("missing", "foo", true, false).unwrap_err();
        assert!(matches!(err, MirrorError::RepoNotConfigured(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn add_rejects_a_package_absent_upstream() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = MemoryCatalog::new("main", &[]);
        let (mut mgr, _) = manager(dir.path(), vec![Box::new(catalog)], false);

        let err = mgr.add("main", "ghost", true, false).unwrap_err();
        assert!(matches!(err, MirrorError::PackageNotFound(_, _)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn add_persists_and_is_unique_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let main = MemoryCatalog::new("main", &[("foo", "1.0-1")]);
        let extra = MemoryCatalog::new("extra", &[("foo", "1.0-2")]);
        let (mut mgr, _) = manager(dir.path(), vec![Box::new(main), Box::new(extra)], false);

        mgr.add("main", "foo", true, false).unwrap();
        mgr.add("extra", "foo", true, false).unwrap();
        assert_eq!(mgr.tracked().len(), 1);
        assert_eq!(
            mgr.tracked().find("foo").map(|e| e.repo.clone()),
            Some("main".to_string())
        );

        let reloaded = TrackedSet::load(&MirrorConfig::tracked_path(dir.path())).unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn remove_of_an_untracked_package_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (mut mgr, _) = manager(dir.path(), vec![], false);

        let err = mgr.remove("ghost", false).unwrap_err();
        assert!(matches!(err, MirrorError::NotTracked(_)));
        assert_eq!(err.exit_code(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn remove_deletes_the_cached_file_and_the_tracking_entry() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = MemoryCatalog::new("main", &[("foo", "1.0-1")]);
        let (mut mgr, counters) = manager(dir.path(), vec![Box::new(catalog)], false);

        mgr.add("main", "foo", false, false).unwrap();
        let cached = dir
            .path()
            .join(pacmir_constants::CACHE_DIR)
            .join("foo-1.0-1-x86_64.pkg.tar.zst");
        assert!(cached.is_file());

        mgr.remove("foo", false).unwrap();
        assert!(!cached.exists());
        assert!(!mgr.tracked().contains("foo"));
        let reloaded = TrackedSet::load(&MirrorConfig::tracked_path(dir.path())).unwrap();
        assert!(reloaded.is_empty());
        // One rebuild from add's sync, one full rebuild from the removal.
        assert_eq!(counters.rebuilds.load(Ordering::SeqCst), 2);
    }

    #[cfg(unix)]
    #[test]
    fn remove_falls_back_to_a_name_scan_when_upstream_forgot_the_package() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = MemoryCatalog::new("main", &[("foo", "1.0-1")]);
        let (mut mgr, _) = manager(dir.path(), vec![Box::new(catalog)], false);

        mgr.add("main", "foo", false, false).unwrap();
        let cached = dir
            .path()
            .join(pacmir_constants::CACHE_DIR)
            .join("foo-1.0-1-x86_64.pkg.tar.zst");
        assert!(cached.is_file());

        // Upstream no longer lists the package.
        mgr.catalogs.insert(
            "main".to_string(),
            Box::new(MemoryCatalog::new("main", &[])),
        );

        mgr.remove("foo", false).unwrap();
        assert!(!cached.exists());
    }
}
