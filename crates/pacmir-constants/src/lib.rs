pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = "A selective repository mirroring tool for pacman";
pub const REPOSITORY_URL: &str = "https://github.com/pacmir/pacmir";
pub const BIN_NAME: &str = "pacmir";

pub const USER_AGENT: &str = "pacmir/0.1.0";
pub const MAX_ATTEMPTS: u32 = 4;
pub const MAX_PARALLEL_DOWNLOADS: usize = 8;

/// File names resolved relative to the mirror root.
pub const CONFIG_FILE: &str = "mirror.json";
pub const TRACKED_FILE: &str = "tracked.json";
pub const CACHE_DIR: &str = "cache";

/// External indexer contract: `repo-add -R <db> <files...>`.
pub const INDEX_TOOL: &str = "repo-add";
pub const INDEX_SUFFIX: &str = ".db.tar.gz";

pub const DEFAULT_LOCAL_NAME: &str = "local-mirror";

pub const EXIT_REPO_NOT_CONFIGURED: i32 = 1;
pub const EXIT_PACKAGE_NOT_FOUND: i32 = 2;
pub const EXIT_NOT_TRACKED: i32 = 3;
