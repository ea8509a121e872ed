use std::fmt;

use pacmir_constants::{EXIT_NOT_TRACKED, EXIT_PACKAGE_NOT_FOUND, EXIT_REPO_NOT_CONFIGURED};

#[derive(Debug)]
pub enum MirrorError {
    RepoNotConfigured(String),
    PackageNotFound(String, String),
    NotTracked(String),
    CatalogUnavailable(String, String),
    PrepareFailed(String),
    CommitFailed(String),
    IndexToolMissing(String),
    IndexToolFailed(String),
    FileSystemError(String),
    ConfigError(String),
    NetworkError(String),
}

impl fmt::Display for MirrorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RepoNotConfigured(repo) => {
                write!(f, "{repo} is not a configured repository")
            }
            Self::PackageNotFound(name, repo) => {
                write!(f, "{name} was not found in repo {repo}")
            }
            Self::NotTracked(name) => {
                write!(f, "{name} is not a tracked package")
            }
            Self::CatalogUnavailable(repo, msg) => {
                write!(f, "repository {repo} is unavailable: {msg}")
            }
            Self::PrepareFailed(msg) => {
                write!(f, "transaction prepare failed: {msg}")
            }
            Self::CommitFailed(msg) => {
                write!(f, "transaction commit failed: {msg}")
            }
            Self::IndexToolMissing(tool) => {
                write!(f, "could not locate {tool} in the current path")
            }
            Self::IndexToolFailed(msg) => {
                write!(f, "index tool failed: {msg}")
            }
            Self::FileSystemError(msg) => {
                write!(f, "filesystem error: {msg}")
            }
            Self::ConfigError(msg) => {
                write!(f, "configuration error: {msg}")
            }
            Self::NetworkError(msg) => {
                write!(f, "network error: {msg}")
            }
        }
    }
}

impl std::error::Error for MirrorError {}

impl MirrorError {
    /// Process exit code for user-facing precondition failures.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RepoNotConfigured(_) => EXIT_REPO_NOT_CONFIGURED,
            Self::PackageNotFound(_, _) => EXIT_PACKAGE_NOT_FOUND,
            Self::NotTracked(_) => EXIT_NOT_TRACKED,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for MirrorError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystemError(err.to_string())
    }
}

impl From<anyhow::Error> for MirrorError {
    fn from(err: anyhow::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MirrorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_cli_contract() {
        assert_eq!(
            MirrorError::RepoNotConfigured("extra".into()).exit_code(),
            1
        );
        assert_eq!(
            MirrorError::PackageNotFound("vim".into(), "core".into()).exit_code(),
            2
        );
        assert_eq!(MirrorError::NotTracked("vim".into()).exit_code(), 3);
        assert_eq!(MirrorError::CommitFailed("boom".into()).exit_code(), 1);
    }

    #[test]
    fn io_errors_become_filesystem_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: MirrorError = io.into();
        assert!(matches!(err, MirrorError::FileSystemError(_)));
    }
}
