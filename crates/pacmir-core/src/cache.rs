use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pacmir_error::{MirrorError, Result};

/// A package is cached exactly when its artifact file exists.
pub fn is_cached(cache_dir: &Path, filename: &str) -> bool {
    cache_dir.join(filename).is_file()
}

/// Deletes a cached artifact. A missing file is not an error; returns
/// whether anything was removed.
pub fn remove_cached(cache_dir: &Path, filename: &str) -> Result<bool> {
    match fs::remove_file(cache_dir.join(filename)) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MirrorError::FileSystemError(format!(
            "failed to delete {filename}: {e}"
        ))),
    }
}

/// Deletes every cached artifact belonging to `package_name`, matched as
/// `<name>-<digit>...` so "foo" does not swallow "foo-bar". Used when the
/// upstream catalog can no longer tell us the exact filename.
pub fn remove_matching(cache_dir: &Path, package_name: &str) -> Result<Vec<String>> {
    let prefix = format!("{package_name}-");
    let mut removed = Vec::new();

    if !cache_dir.exists() {
        return Ok(removed);
    }

    for entry in fs::read_dir(cache_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let Some(rest) = name.strip_prefix(&prefix) else {
            continue;
        };
        if rest.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            fs::remove_file(entry.path())?;
            removed.push(name.to_string());
        }
    }
    Ok(removed)
}

/// All package artifact files currently in the cache, excluding index
/// artifacts and hidden files, sorted for a deterministic indexer call.
pub fn package_files(cache_dir: &Path, local_name: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if !cache_dir.exists() {
        return Ok(files);
    }

    for entry in fs::read_dir(cache_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if name.starts_with('.') || pacmir_index::is_index_artifact(name, local_name) {
            continue;
        }
        files.push(entry.path());
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_removal_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!remove_cached(dir.path(), "vim-9.1-1-x86_64.pkg.tar.zst").unwrap());

        fs::write(dir.path().join("vim-9.1-1-x86_64.pkg.tar.zst"), b"pkg").unwrap();
        assert!(remove_cached(dir.path(), "vim-9.1-1-x86_64.pkg.tar.zst").unwrap());
    }

    #[test]
    fn prefix_match_does_not_swallow_longer_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("foo-1.0-1-x86_64.pkg.tar.zst"), b"pkg").unwrap();
        fs::write(dir.path().join("foo-bar-1.0-1-x86_64.pkg.tar.zst"), b"pkg").unwrap();

        let removed = remove_matching(dir.path(), "foo").unwrap();
        assert_eq!(removed, vec!["foo-1.0-1-x86_64.pkg.tar.zst".to_string()]);
        assert!(dir.path().join("foo-bar-1.0-1-x86_64.pkg.tar.zst").exists());
    }

    #[test]
    fn package_files_skip_index_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("local-mirror.db.tar.gz"), b"db").unwrap();
        fs::write(dir.path().join("vim-9.1-1-x86_64.pkg.tar.zst"), b"pkg").unwrap();
        fs::write(dir.path().join("nano-8.0-1-x86_64.pkg.tar.zst"), b"pkg").unwrap();

        let files = package_files(dir.path(), "local-mirror").unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("nano-8.0-1-x86_64.pkg.tar.zst"),
                dir.path().join("vim-9.1-1-x86_64.pkg.tar.zst"),
            ]
        );
    }
}
