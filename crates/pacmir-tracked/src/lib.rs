use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};

/// One operator declaration: mirror `name` from upstream repository `repo`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntry {
    pub name: String,
    pub repo: String,
}

/// The persisted tracked set. Entries are kept in insertion order so the
/// on-disk file rewrites deterministically; order has no effect on sync.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct TrackedSet {
    entries: Vec<TrackedEntry>,
}

impl TrackedSet {
    pub fn load(path: &Path) -> io::Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(TrackedSet::default())
        }
    }

    /// Writes the full set, replacing the previous file in one rename so a
    /// concurrent reader never observes a partial write.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Inserts unless an entry with the same name already exists, in any
    /// repository. Returns whether the entry was inserted.
    pub fn add(&mut self, entry: TrackedEntry) -> bool {
        if self.contains(&entry.name) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Removes and returns the entry for `name`, or None if not tracked.
    pub fn remove(&mut self, name: &str) -> Option<TrackedEntry> {
        let pos = self.entries.iter().position(|e| e.name == name)?;
        Some(self.entries.remove(pos))
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&TrackedEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
