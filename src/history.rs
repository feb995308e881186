//! History store: append-with-adjacent-dedup, capped at 1000 entries,
//! best-effort persistence to `<home>/.lucien/history` (§4.8).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const MAX_ENTRIES: usize = 1000;

pub struct HistoryStore {
    entries: Vec<String>,
    file: Option<PathBuf>,
}

impl HistoryStore {
    /// Create a store rooted at `<home>/.lucien/history`, seeding from the
    /// file if present. A missing file is not an error.
    pub fn new(home: &Path) -> Self {
        let dir = home.join(".lucien");
        let file = dir.join("history");
        let entries = fs::read_to_string(&file)
            .map(|s| s.lines().map(|l| l.to_string()).collect())
            .unwrap_or_default();
        Self {
            entries,
            file: Some(file),
        }
    }

    /// An in-memory-only store, used by tests and embedders that don't want
    /// filesystem side effects.
    pub fn in_memory() -> Self {
        Self {
            entries: Vec::new(),
            file: None,
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Append `line`, deduplicating only against the immediately preceding
    /// entry, capping at `MAX_ENTRIES` (oldest dropped), and persisting.
    /// I/O failures are swallowed — history is best-effort.
    pub fn append(&mut self, line: &str) {
        if self.entries.last().map(|s| s.as_str()) == Some(line) {
            return;
        }
        self.entries.push(line.to_string());
        if self.entries.len() > MAX_ENTRIES {
            let overflow = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(0..overflow);
        }
        let _ = self.persist();
    }

    fn persist(&self) -> io::Result<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let _ = fs::set_permissions(dir, fs::Permissions::from_mode(0o755));
            }
        }
        fs::write(file, self.entries.join("\n") + "\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_dedup() {
        let mut h = HistoryStore::in_memory();
        h.append("echo a");
        h.append("echo a");
        h.append("echo b");
        h.append("echo a");
        assert_eq!(h.entries(), &["echo a", "echo b", "echo a"]);
    }

    #[test]
    fn caps_at_max_entries() {
        let mut h = HistoryStore::in_memory();
        for i in 0..(MAX_ENTRIES + 10) {
            h.append(&format!("cmd {i}"));
        }
        assert_eq!(h.entries().len(), MAX_ENTRIES);
        assert_eq!(h.entries()[0], format!("cmd {}", 10));
    }

    #[test]
    fn persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut h = HistoryStore::new(dir.path());
            h.append("echo one");
            h.append("echo two");
        }
        let h2 = HistoryStore::new(dir.path());
        assert_eq!(h2.entries(), &["echo one", "echo two"]);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let h = HistoryStore::new(&dir.path().join("does-not-exist"));
        assert!(h.entries().is_empty());
    }
}
