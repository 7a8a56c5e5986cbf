//! Debug snapshots of fetched pages.
//!
//! In debug mode every page the navigator loads is written to disk so
//! navigation failures can be inspected after the run.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::url_utils::slugify;

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `html` to `{name}_{timestamp}.html` and return the path.
    pub fn save(&self, name: &str, html: &str) -> std::io::Result<PathBuf> {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S%3f");
        let stem = match slugify(name) {
            s if s.is_empty() => "page".to_string(),
            s => s,
        };
        let path = self.dir.join(format!("{}_{}.html", stem, timestamp));
        std::fs::write(&path, html)?;
        tracing::debug!("Snapshot saved: {}", path.display());
        Ok(path)
    }

    /// Remove `.html` snapshots last modified more than `days` ago.
    pub fn cleanup_older_than(&self, days: u64) -> std::io::Result<usize> {
        let max_age = Duration::from_secs(days * 24 * 60 * 60);
        let now = SystemTime::now();
        let mut removed = 0;

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }
            let modified = std::fs::metadata(&path)?.modified()?;
            let age = now.duration_since(modified).unwrap_or_default();
            if age > max_age {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!("Removed {} old snapshots", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_writes_timestamped_file() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("snaps")).unwrap();
        let path = store.save("Catalog Step 1", "<html></html>").unwrap();

        let file_name = path.file_name().unwrap().to_str().unwrap();
        assert!(file_name.starts_with("catalog_step_1_"));
        assert!(file_name.ends_with(".html"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<html></html>");
    }

    #[test]
    fn test_cleanup_keeps_fresh_snapshots() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();
        store.save("fresh", "x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        assert_eq!(store.cleanup_older_than(7).unwrap(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_cleanup_removes_old_snapshots() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();
        let old = store.save("old catalog", "<html>old</html>").unwrap();
        let fresh = store.save("new catalog", "<html>new</html>").unwrap();

        let ten_days_ago = SystemTime::now() - Duration::from_secs(10 * 24 * 60 * 60);
        std::fs::File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(ten_days_ago)
            .unwrap();

        assert_eq!(store.cleanup_older_than(7).unwrap(), 1);
        assert!(!old.exists());
        assert!(fresh.exists());
        assert_eq!(store.cleanup_older_than(30).unwrap(), 0);
    }
}
