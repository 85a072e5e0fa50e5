use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Finds the station's current log file.
///
/// The station writes `<prefix>_<something>.log` files into one directory and
/// only ever appends to the newest one, so "current" is the matching file
/// with the greatest modification time. A missing directory or no match is a
/// normal condition, not an error: callers poll and retry.
#[derive(Debug, Clone)]
pub struct FileLocator {
    directory: PathBuf,
    prefix: String,
}

impl FileLocator {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// One directory scan; cheap enough to call every poll tick.
    pub fn locate(&self) -> Option<PathBuf> {
        let entries = std::fs::read_dir(&self.directory).ok()?;

        let mut newest: Option<(SystemTime, PathBuf)> = None;
        for entry in entries.flatten() {
            let path = entry.path();
            if !self.name_matches(&path) {
                continue;
            }
            // Entries that vanish or turn unreadable mid-scan are skipped;
            // the next poll sees a consistent listing.
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            if newest.as_ref().map_or(true, |(best, _)| modified > *best) {
                newest = Some((modified, path));
            }
        }

        newest.map(|(_, path)| path)
    }

    fn name_matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        name.strip_prefix(&self.prefix)
            .is_some_and(|rest| rest.starts_with('_') && rest.ends_with(".log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, modified: SystemTime) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"x\n").unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
        path
    }

    #[test]
    fn test_missing_directory_is_absent_not_error() {
        let locator = FileLocator::new("/nonexistent/meteoship-test-dir", "estacao");
        assert!(locator.locate().is_none());
    }

    #[test]
    fn test_empty_directory_is_absent() {
        let dir = TempDir::new().unwrap();
        let locator = FileLocator::new(dir.path(), "estacao");
        assert!(locator.locate().is_none());
    }

    #[test]
    fn test_newest_matching_file_wins() {
        let dir = TempDir::new().unwrap();
        let base = SystemTime::now();
        touch(dir.path(), "estacao_2024-01-14.log", base - Duration::from_secs(120));
        let newest = touch(dir.path(), "estacao_2024-01-15.log", base);
        touch(dir.path(), "estacao_2024-01-13.log", base - Duration::from_secs(240));

        let locator = FileLocator::new(dir.path(), "estacao");
        assert_eq!(locator.locate().unwrap(), newest);
    }

    #[test]
    fn test_non_matching_names_are_ignored() {
        let dir = TempDir::new().unwrap();
        let base = SystemTime::now();
        // Newer than the match, but wrong shape.
        touch(dir.path(), "estacao.log", base + Duration::from_secs(60));
        touch(dir.path(), "other_2024.log", base + Duration::from_secs(60));
        touch(dir.path(), "estacao_2024.txt", base + Duration::from_secs(60));
        let expected = touch(dir.path(), "estacao_2024.log", base);

        let locator = FileLocator::new(dir.path(), "estacao");
        assert_eq!(locator.locate().unwrap(), expected);
    }

    #[test]
    fn test_directories_are_not_candidates() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("estacao_backup.log")).unwrap();
        let expected = touch(dir.path(), "estacao_a.log", SystemTime::now());

        let locator = FileLocator::new(dir.path(), "estacao");
        assert_eq!(locator.locate().unwrap(), expected);
    }

    #[test]
    fn test_prefix_is_configurable() {
        let dir = TempDir::new().unwrap();
        let expected = touch(dir.path(), "wx_1.log", SystemTime::now());
        touch(dir.path(), "estacao_1.log", SystemTime::now());

        let locator = FileLocator::new(dir.path(), "wx");
        assert_eq!(locator.locate().unwrap(), expected);
    }
}
