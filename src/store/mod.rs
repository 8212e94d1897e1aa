//! Backups directory.
//!
//! Holds snapshots named by the contract in [`naming`]. Supports:
//! - Listing snapshots newest-first by the timestamp in the file name
//! - Resolving a user-supplied file name to a path inside the directory
//! - Allocating a free name for a new snapshot
//!
//! File modification times are never consulted. Copies and moves change
//! mtimes, the name does not.

pub mod gzip;
pub mod naming;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::error::{Result, SnapError};

/// Seconds a colliding timestamp may be pushed forward before giving up.
const MAX_NAME_ATTEMPTS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub name: String,
    pub path: PathBuf,
    pub created: NaiveDateTime,
    pub compressed: bool,
}

impl Snapshot {
    /// Size on disk, None when the file is not visible from here.
    pub fn size(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|m| m.len())
    }
}

pub struct BackupDir {
    root: PathBuf,
    db_name: String,
}

impl BackupDir {
    pub fn new(root: impl Into<PathBuf>, db_name: impl Into<String>) -> Self {
        BackupDir {
            root: root.into(),
            db_name: db_name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// All snapshots of this database, newest first. A missing directory is
    /// an empty list.
    pub fn list(&self) -> Result<Vec<Snapshot>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(dir = %self.root.display(), "backups directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut snapshots = Vec::new();
        for entry in entries {
            let entry = entry?;
            // follows symlinks, like `resolve`
            if !entry.path().is_file() {
                continue;
            }

            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else { continue };
            let Some(parsed) = naming::parse(name) else { continue };
            if parsed.db_name != self.db_name {
                continue;
            }

            snapshots.push(Snapshot {
                name: name.to_string(),
                path: entry.path(),
                created: parsed.created,
                compressed: parsed.compressed,
            });
        }

        snapshots.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.name.cmp(&a.name)));
        Ok(snapshots)
    }

    /// Resolve a bare file name to an existing file in this directory.
    /// Path separators and dot entries never resolve, so a restore can only
    /// read from the backups directory.
    pub fn resolve(&self, id: &str) -> Result<Snapshot> {
        let id = id.trim();
        let is_bare = !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\'])
            && Path::new(id).file_name().is_some_and(|n| n == id);
        if !is_bare {
            return Err(SnapError::SnapshotNotFound(id.to_string()));
        }

        let path = self.root.join(id);
        if !path.is_file() {
            return Err(SnapError::SnapshotNotFound(id.to_string()));
        }

        // names outside the contract are still restorable, they just carry
        // no timestamp of their own
        let (created, compressed) = match naming::parse(id) {
            Some(parsed) => (parsed.created, parsed.compressed),
            None => (NaiveDateTime::default(), naming::is_compressed(id)),
        };

        Ok(Snapshot {
            name: id.to_string(),
            path,
            created,
            compressed,
        })
    }

    /// Pick the raw (`.db`) file name for a snapshot taken at `created`.
    ///
    /// When a snapshot for that second already exists, compressed or not,
    /// the timestamp moves forward one second at a time. Existing snapshots
    /// are never overwritten.
    pub fn allocate(&self, created: NaiveDateTime) -> Result<(NaiveDateTime, String)> {
        for offset in 0..MAX_NAME_ATTEMPTS {
            let candidate = created + Duration::seconds(offset);
            let raw = naming::snapshot_file_name(&self.db_name, candidate, false);
            let gz = naming::snapshot_file_name(&self.db_name, candidate, true);

            if !self.root.join(&raw).exists() && !self.root.join(&gz).exists() {
                if offset > 0 {
                    debug!(%raw, offset, "snapshot name collided, moved timestamp forward");
                }
                return Ok((candidate, raw));
            }
        }

        Err(SnapError::NameExhausted(naming::snapshot_file_name(
            &self.db_name,
            created,
            false,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn missing_directory_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backups = BackupDir::new(dir.path().join("nope"), "app");
        assert!(backups.list().unwrap().is_empty());
    }

    #[test]
    fn lists_newest_first_by_name_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "app_backup_20240501_090000.db.gz");
        touch(dir.path(), "app_backup_20231231_235959.db.gz");
        touch(dir.path(), "app_backup_20240501_100000.db");
        touch(dir.path(), "other_backup_20250101_000000.db.gz");
        touch(dir.path(), "README.txt");
        fs::create_dir(dir.path().join("app_backup_20260101_000000.db")).unwrap();

        // make the oldest snapshot the most recently modified file
        touch(dir.path(), "app_backup_20231231_235959.db.gz");

        let backups = BackupDir::new(dir.path(), "app");
        let names: Vec<_> = backups.list().unwrap().into_iter().map(|s| s.name).collect();

        assert_eq!(
            names,
            vec![
                "app_backup_20240501_100000.db",
                "app_backup_20240501_090000.db.gz",
                "app_backup_20231231_235959.db.gz",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_snapshots_are_listed_and_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let elsewhere = dir.path().join("archive.db.gz");
        fs::write(&elsewhere, b"x").unwrap();
        let backups_root = dir.path().join("backups");
        fs::create_dir(&backups_root).unwrap();
        let name = "app_backup_20240501_090000.db.gz";
        std::os::unix::fs::symlink(&elsewhere, backups_root.join(name)).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), backups_root.join("app_backup_20240502_090000.db")).unwrap();

        let backups = BackupDir::new(&backups_root, "app");
        let names: Vec<_> = backups.list().unwrap().into_iter().map(|s| s.name).collect();

        assert_eq!(names, vec![name]);
        assert!(backups.resolve(name).is_ok());
        assert!(backups.resolve("app_backup_20240502_090000.db").is_err());
    }

    #[test]
    fn list_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "app_backup_20240501_090000.db.gz");
        touch(dir.path(), "app_backup_20240502_090000.db.gz");

        let backups = BackupDir::new(dir.path(), "app");
        assert_eq!(backups.list().unwrap(), backups.list().unwrap());
    }

    #[test]
    fn resolve_rejects_paths_outside_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let backups_root = dir.path().join("backups");
        fs::create_dir(&backups_root).unwrap();
        touch(dir.path(), "outside.db");

        let backups = BackupDir::new(&backups_root, "app");
        for id in ["../outside.db", "", ".", "..", "sub/app.db"] {
            assert!(
                matches!(backups.resolve(id), Err(SnapError::SnapshotNotFound(_))),
                "{id:?} should not resolve"
            );
        }
    }

    #[test]
    fn resolve_finds_contract_and_foreign_names() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "app_backup_20240501_090000.db.gz");
        touch(dir.path(), "hand_made.db");

        let backups = BackupDir::new(dir.path(), "app");
        let snap = backups.resolve("app_backup_20240501_090000.db.gz").unwrap();
        assert!(snap.compressed);
        assert_eq!(snap.created, at(9, 0, 0));

        let foreign = backups.resolve("hand_made.db").unwrap();
        assert!(!foreign.compressed);

        assert!(matches!(
            backups.resolve("xyz.db"),
            Err(SnapError::SnapshotNotFound(_))
        ));
    }

    #[test]
    fn allocate_moves_past_taken_seconds() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "app_backup_20240501_090000.db.gz");
        touch(dir.path(), "app_backup_20240501_090001.db");

        let backups = BackupDir::new(dir.path(), "app");
        let (created, name) = backups.allocate(at(9, 0, 0)).unwrap();

        assert_eq!(created, at(9, 0, 2));
        assert_eq!(name, "app_backup_20240501_090002.db");
    }

    #[test]
    fn allocate_gives_up_after_a_minute_of_collisions() {
        let dir = tempfile::tempdir().unwrap();
        for s in 0..60 {
            touch(dir.path(), &naming::snapshot_file_name("app", at(9, 0, 0) + Duration::seconds(s), true));
        }

        let backups = BackupDir::new(dir.path(), "app");
        assert!(matches!(
            backups.allocate(at(9, 0, 0)),
            Err(SnapError::NameExhausted(_))
        ));
    }
}
