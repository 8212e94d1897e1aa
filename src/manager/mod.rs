//! Snapshot manager.
//!
//! Owns the config record, the backups directory and the process host
//! chosen at startup. Operations:
//! - [`SnapshotManager::create_backup`]: timestamped gzip snapshot of the
//!   live database, taken inside the app container when it is running
//! - [`SnapshotManager::list_backups`]: snapshots newest-first
//! - [`SnapshotManager::restore`]: confirmed, rollback-protected restore
//!   (see [`restore`])
//! - [`SnapshotManager::import_foreign`]: copy another instance's database
//!   into a profile namespace
//! - [`SnapshotManager::prune`]: explicit retention (see [`prune`])
//!
//! Nothing here prints or exits; results go back to the CLI layer.

pub mod prune;
pub mod restore;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, SnapError};
use crate::exec::Executor;
use crate::store::naming::{self, DB_EXT};
use crate::store::{gzip, BackupDir, Snapshot};

/// Exit code the in-container backup script uses for a missing database.
const CONTAINER_SOURCE_MISSING: i32 = 3;

/// Exit code for "raw copy kept, compression failed".
const CONTAINER_COMPRESS_FAILED: i32 = 4;

/// Positional args: $1 database, $2 backups dir, $3 file name, $4 compress.
/// A failed step removes what it wrote; a failed gzip keeps the raw copy,
/// same as a local backup.
const CONTAINER_BACKUP_SCRIPT: &str = r#"test -f "$1" || exit 3
mkdir -p "$2" || exit 1
cp "$1" "$2/$3" || { rm -f "$2/$3"; exit 1; }
if [ "$4" = "1" ]; then gzip -f "$2/$3" || { rm -f "$2/$3.gz"; exit 4; }; fi"#;

pub struct SnapshotManager {
    config: Config,
    backups: BackupDir,
    executor: Box<dyn Executor>,
}

impl SnapshotManager {
    pub fn new(config: Config, executor: Box<dyn Executor>) -> Self {
        let backups = BackupDir::new(config.backups_dir.clone(), config.db_name());
        SnapshotManager {
            config,
            backups,
            executor,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backups(&self) -> &BackupDir {
        &self.backups
    }

    pub fn create_backup(&self) -> Result<Snapshot> {
        self.create_backup_at(Local::now().naive_local())
    }

    /// Snapshot the live database as of `now`.
    pub fn create_backup_at(&self, now: NaiveDateTime) -> Result<Snapshot> {
        if self.executor.is_running() {
            return self.backup_in_container(now);
        }

        let database = &self.config.database;
        if !database.is_file() {
            return Err(SnapError::SourceNotFound(database.clone()));
        }

        self.backups.ensure()?;
        let (created, raw_name) = self.backups.allocate(now)?;
        let raw_path = self.backups.root().join(&raw_name);

        let bytes = gzip::copy_file(database, &raw_path)?;
        debug!(path = %raw_path.display(), bytes, "copied live database");

        let raw = Snapshot {
            name: raw_name,
            path: raw_path,
            created,
            compressed: false,
        };

        if !self.config.compress {
            info!(snapshot = %raw.name, "backup created");
            return Ok(raw);
        }

        match gzip::compress_in_place(&raw.path) {
            Ok(gz_path) => {
                let snapshot = Snapshot {
                    name: file_name(&gz_path),
                    path: gz_path,
                    created,
                    compressed: true,
                };
                info!(snapshot = %snapshot.name, "backup created");
                Ok(snapshot)
            }
            Err(e) => {
                warn!("compression failed, keeping uncompressed snapshot {}: {e}", raw.name);
                Ok(raw)
            }
        }
    }

    fn backup_in_container(&self, now: NaiveDateTime) -> Result<Snapshot> {
        let container = &self.config.container;

        // the container writes into a bind mount of the host directory, so
        // collisions are checked on the host side
        self.backups.ensure()?;
        let (created, raw_name) = self.backups.allocate(now)?;

        let command: Vec<String> = vec![
            "sh".into(),
            "-c".into(),
            CONTAINER_BACKUP_SCRIPT.into(),
            "dbsnap".into(),
            container.database.clone(),
            container.backups_dir.clone(),
            raw_name.clone(),
            if self.config.compress { "1" } else { "0" }.into(),
        ];

        info!(executor = self.executor.name(), service = %container.service, "running backup inside the app container");
        let compressed = match self.executor.exec_in_container(&command)? {
            0 => self.config.compress,
            CONTAINER_COMPRESS_FAILED => {
                warn!("compression failed inside the container, keeping uncompressed snapshot {raw_name}");
                false
            }
            CONTAINER_SOURCE_MISSING => {
                return Err(SnapError::SourceNotFound(PathBuf::from(&container.database)));
            }
            code => {
                return Err(SnapError::Executor(format!(
                    "backup inside container exited with code {code}"
                )));
            }
        };

        let name = naming::snapshot_file_name(&self.config.db_name(), created, compressed);
        let path = self.backups.root().join(&name);
        if !path.exists() {
            warn!(
                "snapshot {name} was written to {} inside the container but is not visible in {}; is the backups directory mounted?",
                container.backups_dir,
                self.backups.root().display()
            );
        }

        Ok(Snapshot {
            name,
            path,
            created,
            compressed,
        })
    }

    pub fn list_backups(&self) -> Result<Vec<Snapshot>> {
        self.backups.list()
    }

    /// Copy a foreign backup (raw or `.gz`) into
    /// `<imports_dir>/<profile>/<dbname>.db`. Never writes the live database.
    pub fn import_foreign(&self, profile: &str, source: &Path) -> Result<PathBuf> {
        validate_profile(profile)?;

        if !source.is_file() {
            return Err(SnapError::SourceNotFound(source.to_path_buf()));
        }

        let target_dir = self.config.imports_dir.join(profile);
        fs::create_dir_all(&target_dir)?;
        let target = target_dir.join(format!("{}{DB_EXT}", self.config.db_name()));

        if normalized(&target) == normalized(&self.config.database) {
            return Err(SnapError::InvalidProfile(format!(
                "{profile} (import target {} is the live database)",
                target.display()
            )));
        }

        let bytes = gzip::materialize(source, &target, gzip::is_gzip_path(source))?;
        info!(profile, target = %target.display(), bytes, "imported foreign database");
        Ok(target)
    }
}

fn validate_profile(profile: &str) -> Result<()> {
    let valid = !profile.is_empty()
        && profile
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SnapError::InvalidProfile(profile.to_string()))
    }
}

/// Absolute form of `path` for identity checks, following symlinks in the
/// parent directory. The file itself need not exist.
fn normalized(path: &Path) -> PathBuf {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    fs::canonicalize(parent)
        .map(|p| p.join(name))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
