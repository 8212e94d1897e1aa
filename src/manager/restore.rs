//! Restore with a safety copy and a single rollback attempt.
//!
//! ```text
//! Idle -> Confirming -> Aborted
//!                    -> Stopping -> SafetyCopy -> Writing -> Done
//!                                                         -> Recovering -> Recovered
//!                                                                       -> Failed
//! ```
//!
//! The live file is only ever replaced by rename from a fully written
//! sibling, so at every step it holds either its old content or the
//! complete new content.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::SnapshotManager;
use crate::confirm::ConfirmationSource;
use crate::error::{Result, SnapError};
use crate::store::{gzip, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreState {
    Idle,
    Confirming,
    Aborted,
    Stopping,
    SafetyCopy,
    Writing,
    Done,
    Recovering,
    Recovered,
    Failed,
}

#[derive(Debug)]
pub enum RestoreOutcome {
    /// The operator declined or picked nothing. Nothing was touched.
    Aborted,
    Done {
        snapshot: Snapshot,
        safety_copy: Option<PathBuf>,
    },
    /// Writing failed and the pre-restore state was put back.
    Recovered {
        cause: SnapError,
        safety_copy: Option<PathBuf>,
    },
}

#[derive(Debug)]
pub struct RestoreReport {
    pub outcome: RestoreOutcome,
    /// Every state visited, starting with `Idle`.
    pub trail: Vec<RestoreState>,
}

struct Trail(Vec<RestoreState>);

impl Trail {
    fn new() -> Self {
        Trail(vec![RestoreState::Idle])
    }

    fn enter(&mut self, state: RestoreState) {
        debug!(?state, "restore");
        self.0.push(state);
    }

    fn finish(self, outcome: RestoreOutcome) -> RestoreReport {
        RestoreReport {
            outcome,
            trail: self.0,
        }
    }
}

impl SnapshotManager {
    /// Replace the live database with `snapshot_id`, or with the snapshot the
    /// operator picks when `snapshot_id` is None.
    ///
    /// Confirmation comes first; nothing is stopped or written without it.
    /// An unknown snapshot fails with `SnapshotNotFound` before the app is
    /// stopped. A failed write is rolled back once from the safety copy;
    /// only a failed rollback is an error (`RecoveryFailed`).
    pub fn restore(
        &self,
        snapshot_id: Option<&str>,
        confirm: &mut dyn ConfirmationSource,
    ) -> Result<RestoreReport> {
        let live = self.config.database.clone();
        let mut trail = Trail::new();

        trail.enter(RestoreState::Confirming);
        let prompt = format!(
            "This will stop the app and replace {} with a backup.",
            live.display()
        );
        if !confirm.confirm(&prompt)? {
            trail.enter(RestoreState::Aborted);
            info!("restore cancelled at confirmation");
            return Ok(trail.finish(RestoreOutcome::Aborted));
        }

        let id = match snapshot_id {
            Some(id) => id.to_string(),
            None => {
                let available = self.list_backups()?;
                match confirm.choose_snapshot(&available)? {
                    Some(id) => id,
                    None => {
                        trail.enter(RestoreState::Aborted);
                        info!("restore cancelled, no snapshot chosen");
                        return Ok(trail.finish(RestoreOutcome::Aborted));
                    }
                }
            }
        };
        let snapshot = self.backups.resolve(&id)?;

        trail.enter(RestoreState::Stopping);
        self.executor.stop();

        trail.enter(RestoreState::SafetyCopy);
        let safety_path = self.config.safety_copy_path();
        let safety_copy = if live.is_file() {
            gzip::materialize(&live, &safety_path, false)?;
            debug!(path = %safety_path.display(), "safety copy written");
            Some(safety_path)
        } else {
            debug!("no live database, skipping safety copy");
            None
        };

        trail.enter(RestoreState::Writing);
        let cause = match write_live(&snapshot, &live) {
            Ok(bytes) => {
                trail.enter(RestoreState::Done);
                info!(snapshot = %snapshot.name, bytes, "database restored");
                return Ok(trail.finish(RestoreOutcome::Done {
                    snapshot,
                    safety_copy,
                }));
            }
            Err(cause) => cause,
        };

        warn!("{cause}; rolling back");
        trail.enter(RestoreState::Recovering);
        match recover(safety_copy.as_deref(), &live) {
            Ok(()) => {
                trail.enter(RestoreState::Recovered);
                info!("pre-restore database put back");
                Ok(trail.finish(RestoreOutcome::Recovered { cause, safety_copy }))
            }
            Err(e) => {
                trail.enter(RestoreState::Failed);
                error!("rollback failed: {e}");
                Err(SnapError::RecoveryFailed {
                    safety_copy,
                    reason: e.to_string(),
                    cause: Box::new(cause),
                })
            }
        }
    }
}

/// Materialize `snapshot` over `live` and check the result is all there.
fn write_live(snapshot: &Snapshot, live: &Path) -> Result<u64> {
    let incomplete = |reason: String| SnapError::RestoreIncomplete {
        snapshot: snapshot.name.clone(),
        reason,
    };

    let written = gzip::materialize(&snapshot.path, live, snapshot.compressed)
        .map_err(|e| incomplete(e.to_string()))?;

    verify_len(live, written).map_err(incomplete)?;
    Ok(written)
}

/// Put the pre-restore state back. Without a safety copy there was no live
/// file, so the pre-restore state is "no file".
fn recover(safety_copy: Option<&Path>, live: &Path) -> io::Result<()> {
    match safety_copy {
        Some(copy) => {
            let written = gzip::materialize(copy, live, false)?;
            verify_len(live, written).map_err(io::Error::other)
        }
        None => match fs::remove_file(live) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        },
    }
}

fn verify_len(path: &Path, expected: u64) -> std::result::Result<(), String> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() == expected => Ok(()),
        Ok(meta) => Err(format!(
            "expected {expected} bytes at {}, found {}",
            path.display(),
            meta.len()
        )),
        Err(e) => Err(format!("{} missing after write: {e}", path.display())),
    }
}
