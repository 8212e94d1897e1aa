//! Explicit retention.
//!
//! Nothing is ever deleted automatically; `prune` is an operator command:
//! - Dry run mode (default): shows what would be deleted
//! - Execute mode: deletes, collecting per-file errors instead of stopping
//!
//! The newest `keep` snapshots always survive. Of the rest, those older than
//! `older_than` are selected (all of them when no age is given).

use std::fs;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};

use super::SnapshotManager;
use crate::error::Result;
use crate::store::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneMode {
    DryRun,
    Execute,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrunePolicy {
    pub keep: Option<usize>,
    pub older_than: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct PruneResult {
    pub selected: Vec<String>,
    pub deleted: Vec<String>,
    pub errors: Vec<String>,
    pub bytes_freed: u64,
}

/// Snapshots (newest-first input) the policy would remove. A policy with
/// neither bound selects nothing.
pub fn select<'a>(
    snapshots: &'a [Snapshot],
    policy: &PrunePolicy,
    now: NaiveDateTime,
) -> Vec<&'a Snapshot> {
    if policy.keep.is_none() && policy.older_than.is_none() {
        return Vec::new();
    }

    let cutoff = match policy.older_than {
        Some(age) => match chrono::Duration::from_std(age)
            .ok()
            .and_then(|age| now.checked_sub_signed(age))
        {
            Some(cutoff) => Some(cutoff),
            // an age reaching before the calendar starts matches nothing
            None => return Vec::new(),
        },
        None => None,
    };

    snapshots
        .iter()
        .skip(policy.keep.unwrap_or(0))
        .filter(|s| cutoff.map_or(true, |cutoff| s.created < cutoff))
        .collect()
}

impl SnapshotManager {
    pub fn prune(&self, policy: &PrunePolicy, mode: PruneMode) -> Result<PruneResult> {
        self.prune_at(policy, mode, Local::now().naive_local())
    }

    pub fn prune_at(
        &self,
        policy: &PrunePolicy,
        mode: PruneMode,
        now: NaiveDateTime,
    ) -> Result<PruneResult> {
        let snapshots = self.list_backups()?;
        let victims = select(&snapshots, policy, now);

        let mut result = PruneResult {
            selected: victims.iter().map(|s| s.name.clone()).collect(),
            ..PruneResult::default()
        };

        match mode {
            PruneMode::DryRun => {
                for snapshot in victims {
                    result.deleted.push(snapshot.name.clone());
                    result.bytes_freed += snapshot.size().unwrap_or(0);
                }
            }
            PruneMode::Execute => {
                for snapshot in victims {
                    let size = snapshot.size().unwrap_or(0);
                    match fs::remove_file(&snapshot.path) {
                        Ok(()) => {
                            info!(snapshot = %snapshot.name, "pruned");
                            result.deleted.push(snapshot.name.clone());
                            result.bytes_freed += size;
                        }
                        Err(e) => {
                            warn!(snapshot = %snapshot.name, "prune failed: {e}");
                            result
                                .errors
                                .push(format!("failed to delete {}: {e}", snapshot.path.display()));
                        }
                    }
                }
            }
        }

        Ok(result)
    }
}
