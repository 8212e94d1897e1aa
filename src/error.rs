use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapError {
    #[error("database file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("restore from {snapshot} did not produce a complete database file: {reason}")]
    RestoreIncomplete { snapshot: String, reason: String },

    /// The rollback after a failed restore failed too. The live file may be
    /// missing and needs an operator.
    #[error(
        "{cause}; {} also failed: {reason} (manual intervention required)",
        describe_rollback(.safety_copy)
    )]
    RecoveryFailed {
        /// None when there was no live file to copy before the restore.
        safety_copy: Option<PathBuf>,
        reason: String,
        cause: Box<SnapError>,
    },

    #[error("invalid profile name: {0}")]
    InvalidProfile(String),

    #[error("no free snapshot name near {0} (too many backups in the same minute)")]
    NameExhausted(String),

    #[error("container: {0}")]
    Executor(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SnapError {
    /// Process exit code for this error. A failed rollback gets its own code
    /// so wrappers can tell it apart from ordinary failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            SnapError::RecoveryFailed { .. } => 2,
            _ => 1,
        }
    }
}

fn describe_rollback(safety_copy: &Option<PathBuf>) -> String {
    match safety_copy {
        Some(copy) => format!("rollback from {}", copy.display()),
        None => "removing the partial restore (there was no safety copy)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, SnapError>;
