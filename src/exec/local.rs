use super::Executor;
use crate::error::{Result, SnapError};

/// The app is not running anywhere we can reach. All work happens on host
/// files.
pub struct LocalExecutor;

impl Executor for LocalExecutor {
    fn name(&self) -> &'static str {
        "local"
    }

    fn is_running(&self) -> bool {
        false
    }

    fn exec_in_container(&self, _command: &[String]) -> Result<i32> {
        Err(SnapError::Executor("no running container to execute in".into()))
    }

    fn stop(&self) {}
}
