//! Process host strategies.
//!
//! The app either runs in a compose project or not at all. [`select`] picks
//! the strategy once at startup:
//! - [`ContainerExecutor`]: the app is (or is forced to be treated as)
//!   running under docker compose, backups run inside the container
//! - [`LocalExecutor`]: nothing to talk to, work on host files directly

pub mod container;
pub mod local;

pub use container::ContainerExecutor;
pub use local::LocalExecutor;

use tracing::{debug, info};

use crate::config::{Config, ExecutorMode};
use crate::error::{Result, SnapError};
use crate::platform;

pub trait Executor {
    fn name(&self) -> &'static str;

    /// True when the app is up and commands can run inside it.
    fn is_running(&self) -> bool;

    /// Run `command` inside the app's environment, returning its exit code.
    fn exec_in_container(&self, command: &[String]) -> Result<i32>;

    /// Stop the app. Best effort: failures are logged, an app that is not
    /// running is not an error.
    fn stop(&self);
}

pub fn select(config: &Config) -> Result<Box<dyn Executor>> {
    match config.executor {
        ExecutorMode::Local => {
            debug!("executor forced to local");
            Ok(Box::new(LocalExecutor))
        }
        ExecutorMode::Container => {
            let program = platform::detect_compose().ok_or_else(|| {
                SnapError::Executor("neither `docker compose` nor `docker-compose` is available".into())
            })?;
            Ok(Box::new(ContainerExecutor::new(program, &config.container)))
        }
        ExecutorMode::Auto => {
            let Some(program) = platform::detect_compose() else {
                debug!("docker compose not installed, using local executor");
                return Ok(Box::new(LocalExecutor));
            };

            let container = ContainerExecutor::new(program, &config.container);
            if container.is_running() {
                info!(service = %config.container.service, "app is running in a container");
                Ok(Box::new(container))
            } else {
                debug!("app container not running, using local executor");
                Ok(Box::new(LocalExecutor))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_mode_never_touches_docker() {
        let config = Config {
            executor: ExecutorMode::Local,
            ..Config::default()
        };
        let executor = select(&config).unwrap();
        assert_eq!(executor.name(), "local");
        assert!(!executor.is_running());
    }
}
