//! Docker compose process host.
//!
//! Drives the app's compose project through the compose CLI:
//! - `ps -q <service>` + `docker inspect` to see whether the app is up
//! - `exec -T <service> ...` to run commands next to the live database
//! - `down` to stop the app before a restore
//!
//! Handles gracefully:
//! - Docker daemon not running
//! - Permission denied on the docker socket
//! - Project already stopped

use std::path::PathBuf;
use std::process::{Command, Output};

use tracing::{debug, warn};

use super::Executor;
use crate::config::ContainerConfig;
use crate::error::{Result, SnapError};
use crate::platform::ComposeProgram;

pub struct ContainerExecutor {
    program: ComposeProgram,
    project: String,
    compose_file: PathBuf,
    service: String,
}

impl ContainerExecutor {
    pub fn new(program: ComposeProgram, config: &ContainerConfig) -> Self {
        ContainerExecutor {
            program,
            project: config.project.clone(),
            compose_file: config.compose_file.clone(),
            service: config.service.clone(),
        }
    }

    fn compose(&self) -> Command {
        let mut cmd = self.program.command();
        cmd.arg("-p").arg(&self.project);
        cmd.arg("-f").arg(&self.compose_file);
        cmd
    }

    fn run(&self, mut cmd: Command, what: &str) -> Result<Output> {
        debug!(command = ?cmd, "running {what}");
        let output = cmd.output().map_err(|e| {
            SnapError::Executor(format!("failed to run {}: {e}", self.program.display()))
        })?;
        Ok(output)
    }

    fn container_id(&self) -> Result<Option<String>> {
        let mut cmd = self.compose();
        cmd.args(["ps", "-q"]).arg(&self.service);
        let output = self.run(cmd, "compose ps")?;

        if !output.status.success() {
            return Err(SnapError::Executor(classify_failure(&output.stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string))
    }
}

impl Executor for ContainerExecutor {
    fn name(&self) -> &'static str {
        "container"
    }

    fn is_running(&self) -> bool {
        let id = match self.container_id() {
            Ok(Some(id)) => id,
            Ok(None) => return false,
            Err(e) => {
                debug!("{e}");
                return false;
            }
        };

        // the standalone binary lists stopped containers too
        let output = Command::new("docker")
            .args(["inspect", "-f", "{{.State.Running}}"])
            .arg(&id)
            .output();

        match output {
            Ok(o) if o.status.success() => parse_running_flag(&String::from_utf8_lossy(&o.stdout)),
            Ok(o) => {
                debug!("docker inspect failed: {}", classify_failure(&o.stderr));
                false
            }
            Err(e) => {
                debug!("docker inspect could not run: {e}");
                false
            }
        }
    }

    fn exec_in_container(&self, command: &[String]) -> Result<i32> {
        let mut cmd = self.compose();
        cmd.args(["exec", "-T"]).arg(&self.service).args(command);
        let output = self.run(cmd, "compose exec")?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim(), "container command stderr");
        }

        output
            .status
            .code()
            .ok_or_else(|| SnapError::Executor("container command was killed by a signal".into()))
    }

    fn stop(&self) {
        let mut cmd = self.compose();
        cmd.arg("down");

        match self.run(cmd, "compose down") {
            Ok(output) if output.status.success() => {
                debug!(project = %self.project, "compose project stopped");
            }
            Ok(output) => warn!("could not stop the app: {}", classify_failure(&output.stderr)),
            Err(e) => warn!("could not stop the app: {e}"),
        }
    }
}

fn parse_running_flag(stdout: &str) -> bool {
    stdout.trim().eq_ignore_ascii_case("true")
}

fn classify_failure(stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);

    if stderr.contains("Cannot connect to the Docker daemon")
        || stderr.contains("Is the docker daemon running")
    {
        return "daemon not running (start Docker Desktop or dockerd)".to_string();
    }

    if stderr.contains("permission denied") || stderr.contains("EACCES") {
        return "permission denied (add user to docker group or run with sudo)".to_string();
    }

    if stderr.contains("no such service") || stderr.contains("No such service") {
        return format!("unknown compose service: {}", stderr.trim());
    }

    format!("command failed: {}", stderr.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_failure() {
        assert_eq!(
            classify_failure(b"Cannot connect to the Docker daemon at unix:///var/run/docker.sock."),
            "daemon not running (start Docker Desktop or dockerd)"
        );
        assert_eq!(
            classify_failure(b"Got permission denied while trying to connect"),
            "permission denied (add user to docker group or run with sudo)"
        );
        assert!(classify_failure(b"no such service: web\n").starts_with("unknown compose service"));
        assert_eq!(classify_failure(b"  boom \n"), "command failed: boom");
    }

    #[test]
    fn test_parse_running_flag() {
        assert!(parse_running_flag("true\n"));
        assert!(!parse_running_flag("false\n"));
        assert!(!parse_running_flag(""));
    }

    #[test]
    fn compose_command_carries_project_and_file() {
        let config = ContainerConfig::default();
        let executor = ContainerExecutor::new(ComposeProgram::Plugin, &config);
        let cmd = executor.compose();

        assert_eq!(cmd.get_program(), "docker");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["compose", "-p", "timemanager", "-f", "docker-compose.yml"]);
    }
}
