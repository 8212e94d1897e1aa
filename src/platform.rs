use std::process::Command;

/// Which compose front end is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeProgram {
    /// `docker compose`, the v2 CLI plugin
    Plugin,
    /// the standalone `docker-compose` binary the old scripts called
    Standalone,
}

impl ComposeProgram {
    pub fn command(self) -> Command {
        match self {
            ComposeProgram::Plugin => {
                let mut cmd = Command::new("docker");
                cmd.arg("compose");
                cmd
            }
            ComposeProgram::Standalone => Command::new("docker-compose"),
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            ComposeProgram::Plugin => "docker compose",
            ComposeProgram::Standalone => "docker-compose",
        }
    }
}

pub fn docker_available() -> bool {
    Command::new("docker")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Prefer the compose plugin, fall back to the standalone binary.
pub fn detect_compose() -> Option<ComposeProgram> {
    let plugin = docker_available()
        && Command::new("docker")
            .args(["compose", "version"])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
    if plugin {
        return Some(ComposeProgram::Plugin);
    }

    let standalone = Command::new("docker-compose")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    standalone.then_some(ComposeProgram::Standalone)
}
