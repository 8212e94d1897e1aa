//! Configuration record handed to the snapshot manager.
//!
//! Values come from, in order of precedence:
//! - command line flags (`--database`, `--backups-dir`, `--executor`)
//! - the config file (`--config FILE`, else `./dbsnap.toml`, else
//!   `~/.config/dbsnap/config.toml` or platform equivalent)
//! - built-in defaults matching the app's compose layout
//!
//! Relative host paths in a config file are resolved against the file's
//! directory so the tool behaves the same from any working directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::cli::Cli;
use crate::error::{Result, SnapError};

pub const LOCAL_CONFIG_FILE: &str = "dbsnap.toml";
pub const SAFETY_COPY_SUFFIX: &str = ".before_restore";

/// How the process host is chosen at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorMode {
    /// Use the container when the app is running in it, the host otherwise
    #[default]
    Auto,
    /// Always operate on host files, never touch docker
    Local,
    /// Always go through docker compose
    Container,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
    pub compose_file: PathBuf,
    pub project: String,
    pub service: String,
    /// Database path as seen from inside the container
    pub database: String,
    /// Backups directory inside the container, expected to be a bind mount
    /// of the host backups directory
    pub backups_dir: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        ContainerConfig {
            compose_file: PathBuf::from("docker-compose.yml"),
            project: "timemanager".to_string(),
            service: "web".to_string(),
            database: "/app/instance/app.db".to_string(),
            backups_dir: "/app/backups".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: PathBuf,
    pub backups_dir: PathBuf,
    pub imports_dir: PathBuf,
    pub compress: bool,
    pub executor: ExecutorMode,
    pub container: ContainerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: PathBuf::from("instance/app.db"),
            backups_dir: PathBuf::from("backups"),
            imports_dir: PathBuf::from("instance/imports"),
            compress: true,
            executor: ExecutorMode::Auto,
            container: ContainerConfig::default(),
        }
    }
}

impl Config {
    /// Build the config for one invocation: file lookup, then flag overrides.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = Config::load(cli.config.as_deref())?;

        if let Some(database) = &cli.database {
            config.database = database.clone();
        }
        if let Some(backups_dir) = &cli.backups_dir {
            config.backups_dir = backups_dir.clone();
        }
        if let Some(mode) = cli.executor {
            config.executor = mode;
        }

        Ok(config)
    }

    /// Load from an explicit file, or the first default location that exists.
    /// An explicit path that does not exist is an error; missing default
    /// files fall back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(SnapError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Config::from_file(path);
        }

        for candidate in default_locations() {
            if candidate.is_file() {
                return Config::from_file(&candidate);
            }
        }

        debug!("no config file found, using defaults");
        Ok(Config::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let contents = std::fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Config::from_toml_str(&contents, base)
    }

    pub fn from_toml_str(contents: &str, base: &Path) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        config.resolve_relative_to(base);
        config.validate()?;
        Ok(config)
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [
            &mut self.database,
            &mut self.backups_dir,
            &mut self.imports_dir,
            &mut self.container.compose_file,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.database.file_name().is_none() {
            return Err(SnapError::Config(format!(
                "database must name a file: {}",
                self.database.display()
            )));
        }
        if self.container.service.trim().is_empty() {
            return Err(SnapError::Config("container.service must not be empty".into()));
        }
        Ok(())
    }

    /// Stem used in snapshot names, `app` for `instance/app.db`.
    pub fn db_name(&self) -> String {
        self.database
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "database".to_string())
    }

    pub fn safety_copy_path(&self) -> PathBuf {
        let mut name: OsString = self.database.as_os_str().to_owned();
        name.push(SAFETY_COPY_SUFFIX);
        PathBuf::from(name)
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dirs) = directories::ProjectDirs::from("", "", "dbsnap") {
        locations.push(dirs.config_dir().join("config.toml"));
    }
    locations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_name_the_database_stem() {
        let config = Config::default();
        assert_eq!(config.db_name(), "app");
        assert_eq!(
            config.safety_copy_path(),
            PathBuf::from("instance/app.db.before_restore")
        );
        assert!(config.compress);
        assert_eq!(config.executor, ExecutorMode::Auto);
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let toml = r#"
            database = "data/time.db"
            backups_dir = "/var/backups/time"
            executor = "local"

            [container]
            service = "api"
        "#;
        let config = Config::from_toml_str(toml, Path::new("/srv/app")).unwrap();

        assert_eq!(config.database, PathBuf::from("/srv/app/data/time.db"));
        assert_eq!(config.backups_dir, PathBuf::from("/var/backups/time"));
        assert_eq!(config.imports_dir, PathBuf::from("/srv/app/instance/imports"));
        assert_eq!(config.container.compose_file, PathBuf::from("/srv/app/docker-compose.yml"));
        assert_eq!(config.container.service, "api");
        assert_eq!(config.container.project, "timemanager");
        assert_eq!(config.executor, ExecutorMode::Local);
        assert_eq!(config.db_name(), "time");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("databse = \"x.db\"", Path::new(".")).unwrap_err();
        assert!(matches!(err, SnapError::Toml(_)));
    }

    #[test]
    fn empty_service_is_rejected() {
        let err = Config::from_toml_str("[container]\nservice = \" \"", Path::new(".")).unwrap_err();
        assert!(matches!(err, SnapError::Config(_)));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, SnapError::Config(_)));
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbsnap.toml");
        std::fs::write(&path, "database = \"live.db\"\ncompress = false\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.database, dir.path().join("live.db"));
        assert!(!config.compress);
    }
}
