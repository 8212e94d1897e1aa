use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ExecutorMode;

#[derive(Parser)]
#[command(name = "dbsnap")]
#[command(about = "Snapshot and restore the app database file")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ./dbsnap.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Live database file, overrides the config file
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Backups directory, overrides the config file
    #[arg(long, global = true)]
    pub backups_dir: Option<PathBuf>,

    /// Where backups run: inside the app container or on host files
    #[arg(long, global = true, value_enum)]
    pub executor: Option<ExecutorMode>,

    /// Show debug logging on stderr
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a timestamped, compressed snapshot of the database
    Backup,

    /// Replace the database with a snapshot (asks for confirmation)
    Restore(RestoreArgs),

    /// List snapshots, newest first
    List(ListArgs),

    /// Import another instance's database under a profile name
    Import(ImportArgs),

    /// Delete old snapshots
    Prune(PruneArgs),
}

#[derive(Args)]
pub struct RestoreArgs {
    /// Snapshot file name; asked for interactively when omitted
    pub snapshot: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Profile label the imported database is stored under
    pub profile: String,

    /// Backup file from the other instance (.db or .db.gz)
    pub source: PathBuf,
}

#[derive(Args)]
#[command(group(
    clap::ArgGroup::new("policy")
        .required(true)
        .multiple(true)
        .args(["keep", "older_than"]),
))]
pub struct PruneArgs {
    /// Always keep this many of the newest snapshots
    #[arg(long)]
    pub keep: Option<usize>,

    /// Only delete snapshots older than this ("30d", "2w", "12h")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub older_than: Option<std::time::Duration>,

    /// Skip the dry run and delete
    #[arg(long, default_value_t = false)]
    pub yes: bool,
}

impl PruneArgs {
    /// returns true if this is a dry run (show what would be deleted)
    pub fn is_dry_run(&self) -> bool {
        !self.yes
    }
}
