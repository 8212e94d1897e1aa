use clap::Parser;
use dbsnap::cli::{Cli, Command};
use dbsnap::config::Config;
use dbsnap::confirm::PromptConfirmation;
use dbsnap::error::SnapError;
use dbsnap::exec;
use dbsnap::manager::prune::{PruneMode, PrunePolicy};
use dbsnap::manager::SnapshotManager;
use dbsnap::report;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dbsnap={default_level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn fail(e: SnapError) -> ! {
    eprintln!("error: {e}");
    std::process::exit(e.exit_code());
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::from_cli(&cli).unwrap_or_else(|e| fail(e));

    // list and import never talk to docker, don't pay for detection there
    let executor: Box<dyn exec::Executor> = match cli.command {
        Command::Backup | Command::Restore(_) => exec::select(&config).unwrap_or_else(|e| fail(e)),
        _ => Box::new(exec::LocalExecutor),
    };
    let manager = SnapshotManager::new(config, executor);

    match cli.command {
        Command::Backup => match manager.create_backup() {
            Ok(snapshot) => report::print_backup(&snapshot),
            Err(e) => fail(e),
        },
        Command::Restore(args) => {
            let mut confirm = PromptConfirmation::stdio();
            match manager.restore(args.snapshot.as_deref(), &mut confirm) {
                Ok(result) => report::print_restore(&result.outcome),
                Err(e) => fail(e),
            }
        }
        Command::List(args) => match manager.list_backups() {
            Ok(snapshots) => report::print_list(&snapshots, args.json),
            Err(e) => fail(e),
        },
        Command::Import(args) => match manager.import_foreign(&args.profile, &args.source) {
            Ok(target) => println!("Imported {} as {}", args.source.display(), target.display()),
            Err(e) => fail(e),
        },
        Command::Prune(args) => {
            let policy = PrunePolicy {
                keep: args.keep,
                older_than: args.older_than,
            };
            let mode = if args.is_dry_run() {
                PruneMode::DryRun
            } else {
                PruneMode::Execute
            };

            match manager.prune(&policy, mode) {
                Ok(result) => {
                    report::print_prune(&result, mode);
                    if !result.errors.is_empty() {
                        std::process::exit(1);
                    }
                }
                Err(e) => fail(e),
            }
        }
    }
}
