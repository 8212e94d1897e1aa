pub mod json;
pub mod table;

use crate::manager::prune::{PruneMode, PruneResult};
use crate::manager::restore::RestoreOutcome;
use crate::store::Snapshot;
use crate::util::format_bytes;

pub fn print_list(snapshots: &[Snapshot], json_output: bool) {
    if json_output {
        println!("{}", json::render(snapshots));
    } else {
        print!("{}", table::render(snapshots));
    }
}

pub fn print_backup(snapshot: &Snapshot) {
    match snapshot.size() {
        Some(size) => println!("Backup created: {} ({})", snapshot.path.display(), format_bytes(size)),
        None => println!("Backup created: {}", snapshot.path.display()),
    }
}

pub fn print_restore(outcome: &RestoreOutcome) {
    match outcome {
        RestoreOutcome::Aborted => println!("Restore cancelled."),
        RestoreOutcome::Done { snapshot, safety_copy } => {
            println!("Database restored from {}", snapshot.name);
            if let Some(copy) = safety_copy {
                println!("Previous database saved as {}", copy.display());
            }
        }
        RestoreOutcome::Recovered { cause, safety_copy } => {
            eprintln!("warning: {cause}");
            match safety_copy {
                Some(copy) => eprintln!("Previous database put back from {}", copy.display()),
                None => eprintln!("No database existed before the restore; left it absent"),
            }
        }
    }
}

pub fn print_prune(result: &PruneResult, mode: PruneMode) {
    if result.selected.is_empty() {
        println!("Nothing to prune.");
        return;
    }

    let verb = match mode {
        PruneMode::DryRun => "[dry-run] would delete",
        PruneMode::Execute => "deleted",
    };
    for name in &result.deleted {
        println!("{verb}: {name}");
    }

    if !result.errors.is_empty() {
        eprintln!("\nerrors encountered:");
        for error in &result.errors {
            eprintln!("  {error}");
        }
    }

    match mode {
        PruneMode::DryRun => println!("\nwould free: {}", format_bytes(result.bytes_freed)),
        PruneMode::Execute => println!("\nfreed: {}", format_bytes(result.bytes_freed)),
    }
}
