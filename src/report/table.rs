//! Terminal table for snapshot lists.
//!
//! One row per snapshot in the order given (newest first from the store):
//! file name, the timestamp from the name, and size on disk.

use crate::store::Snapshot;
use crate::util::format_bytes;

const NAME_WIDTH: usize = 44;

pub fn render(snapshots: &[Snapshot]) -> String {
    if snapshots.is_empty() {
        return String::from("No backups found.\n");
    }

    let mut output = String::new();
    output.push_str(&format!("{:<NAME_WIDTH$} {:<20} {:>10}\n", "Name", "Created", "Size"));
    output.push_str(&"-".repeat(NAME_WIDTH + 32));
    output.push('\n');

    for snapshot in snapshots {
        let size = snapshot
            .size()
            .map(format_bytes)
            .unwrap_or_else(|| "?".to_string());

        output.push_str(&format!(
            "{:<NAME_WIDTH$} {:<20} {:>10}\n",
            truncate(&snapshot.name, NAME_WIDTH),
            snapshot.created.format("%Y-%m-%d %H:%M:%S"),
            size
        ));
    }

    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}
