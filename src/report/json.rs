//! JSON output for snapshot lists.
//!
//! Serializes the list for scripting and piping, newest first.

use serde::Serialize;

use crate::store::Snapshot;

#[derive(Serialize)]
struct SnapshotRow<'a> {
    name: &'a str,
    path: String,
    created: String,
    compressed: bool,
    size_bytes: Option<u64>,
}

pub fn render(snapshots: &[Snapshot]) -> String {
    let rows: Vec<SnapshotRow> = snapshots
        .iter()
        .map(|s| SnapshotRow {
            name: &s.name,
            path: s.path.display().to_string(),
            created: s.created.format("%Y-%m-%dT%H:%M:%S").to_string(),
            compressed: s.compressed,
            size_bytes: s.size(),
        })
        .collect();

    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| String::from("[]"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::BackupDir;

    #[test]
    fn renders_array_with_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app_backup_20240101_080000.db.gz"), b"abc").unwrap();

        let snapshots = BackupDir::new(dir.path(), "app").list().unwrap();
        let value: serde_json::Value = serde_json::from_str(&render(&snapshots)).unwrap();

        assert_eq!(value[0]["name"], "app_backup_20240101_080000.db.gz");
        assert_eq!(value[0]["created"], "2024-01-01T08:00:00");
        assert_eq!(value[0]["compressed"], true);
        assert_eq!(value[0]["size_bytes"], 3);
    }

    #[test]
    fn empty_list_is_empty_array() {
        assert_eq!(render(&[]), "[]");
    }
}
