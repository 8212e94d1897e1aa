//! On-disk naming contract for snapshots.
//!
//! `<dbname>_backup_<YYYYMMDD_HHMMSS>.db[.gz]`
//!
//! Existing backups made by the old shell scripts use this exact format, so
//! both directions (format and parse) must stay byte-compatible with it.

use chrono::NaiveDateTime;

pub const BACKUP_INFIX: &str = "_backup_";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const DB_EXT: &str = ".db";
pub const GZ_EXT: &str = ".gz";

const TIMESTAMP_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub db_name: String,
    pub created: NaiveDateTime,
    pub compressed: bool,
}

pub fn snapshot_file_name(db_name: &str, created: NaiveDateTime, compressed: bool) -> String {
    let mut name = format!(
        "{db_name}{BACKUP_INFIX}{}{DB_EXT}",
        created.format(TIMESTAMP_FORMAT)
    );
    if compressed {
        name.push_str(GZ_EXT);
    }
    name
}

/// Parse a file name following the contract. Anything else returns None.
pub fn parse(file_name: &str) -> Option<ParsedName> {
    let (rest, compressed) = match file_name.strip_suffix(GZ_EXT) {
        Some(rest) => (rest, true),
        None => (file_name, false),
    };
    let rest = rest.strip_suffix(DB_EXT)?;

    // db names may themselves contain "_backup_", the timestamp never does
    let split = rest.rfind(BACKUP_INFIX)?;
    let db_name = &rest[..split];
    let stamp = &rest[split + BACKUP_INFIX.len()..];

    if db_name.is_empty() || stamp.len() != TIMESTAMP_LEN {
        return None;
    }

    let created = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;

    Some(ParsedName {
        db_name: db_name.to_string(),
        created,
        compressed,
    })
}

/// `.gz` suffix means gzip content, anything else is a raw copy.
pub fn is_compressed(file_name: &str) -> bool {
    file_name.ends_with(GZ_EXT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn formats_the_script_layout() {
        assert_eq!(
            snapshot_file_name("app", at(7, 5, 3), true),
            "app_backup_20240309_070503.db.gz"
        );
        assert_eq!(
            snapshot_file_name("app", at(23, 59, 59), false),
            "app_backup_20240309_235959.db"
        );
    }

    #[test]
    fn parses_names_made_by_the_scripts() {
        let parsed = parse("timemanager_backup_20240309_070503.db.gz").unwrap();
        assert_eq!(parsed.db_name, "timemanager");
        assert_eq!(parsed.created, at(7, 5, 3));
        assert!(parsed.compressed);

        let raw = parse("app_backup_20240309_070503.db").unwrap();
        assert!(!raw.compressed);
    }

    #[test]
    fn db_name_may_contain_the_infix() {
        let parsed = parse("my_backup_tool_backup_20240309_070503.db.gz").unwrap();
        assert_eq!(parsed.db_name, "my_backup_tool");
    }

    #[test]
    fn rejects_foreign_files() {
        assert!(parse("app.db").is_none());
        assert!(parse("app.db.before_restore").is_none());
        assert!(parse("app_backup_2024.db.gz").is_none());
        assert!(parse("app_backup_20241399_070503.db").is_none());
        assert!(parse("_backup_20240309_070503.db").is_none());
        assert!(parse("app_backup_20240309_070503.sql.gz").is_none());
        assert!(parse("notes.txt").is_none());
    }

    #[test]
    fn compression_follows_suffix_only() {
        assert!(is_compressed("anything.gz"));
        assert!(!is_compressed("app_backup_20240309_070503.db"));
    }
}
