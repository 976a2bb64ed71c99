use chrono::{NaiveDateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

const ARCHIVE_SUFFIX: &str = ".sql.gz";

/// A database dump on the backup volume. Discovered by listing, never indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    pub filename: String,
    /// Time implied by the file name, when it carries one.
    pub timestamp: Option<NaiveDateTime>,
}

impl BackupArtifact {
    pub fn new(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let timestamp = implied_timestamp(&filename);
        Self {
            filename,
            timestamp,
        }
    }
}

/// Find `YYYYMMDD_HHMMSS`, `YYYYMMDD-HHMMSS` or `YYYYMMDDHHMMSS` inside a file name.
pub fn implied_timestamp(filename: &str) -> Option<NaiveDateTime> {
    let bytes = filename.as_bytes();
    let digits = |from: usize, len: usize| {
        bytes
            .get(from..from + len)
            .map_or(false, |s| s.iter().all(u8::is_ascii_digit))
    };

    for start in 0..bytes.len() {
        if !digits(start, 8) {
            continue;
        }

        let time_at = match bytes.get(start + 8) {
            Some(b'_') | Some(b'-') => start + 9,
            _ => start + 8,
        };
        if !digits(time_at, 6) {
            continue;
        }

        let stamp = format!(
            "{}{}",
            &filename[start..start + 8],
            &filename[time_at..time_at + 6]
        );
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&stamp, "%Y%m%d%H%M%S") {
            return Some(parsed);
        }
    }

    None
}

/// Archive names printed by the inspection pod, one per line. Other lines are ignored.
pub fn parse_listing(output: &str) -> Vec<BackupArtifact> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.ends_with(ARCHIVE_SUFFIX) && !line.contains('/'))
        .map(BackupArtifact::new)
        .collect()
}

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Unix timestamp for naming ephemeral objects, strictly increasing within the process.
pub fn next_stamp() -> i64 {
    let now = Utc::now().timestamp();
    let previous = LAST_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or_else(|last| last);
    now.max(previous + 1)
}

pub fn backup_job_name(cronjob: &str, stamp: i64) -> String {
    format!("{}-manual-{}", cronjob, stamp)
}

pub fn restore_job_name(stamp: i64) -> String {
    format!("postgresql-restore-{}", stamp)
}

pub fn inspection_pod_name(stamp: i64) -> String {
    format!("backup-list-{}", stamp)
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod artifact_tests;
