//! RC-007: Append-only JSONL session journal.
//!
//! One file per recipe: `<journal_dir>/<recipe_id>/events.jsonl`. Lines are
//! never rewritten; the journal is diagnostic and is never replayed into a
//! session.

use crate::core::types::{SessionEvent, TimestampedEvent};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Generate an ISO 8601 UTC timestamp.
pub fn now_iso8601() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format_iso8601(secs)
}

/// Format seconds since the Unix epoch as `YYYY-MM-DDTHH:MM:SSZ`.
fn format_iso8601(secs: u64) -> String {
    let days = secs / 86400;
    let time_secs = secs % 86400;
    let (hours, minutes, seconds) = (time_secs / 3600, (time_secs % 3600) / 60, time_secs % 60);

    let mut y = 1970i64;
    let mut remaining = days as i64;
    loop {
        let year_days = if is_leap(y) { 366 } else { 365 };
        if remaining < year_days {
            break;
        }
        remaining -= year_days;
        y += 1;
    }
    let feb = if is_leap(y) { 29 } else { 28 };
    let month_days = [31, feb, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut m = 12;
    for (i, &md) in month_days.iter().enumerate() {
        if remaining < md {
            m = i + 1;
            break;
        }
        remaining -= md;
    }

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        y,
        m,
        remaining + 1,
        hours,
        minutes,
        seconds
    )
}

fn is_leap(y: i64) -> bool {
    (y % 4 == 0 && y % 100 != 0) || y % 400 == 0
}

/// Generate a session ID.
pub fn generate_session_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("s-{:012x}", nanos & 0xFFFF_FFFF_FFFF)
}

/// Derive the journal path for a recipe.
pub fn event_log_path(journal_dir: &Path, recipe_id: &str) -> PathBuf {
    journal_dir.join(sanitize(recipe_id)).join("events.jsonl")
}

/// Recipe ids come from the catalog; keep them to a single path component.
/// An id that sanitizes to nothing maps to `_`.
fn sanitize(recipe_id: &str) -> String {
    let cleaned: String = recipe_id
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Append an event to the recipe's journal.
pub fn append_event(journal_dir: &Path, recipe_id: &str, event: SessionEvent) -> Result<(), String> {
    let path = event_log_path(journal_dir, recipe_id);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create journal dir: {}", e))?;
    }

    let te = TimestampedEvent {
        ts: now_iso8601(),
        event,
    };
    let json = serde_json::to_string(&te).map_err(|e| format!("JSON serialize error: {}", e))?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("cannot open journal {}: {}", path.display(), e))?;

    writeln!(file, "{}", json).map_err(|e| format!("write error: {}", e))?;

    Ok(())
}

/// Read every event of a recipe's journal. A missing journal is empty.
pub fn read_events(journal_dir: &Path, recipe_id: &str) -> Result<Vec<TimestampedEvent>, String> {
    let path = event_log_path(journal_dir, recipe_id);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read journal {}: {}", path.display(), e))?;
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .enumerate()
        .map(|(n, line)| {
            serde_json::from_str(line)
                .map_err(|e| format!("{}:{}: invalid event: {}", path.display(), n + 1, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rc007_now_iso8601() {
        let ts = now_iso8601();
        assert!(ts.starts_with("20"));
        assert!(ts.ends_with('Z'));
        assert!(ts.contains('T'));
    }

    #[test]
    fn test_rc007_format_known_instants() {
        assert_eq!(format_iso8601(0), "1970-01-01T00:00:00Z");
        // 2024-02-29T12:34:56Z
        assert_eq!(format_iso8601(1_709_210_096), "2024-02-29T12:34:56Z");
        // 2023-12-31T23:59:59Z
        assert_eq!(format_iso8601(1_704_067_199), "2023-12-31T23:59:59Z");
    }

    #[test]
    fn test_rc007_is_leap() {
        assert!(is_leap(2000));
        assert!(!is_leap(1900));
        assert!(is_leap(2024));
        assert!(!is_leap(2026));
    }

    #[test]
    fn test_rc007_generate_session_id() {
        let id = generate_session_id();
        assert!(id.starts_with("s-"));
        assert_eq!(id.len(), 14);
    }

    #[test]
    fn test_rc007_event_log_path() {
        let p = event_log_path(Path::new("/journal"), "sable-breton");
        assert_eq!(p, PathBuf::from("/journal/sable-breton/events.jsonl"));
    }

    #[test]
    fn test_rc007_event_log_path_sanitized() {
        let p = event_log_path(Path::new("/journal"), "../etc/passwd");
        assert_eq!(p, PathBuf::from("/journal/_etc_passwd/events.jsonl"));
    }

    #[test]
    fn test_rc007_event_log_path_dot_ids() {
        for id in ["", ".", "..", "..."] {
            let p = event_log_path(Path::new("/journal"), id);
            assert_eq!(p, PathBuf::from("/journal/_/events.jsonl"), "id {:?}", id);
        }
    }

    #[test]
    fn test_rc007_append_and_read() {
        let dir = tempfile::tempdir().unwrap();
        append_event(
            dir.path(),
            "tarte",
            SessionEvent::SessionStarted {
                recipe: "tarte".to_string(),
                session_id: "s-abc".to_string(),
                recipe_hash: "blake3:000".to_string(),
                step_count: 3,
            },
        )
        .unwrap();
        append_event(dir.path(), "tarte", SessionEvent::StepAdvanced { from: 0, to: 1 }).unwrap();

        let content = std::fs::read_to_string(dir.path().join("tarte/events.jsonl")).unwrap();
        assert!(content.contains("session_started"));
        assert!(content.contains("s-abc"));

        let events = read_events(dir.path(), "tarte").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event, SessionEvent::StepAdvanced { from: 0, to: 1 });
    }

    #[test]
    fn test_rc007_read_missing_journal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_events(dir.path(), "ghost").unwrap().is_empty());
    }

    #[test]
    fn test_rc007_read_corrupt_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = event_log_path(dir.path(), "r");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{\"ts\":\"x\",\"event\":\"timer_reset\",\"step\":0}\nnot json\n")
            .unwrap();
        let err = read_events(dir.path(), "r").unwrap_err();
        assert!(err.contains(":2: invalid event"));
    }
}
