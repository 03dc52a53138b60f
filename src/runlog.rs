use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::data_dir;
use crate::sync::SyncEvent;

/// One line of the activity log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    pub event: serde_json::Value,
}

pub fn log_path() -> PathBuf {
    data_dir().join("sync-activity.jsonl")
}

pub fn new_entry(team: Option<&str>, event: &SyncEvent) -> Result<LogEntry> {
    Ok(LogEntry {
        timestamp: chrono::Utc::now().to_rfc3339(),
        team: team.map(String::from),
        event: serde_json::to_value(event)?,
    })
}

pub fn append_entry(path: &Path, entry: &LogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let line = serde_json::to_string(entry)?;
    writeln!(file, "{line}")?;
    Ok(())
}

/// Last `limit` entries; unreadable files and malformed lines are skipped.
pub fn read_entries(path: &Path, limit: Option<usize>) -> Vec<LogEntry> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    let mut entries: Vec<LogEntry> = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();

    if let Some(limit) = limit {
        let len = entries.len();
        if len > limit {
            entries = entries.split_off(len - limit);
        }
    }

    entries
}

/// Human readable single-line rendering used by `tasksync log`.
pub fn describe(entry: &LogEntry) -> String {
    let kind = entry
        .event
        .get("event")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    let detail = ["title", "name", "message"]
        .iter()
        .find_map(|k| entry.event.get(*k).and_then(|v| v.as_str()))
        .or_else(|| {
            entry
                .event
                .get("issue")
                .and_then(|i| i.get("url"))
                .and_then(|v| v.as_str())
        })
        .unwrap_or("");
    format!("{}  {kind:<20} {detail}", entry.timestamp)
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tracker::IssueRef;

    fn created(n: usize) -> SyncEvent {
        SyncEvent::IssueCreated {
            index: n,
            issue: IssueRef {
                id: format!("i{n}"),
                title: format!("Task {n}"),
                url: format!("https://linear.app/x/issue/ENG-{n}"),
            },
        }
    }

    #[test]
    fn append_then_read_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("log.jsonl");
        for n in 1..=3 {
            append_entry(&path, &new_entry(Some("ENG"), &created(n)).unwrap()).unwrap();
        }

        let entries = read_entries(&path, None);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].team.as_deref(), Some("ENG"));
        assert_eq!(entries[2].event["issue"]["id"], "i3");
    }

    #[test]
    fn limit_returns_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        for n in 1..=5 {
            append_entry(&path, &new_entry(None, &created(n)).unwrap()).unwrap();
        }

        let entries = read_entries(&path, Some(2));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event["index"], 4);
        assert_eq!(entries[1].event["index"], 5);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        append_entry(&path, &new_entry(None, &created(1)).unwrap()).unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .and_then(|mut f| writeln!(f, "{{not json\n"))
            .unwrap();

        assert_eq!(read_entries(&path, None).len(), 1);
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_entries(&dir.path().join("absent.jsonl"), Some(10)).is_empty());
    }

    #[test]
    fn describe_prefers_title_then_url() {
        let entry = new_entry(
            None,
            &SyncEvent::ProjectFailed {
                name: "Web".into(),
                message: "denied".into(),
            },
        )
        .unwrap();
        assert!(describe(&entry).ends_with("project_failed       Web"));

        let entry = new_entry(None, &created(7)).unwrap();
        assert!(describe(&entry).ends_with("https://linear.app/x/issue/ENG-7"));
    }
}
