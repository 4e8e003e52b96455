// src/utils/logbook.rs
//! Append-only JSONL trail of committed admin actions.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

#[derive(Serialize)]
struct LogLine<'a> {
    ts: String,
    action: &'a str,
    mirror: &'a str,
    data: Value,
}

#[derive(Debug, Clone)]
pub struct Logbook {
    path: Option<PathBuf>,
}

impl Logbook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A logbook that records nothing.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record an action. Failures are logged and otherwise ignored: the store
    /// commit already happened and is the source of truth.
    pub fn record(&self, action: &str, mirror: &str, data: Value) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = append_line(path, action, mirror, data) {
            tracing::warn!(path = %path.display(), "logbook append failed: {e:#}");
        }
    }
}

fn append_line(path: &Path, action: &str, mirror: &str, data: Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("mkdir -p {parent:?}"))?;
    }
    let line = LogLine {
        ts: Utc::now().to_rfc3339(),
        action,
        mirror,
        data,
    };
    let json = serde_json::to_string(&line)?;
    let mut f = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open logbook {path:?}"))?;
    writeln!(f, "{}", json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn appends_one_line_per_action() {
        let dir = tempfile::tempdir().unwrap();
        let book = Logbook::new(dir.path().join("logbook").join("admin.jsonl"));
        book.record("add", "m1", json!({"http": "http://m1"}));
        book.record("enable", "m1", Value::Null);

        let text = fs::read_to_string(book.path().unwrap()).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["action"], "add");
        assert_eq!(lines[0]["data"]["http"], "http://m1");
        assert_eq!(lines[1]["mirror"], "m1");
    }

    #[test]
    fn disabled_logbook_writes_nothing() {
        let book = Logbook::disabled();
        book.record("add", "m1", Value::Null);
        assert!(book.path().is_none());
    }
}
