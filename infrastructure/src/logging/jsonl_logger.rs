//! JSONL file writer for transcript events.
//!
//! Each [`ConversationEvent`] becomes one JSON line: the payload's fields plus
//! `type`, a running `seq` number and an RFC 3339 `timestamp`.

use serde_json::{Value, json};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tavern_application::{ConversationEvent, ConversationLogger};
use tracing::warn;

/// Append-only JSONL transcript.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Every line is flushed as it is
/// written, so a crashed session still leaves a readable transcript.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    seq: AtomicU64,
}

impl JsonlConversationLogger {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
            seq: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(&self, event: ConversationEvent) -> Value {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        match event.payload {
            Value::Object(mut map) => {
                map.insert("type".to_string(), Value::from(event.event_type));
                map.insert("seq".to_string(), Value::from(seq));
                map.insert("timestamp".to_string(), Value::from(timestamp));
                Value::Object(map)
            }
            other => json!({
                "type": event.event_type,
                "seq": seq,
                "timestamp": timestamp,
                "data": other,
            }),
        }
    }
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let record = self.record(event);
        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
            warn!(path = %self.path.display(), error = %e, "Could not write transcript");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_record_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions").join("crypt.jsonl");
        let logger = JsonlConversationLogger::create(&path).unwrap();

        logger.log(ConversationEvent::new(
            "utterance",
            json!({"round": 1, "speaker": "Dungeon Master", "text": "The door creaks."}),
        ));
        logger.log(ConversationEvent::new(
            "resolution",
            json!({"character": "Eldara", "roll": 50, "threshold": 60, "success": true}),
        ));

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["type"], "utterance");
        assert_eq!(records[0]["speaker"], "Dungeon Master");
        assert_eq!(records[0]["seq"], 0);
        assert_eq!(records[1]["type"], "resolution");
        assert_eq!(records[1]["success"], true);
        assert_eq!(records[1]["seq"], 1);
        assert!(
            chrono::DateTime::parse_from_rfc3339(records[1]["timestamp"].as_str().unwrap()).is_ok()
        );
    }

    #[test]
    fn test_non_object_payload_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.jsonl");
        let logger = JsonlConversationLogger::create(&path).unwrap();

        logger.log(ConversationEvent::new("round_summary", json!("Round 1: quiet.")));

        let records = read_lines(&path);
        assert_eq!(records[0]["type"], "round_summary");
        assert_eq!(records[0]["data"], "Round 1: quiet.");
    }

    #[test]
    fn test_reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.jsonl");
        for _ in 0..2 {
            let logger = JsonlConversationLogger::create(&path).unwrap();
            logger.log(ConversationEvent::new("turn_failed", json!({"character": "Brussae"})));
        }
        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn test_directory_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JsonlConversationLogger::create(dir.path()).is_err());
    }
}
