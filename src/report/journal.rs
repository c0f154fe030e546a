//! Durable integrity journal
//!
//! - Append-only file, one JSON record per line
//! - Flushed and fsynced after each record
//! - Every record carries the monitor session id, so runs can be told
//!   apart in a shared journal

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ReportEvent, ReportSink};

/// File-backed journal sink.
pub struct JournalSink {
    path: PathBuf,
    session: Uuid,
    writer: Mutex<BufWriter<File>>,
}

impl JournalSink {
    /// Open or create a journal file for appending.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            session: Uuid::new_v4(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Journal file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Session id stamped on every record
    pub fn session(&self) -> Uuid {
        self.session
    }

    fn record(&self, event: &ReportEvent) -> Value {
        let mut record = json!({
            "ts": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "session": self.session.to_string(),
            "event": event.as_str(),
        });

        match event {
            ReportEvent::Baseline {
                path,
                algorithm,
                checksum,
            } => {
                record["path"] = json!(path.display().to_string());
                record["algorithm"] = json!(algorithm);
                record["checksum"] = json!(checksum);
            }
            ReportEvent::AllClear => {}
            ReportEvent::Changed { path } => {
                record["path"] = json!(path.display().to_string());
            }
            ReportEvent::Unreadable { path, reason } => {
                record["path"] = json!(path.display().to_string());
                record["reason"] = json!(reason);
            }
            ReportEvent::Fatal { reason } => {
                record["reason"] = json!(reason);
            }
        }

        record
    }
}

impl ReportSink for JournalSink {
    fn name(&self) -> &'static str {
        "journal"
    }

    fn emit(&self, event: &ReportEvent) -> io::Result<()> {
        let line = serde_json::to_string(&self.record(event))?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        writer.get_ref().sync_all()
    }

    fn flush(&self) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.flush()?;
        writer.get_ref().sync_all()
    }
}
