//! Diagnostic sink for failed storage operations.
//!
//! The repository appends one line per failure. Appending never fails from
//! the caller's point of view: write errors are dropped.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Append-only destination for diagnostic messages.
pub trait DiagnosticSink: Send + Sync {
    fn append(&self, message: &str);
}

/// Appends messages to a text file, one per line.
///
/// The file handle is opened once and released when the log is dropped.
pub struct FileDiagnosticLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileDiagnosticLog {
    /// Open (or create) the log file in append mode.
    ///
    /// If the file cannot be opened the log is still returned and
    /// silently discards messages.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Some(file),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Diagnostic log unavailable");
                None
            }
        };
        Self {
            path,
            file: Mutex::new(file),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DiagnosticSink for FileDiagnosticLog {
    fn append(&self, message: &str) {
        let Ok(mut guard) = self.file.lock() else {
            return;
        };
        if let Some(file) = guard.as_mut() {
            let _ = writeln!(file, "{message}");
        }
    }
}

/// Forwards messages to `tracing` at WARN level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn append(&self, message: &str) {
        tracing::warn!(target: "clinic_core::diagnostics", "{message}");
    }
}

/// Keeps messages in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.messages
            .lock()
            .map(|messages| messages.is_empty())
            .unwrap_or(true)
    }
}

impl DiagnosticSink for MemorySink {
    fn append(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
