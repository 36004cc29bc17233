//! Upload progress reporting.
//!
//! Reports per-file progress during `fehres upload` and `fehres
//! prescription` so users see how much of each file has been sent and
//! which uploads failed. Progress is emitted on **stderr** so stdout
//! remains parseable for scripts.

use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::client::{ProgressCallback, UploadProgress};

/// A single progress event for one file.
#[derive(Clone, Debug)]
pub enum UploadProgressEvent {
    /// Bytes handed to the connection so far.
    Sending { file: String, sent: u64, total: u64 },
    /// The backend accepted the file.
    Uploaded { file: String, file_id: String },
    /// The upload failed; the file is left in the error state.
    Failed { file: String, error: String },
}

/// Reports upload progress. Implementations write to stderr (human or JSON).
pub trait UploadProgressReporter: Send + Sync {
    fn report(&self, event: UploadProgressEvent);
}

/// Human-friendly progress on stderr: "upload notes.pdf  128.0 KB / 1.2 MB  (10%)".
pub struct StderrProgress;

impl UploadProgressReporter for StderrProgress {
    fn report(&self, event: UploadProgressEvent) {
        let line = match &event {
            UploadProgressEvent::Sending { file, sent, total } => {
                let pct = UploadProgress {
                    sent: *sent,
                    total: *total,
                }
                .percent();
                format!(
                    "upload {}  {} / {}  ({}%)\n",
                    file,
                    format_bytes(*sent),
                    format_bytes(*total),
                    pct
                )
            }
            UploadProgressEvent::Uploaded { file, file_id } => {
                format!("upload {}  done  (file id {})\n", file, file_id)
            }
            UploadProgressEvent::Failed { file, error } => {
                format!("upload {}  failed: {}\n", file, error)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl UploadProgressReporter for JsonProgress {
    fn report(&self, event: UploadProgressEvent) {
        let obj = match &event {
            UploadProgressEvent::Sending { file, sent, total } => serde_json::json!({
                "event": "progress",
                "file": file,
                "status": "uploading",
                "sent": sent,
                "total": total
            }),
            UploadProgressEvent::Uploaded { file, file_id } => serde_json::json!({
                "event": "progress",
                "file": file,
                "status": "uploaded",
                "file_id": file_id
            }),
            UploadProgressEvent::Failed { file, error } => serde_json::json!({
                "event": "progress",
                "file": file,
                "status": "error",
                "error": error
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl UploadProgressReporter for NoProgress {
    fn report(&self, _event: UploadProgressEvent) {}
}

/// Adapt a reporter into a transport [`ProgressCallback`] for one file.
///
/// Only whole-percent changes are forwarded, so large files do not flood
/// stderr.
pub fn callback_for(reporter: Arc<dyn UploadProgressReporter>, file: &str) -> ProgressCallback {
    let file = file.to_string();
    let last = AtomicU8::new(u8::MAX);
    Arc::new(move |progress: UploadProgress| {
        let pct = progress.percent();
        if last.swap(pct, Ordering::Relaxed) != pct {
            reporter.report(UploadProgressEvent::Sending {
                file: file.clone(),
                sent: progress.sent,
                total: progress.total,
            });
        }
    })
}

pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Format a byte count as a human-readable string.
pub(crate) fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Arc<dyn UploadProgressReporter> {
        match self {
            ProgressMode::Off => Arc::new(NoProgress),
            ProgressMode::Human => Arc::new(StderrProgress),
            ProgressMode::Json => Arc::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<UploadProgressEvent>>);

    impl UploadProgressReporter for Recording {
        fn report(&self, event: UploadProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn callback_forwards_only_percent_changes() {
        let recording = Arc::new(Recording::default());
        let callback = callback_for(recording.clone(), "a.pdf");
        for sent in [0u64, 1, 2, 500, 501, 1000] {
            callback(UploadProgress { sent, total: 1000 });
        }
        let events = recording.0.lock().unwrap();
        // 0%, 50%, 100%
        assert_eq!(events.len(), 3);
        match &events[2] {
            UploadProgressEvent::Sending { file, sent, total } => {
                assert_eq!(file, "a.pdf");
                assert_eq!((*sent, *total), (1000, 1000));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
