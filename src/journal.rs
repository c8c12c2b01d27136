//! Append-only journal file
//!
//! One timestamped line per entry, `YYYY-MM-DD HH:MM:SS - LEVEL - message`,
//! mirrored to the console through tracing. The file is never rotated or
//! truncated; failures to write are reported on the console and otherwise
//! swallowed so the watch loop never dies over its own logging.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

pub struct Journal {
    file: File,
}

impl Journal {
    /// Open (creating if needed) the journal file in append mode.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    pub fn info(&mut self, message: &str) {
        tracing::info!("{message}");
        self.write_line("INFO", message);
    }

    pub fn warn(&mut self, message: &str) {
        tracing::warn!("{message}");
        self.write_line("WARNING", message);
    }

    pub fn error(&mut self, message: &str) {
        tracing::error!("{message}");
        self.write_line("ERROR", message);
    }

    fn write_line(&mut self, level: &str, message: &str) {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        if let Err(err) = writeln!(self.file, "{stamp} - {level} - {message}") {
            tracing::warn!("failed to append to journal: {err}");
        }
    }
}
