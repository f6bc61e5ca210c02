//! Session transcript file.
//!
//! The transcript reads like a terminal capture: prompt, echoed command,
//! device output, next prompt. Runbook annotations (Print, Pause, Sleep)
//! appear as `#` comment lines.

use crate::error::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Open transcript destination.
#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl LogSink {
    /// Create (or truncate) the transcript at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append text exactly as given.
    pub fn write(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Append a prompt on a fresh line, followed by the space a typed
    /// command would follow.
    pub fn write_prompt(&mut self, prompt: &str) -> Result<()> {
        self.write(&format!("\n{} ", prompt))
    }

    /// Append a `# ` comment line.
    pub fn write_comment(&mut self, text: &str) -> Result<()> {
        self.write(&format!("# {}\n", text))
    }

    /// Flush buffered output to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and close the file.
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        tracing::debug!(path = %self.path.display(), "transcript closed");
        Ok(())
    }
}
