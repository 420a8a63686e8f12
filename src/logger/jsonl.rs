//! JSONL activity log: one self-contained JSON object per line.
//!
//! Lines are assembled in memory and written with a single `write_all`, so
//! a reader tailing the file never sees a partial line. Writes degrade
//! through primary path, fallback path, stderr (`[AVB-JSONL]` prefix) and
//! finally silent discard; a widget must never fail because logging did.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::LoggingConfig;
use crate::core::errors::{AvatarError, Result};
use crate::resolver::DisplayResult;

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Events emitted over a widget's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A name or custom text produced badge text.
    Resolved,
    /// No name: the silhouette is shown.
    PlaceholderShown,
    /// Empty name: the body icon is shown.
    EmptyName,
    InvalidGender,
    ImageLoadFailed,
    ConfigLoaded,
    Error,
}

/// A single JSONL log entry; only `ts`, `event` and `severity` are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_code: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// Selected view kind (`image`, `initials`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    #[must_use]
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            text: None,
            color_code: None,
            font_size: None,
            view: None,
            img_src: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }

    /// Entry describing a successful resolution.
    #[must_use]
    pub fn for_result(result: &DisplayResult) -> Self {
        let event = if result.show_placeholder {
            EventType::PlaceholderShown
        } else if result.is_empty {
            EventType::EmptyName
        } else {
            EventType::Resolved
        };
        let mut entry = Self::new(event, Severity::Info);
        if event == EventType::Resolved {
            entry.text = Some(result.text.clone());
            entry.color_code = Some(result.color_code.value());
        }
        entry.font_size = Some(result.font_size);
        entry
    }

    /// Entry describing a failed resolution.
    #[must_use]
    pub fn for_error(error: &AvatarError) -> Self {
        let event = match error {
            AvatarError::InvalidGender { .. } => EventType::InvalidGender,
            _ => EventType::Error,
        };
        let mut entry = Self::new(event, Severity::Error);
        entry.error_code = Some(error.code().to_string());
        entry.error_message = Some(error.to_string());
        entry
    }

    #[must_use]
    pub fn with_view(mut self, view: &str) -> Self {
        self.view = Some(view.to_string());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Degradation state of the JSONL writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Writing to primary path.
    Normal,
    /// Primary failed, writing to fallback path.
    Fallback,
    /// Both files failed, writing to stderr.
    Stderr,
    /// Everything failed, silently discarding.
    Discard,
}

impl WriterState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Fallback => "fallback",
            Self::Stderr => "stderr",
            Self::Discard => "discard",
        }
    }
}

/// Configuration for the JSONL writer.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    /// Rotate before a write would push the file past this size.
    pub max_size_bytes: u64,
    /// Rotated generations kept as `<path>.1` .. `<path>.N`.
    pub max_rotated_files: u32,
}

impl From<&LoggingConfig> for JsonlConfig {
    fn from(cfg: &LoggingConfig) -> Self {
        Self {
            path: cfg.jsonl_log.clone(),
            fallback_path: cfg.fallback_path.clone(),
            max_size_bytes: cfg.max_size_bytes,
            max_rotated_files: cfg.max_rotated_files,
        }
    }
}

/// Append-only JSONL writer with size rotation and fallback chain.
pub struct JsonlWriter {
    config: JsonlConfig,
    writer: Option<LineWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl std::fmt::Debug for JsonlWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlWriter")
            .field("path", &self.config.path)
            .field("state", &self.state)
            .field("bytes_written", &self.bytes_written)
            .finish_non_exhaustive()
    }
}

impl JsonlWriter {
    /// Open the log. Falls through the degradation chain on failure.
    #[must_use]
    pub fn open(config: JsonlConfig) -> Self {
        let mut w = Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        w.open_primary();
        w
    }

    /// Write one entry as one line.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        match serde_json::to_string(entry) {
            Ok(json) => self.write_line(&format!("{json}\n")),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[AVB-JSONL] serialize error: {e}");
            }
        }
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    #[must_use]
    pub const fn state(&self) -> WriterState {
        self.state
    }

    /// Bytes in the current file.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn write_line(&mut self, line: &str) {
        let len = line.len() as u64;
        if self.bytes_written > 0
            && self.bytes_written + len > self.config.max_size_bytes
            && matches!(self.state, WriterState::Normal | WriterState::Fallback)
        {
            self.rotate();
        }

        match self.state {
            WriterState::Normal | WriterState::Fallback => {
                let Some(w) = self.writer.as_mut() else {
                    self.degrade();
                    self.write_line(line);
                    return;
                };
                if w.write_all(line.as_bytes()).is_err() {
                    self.degrade();
                    self.write_line(line);
                    return;
                }
                self.bytes_written += len;
            }
            WriterState::Stderr => {
                let _ = write!(io::stderr(), "[AVB-JSONL] {line}");
            }
            WriterState::Discard => {}
        }
    }

    fn open_primary(&mut self) {
        match open_append(&self.config.path) {
            Ok((file, size)) => self.attach(file, size, WriterState::Normal),
            Err(_) => self.open_fallback(),
        }
    }

    fn open_fallback(&mut self) {
        let Some(fallback) = self.config.fallback_path.clone() else {
            self.state = WriterState::Stderr;
            let _ = writeln!(
                io::stderr(),
                "[AVB-JSONL] primary path failed and no fallback configured, using stderr"
            );
            return;
        };
        match open_append(&fallback) {
            Ok((file, size)) => {
                let _ = writeln!(
                    io::stderr(),
                    "[AVB-JSONL] primary path failed, using fallback: {}",
                    fallback.display()
                );
                self.attach(file, size, WriterState::Fallback);
            }
            Err(_) => {
                self.state = WriterState::Stderr;
                let _ = writeln!(
                    io::stderr(),
                    "[AVB-JSONL] both primary and fallback paths failed, using stderr"
                );
            }
        }
    }

    fn attach(&mut self, file: File, size: u64, state: WriterState) {
        self.writer = Some(LineWriter::new(file));
        self.state = state;
        self.bytes_written = size;
    }

    fn degrade(&mut self) {
        self.writer = None;
        match self.state {
            WriterState::Normal => self.open_fallback(),
            WriterState::Fallback => {
                self.state = WriterState::Stderr;
                let _ = writeln!(io::stderr(), "[AVB-JSONL] fallback write failed, using stderr");
            }
            WriterState::Stderr | WriterState::Discard => self.state = WriterState::Discard,
        }
    }

    fn current_path(&self) -> Option<PathBuf> {
        match self.state {
            WriterState::Normal => Some(self.config.path.clone()),
            WriterState::Fallback => self.config.fallback_path.clone(),
            WriterState::Stderr | WriterState::Discard => None,
        }
    }

    fn rotate(&mut self) {
        self.flush();
        self.writer = None;
        let Some(base) = self.current_path() else {
            return;
        };

        // .N is dropped, .N-1 -> .N, ..., current -> .1
        let max = self.config.max_rotated_files;
        let _ = fs::remove_file(rotated_name(&base, max));
        for i in (1..max).rev() {
            let _ = rename(rotated_name(&base, i), rotated_name(&base, i + 1));
        }
        let _ = rename(&base, rotated_name(&base, 1));

        let state = self.state;
        match open_append(&base) {
            Ok((file, _)) => self.attach(file, 0, state),
            Err(_) => self.degrade(),
        }
    }
}

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| AvatarError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| AvatarError::io(path, source))?;
    let size = file.metadata().map_or(0, |m| m.len());
    Ok((file, size))
}

/// `foo.jsonl` -> `foo.jsonl.3`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
