use std::fmt;

use chrono::{DateTime, Local};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Verbose,
    Log,
    Warn,
    Error,
    Critical,
}

const SEVERITIES: [Severity; 5] = [
    Severity::Verbose,
    Severity::Log,
    Severity::Warn,
    Severity::Error,
    Severity::Critical,
];

impl Severity {
    pub fn name(self) -> &'static str {
        match self {
            Severity::Verbose => "VERBOSE",
            Severity::Log => "LOG",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Entries at this level are pushed to the terminal as soon as they are
    /// appended instead of waiting for the next scheduled flush.
    pub fn forces_render(self) -> bool {
        matches!(self, Severity::Error | Severity::Critical)
    }
}

impl TryFrom<u8> for Severity {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self> {
        SEVERITIES
            .get(usize::from(index))
            .copied()
            .ok_or(Error::InvalidSeverity(index))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: Severity,
    pub timestamp: DateTime<Local>,
    pub thread: Option<String>,
    pub text: String,
}

impl LogEntry {
    pub fn new(severity: Severity, thread: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            severity,
            timestamp: Local::now(),
            thread: thread.map(str::to_owned),
            text: text.into(),
        }
    }

    /// `[SEVERITY-<time>] [thread]: text`, with `time_format` a chrono format.
    pub fn line(&self, time_format: &str) -> String {
        let thread = match &self.thread {
            Some(thread) => format!(" [{thread}]"),
            None => String::new(),
        };
        format!(
            "[{}-{}]{}: {}",
            self.severity,
            self.timestamp.format(time_format),
            thread,
            self.text
        )
    }
}

/// Append-only list of entries plus the count already written out.
#[derive(Debug, Default)]
pub struct LogBuffer {
    entries: Vec<LogEntry>,
    rendered: usize,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rendered(&self) -> usize {
        self.rendered
    }

    pub fn has_pending(&self) -> bool {
        self.rendered < self.entries.len()
    }

    pub fn pending(&self) -> &[LogEntry] {
        &self.entries[self.rendered..]
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Moves the render cursor forward by `count`, never past the end.
    pub fn mark_rendered(&mut self, count: usize) {
        self.rendered = (self.rendered + count).min(self.entries.len());
    }
}
