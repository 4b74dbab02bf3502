use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{Error, Result};

/// Somewhere rendered log lines are appended to as they reach the terminal.
pub trait LogSink: Send {
    fn append(&mut self, lines: &[String]) -> Result<()>;
}

/// Appends to `<dir>/<session>_latest.log`, creating the directory on demand.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(dir: &Path, session: &str) -> Self {
        Self {
            path: latest_log_path(dir, session),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn append(&mut self, lines: &[String]) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        append_lines(&self.path, lines.iter().map(String::as_str))
    }
}

pub(crate) fn append_lines<'a>(path: &Path, lines: impl Iterator<Item = &'a str>) -> Result<()> {
    let persist_err = |source| Error::Persist {
        path: path.to_owned(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(persist_err)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(persist_err)?;
    let mut text = String::new();
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }
    file.write_all(text.as_bytes()).map_err(persist_err)
}

fn latest_log_path(dir: &Path, session: &str) -> PathBuf {
    dir.join(format!("{session}_latest.log"))
}

/// Picks the session name once at startup. In latest-log mode this is the
/// first free `<date>-<n>` in `dir`; otherwise (or if every suffix is taken)
/// a second-resolution timestamp.
pub fn session_name(dir: &Path, latest_log: bool, attempts: u32, now: DateTime<Local>) -> String {
    if latest_log {
        let day = now.format("%Y-%m-%d");
        let free = (1..attempts)
            .map(|i| format!("{day}-{i}"))
            .find(|name| !latest_log_path(dir, name).exists());
        if let Some(name) = free {
            return name;
        }
        log::warn!(
            "all {attempts} session names for {day} are taken in {}",
            dir.display()
        );
    }
    now.format("%Y-%m-%d_%H-%M-%S").to_string()
}

#[cfg(test)]
mod test {
    use std::fs;

    use chrono::{Local, TimeZone};

    use super::{session_name, FileSink, LogSink};
    use crate::error::Error;

    #[test]
    fn session_name_skips_taken_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(session_name(dir.path(), true, 1000, now), "2024-03-09-1");

        fs::write(dir.path().join("2024-03-09-1_latest.log"), "").unwrap();
        fs::write(dir.path().join("2024-03-09-2_latest.log"), "").unwrap();
        assert_eq!(session_name(dir.path(), true, 1000, now), "2024-03-09-3");
    }

    #[test]
    fn session_name_falls_back_to_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            session_name(dir.path(), false, 1000, now),
            "2024-03-09_14-05-07"
        );

        fs::write(dir.path().join("2024-03-09-1_latest.log"), "").unwrap();
        assert_eq!(
            session_name(dir.path(), true, 2, now),
            "2024-03-09_14-05-07"
        );
    }

    #[test]
    fn file_sink_appends_and_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(&dir.path().join("nested"), "s");
        sink.append(&["one".to_owned()]).unwrap();
        sink.append(&[]).unwrap();
        sink.append(&["two".to_owned(), "three".to_owned()]).unwrap();
        assert_eq!(
            fs::read_to_string(sink.path()).unwrap(),
            "one\ntwo\nthree\n"
        );
    }

    #[test]
    fn file_sink_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let mut sink = FileSink::new(&blocker, "s");
        let err = sink.append(&["x".to_owned()]).unwrap_err();
        assert!(matches!(err, Error::Persist { ref path, .. } if path == sink.path()));
    }
}
