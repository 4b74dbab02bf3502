use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[cfg(test)]
use mock_instant::Instant;
#[cfg(not(test))]
use std::time::Instant;

use chrono::Local;
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use log::{debug, warn};

use crate::config::RendererConfig;
use crate::error::{Error, Result};
use crate::input::InputState;
use crate::log_buffer::{LogBuffer, LogEntry, Severity};
use crate::projects::ProjectTable;
use crate::sink::{self, FileSink, LogSink};
use crate::spinner::now_secs;

/// Entries formatted per trip to the log lock while draining.
const DRAIN_CHUNK: usize = 256;

/// Everything that touches the terminal. One render holds this for its whole
/// repaint so two renders can never interleave.
struct Output<W> {
    writer: W,
    sink: Option<Box<dyn LogSink>>,
    /// Height of the live region drawn by the last render.
    live_lines: usize,
}

/// Shared log/progress renderer. Wrap it in an `Arc` and hand it to every
/// thread that logs, tracks a project or asks for input.
///
/// Lock order: the output lock may be held while briefly taking the log,
/// project or input lock, never the other way round.
pub struct Renderer<W = Stdout> {
    pub(crate) config: RendererConfig,
    session: String,
    log: Mutex<LogBuffer>,
    projects: Mutex<ProjectTable>,
    pub(crate) input: Mutex<InputState>,
    pub(crate) input_ready: Condvar,
    output: Mutex<Output<W>>,
}

/// Guarded data is never left half-updated, so a panic elsewhere doesn't
/// make it unusable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Renderer<Stdout> {
    pub fn new(config: RendererConfig) -> Self {
        Self::with_writer(config, io::stdout())
    }
}

impl<W: Write + Send> Renderer<W> {
    /// Renders to `writer`. The session name is picked here, and in
    /// latest-log mode a [FileSink] for it is attached.
    pub fn with_writer(config: RendererConfig, writer: W) -> Self {
        let now = Local::now();
        let session = sink::session_name(
            &config.log_dir,
            config.latest_log,
            config.session_attempts,
            now,
        );
        let sink: Option<Box<dyn LogSink>> = if config.latest_log {
            Some(Box::new(FileSink::new(&config.log_dir, &session)))
        } else {
            None
        };
        debug!("starting log session {session}");

        let renderer = Self {
            config,
            session,
            log: Mutex::new(LogBuffer::new()),
            projects: Mutex::new(ProjectTable::new()),
            input: Mutex::new(InputState::default()),
            input_ready: Condvar::new(),
            output: Mutex::new(Output {
                writer,
                sink,
                live_lines: 0,
            }),
        };
        renderer.log(
            format!("-----START LOG FOR {}-----", now.format("%Y-%m-%d %H:%M")),
            Severity::Log,
            None,
        );
        renderer
    }

    /// Replaces the backing sink; rendered lines are appended to it from the
    /// next render on.
    pub fn with_sink(self, sink: impl LogSink + 'static) -> Self {
        lock(&self.output).sink = Some(Box::new(sink));
        self
    }

    pub fn without_sink(self) -> Self {
        lock(&self.output).sink = None;
        self
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn session_name(&self) -> &str {
        &self.session
    }

    /// Number of entries appended so far.
    pub fn len(&self) -> usize {
        lock(&self.log).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.log).is_empty()
    }

    /// Number of entries already written to the terminal (and sink).
    pub fn rendered_count(&self) -> usize {
        lock(&self.log).rendered()
    }

    /// Appends an entry. Errors and criticals are rendered before this
    /// returns; a failure to do so is logged rather than returned.
    pub fn log(&self, text: impl Into<String>, severity: Severity, thread: Option<&str>) {
        lock(&self.log).push(LogEntry::new(severity, thread, text));
        if severity.forces_render() {
            if let Err(err) = self.flush(true) {
                warn!("failed to render {severity} entry: {err}");
            }
        }
    }

    /// [Renderer::log] with the numeric priorities 0 (verbose) to 4
    /// (critical).
    pub fn log_priority(
        &self,
        text: impl Into<String>,
        priority: u8,
        thread: Option<&str>,
    ) -> Result<()> {
        let severity = Severity::try_from(priority)?;
        self.log(text, severity, thread);
        Ok(())
    }

    pub fn start_project(&self, name: &str, owner: Option<&str>) {
        lock(&self.projects).start(name, owner, Instant::now(), now_secs());
    }

    /// Marks the project as alive and, for a non-zero `percent`, records its
    /// progress. Call it from the work loop even without progress to keep the
    /// project from showing as stale.
    pub fn update_project(&self, name: &str, percent: Option<f64>) -> Result<()> {
        lock(&self.projects).update(name, percent, Instant::now(), now_secs())
    }

    pub fn close_project(&self, name: &str) -> Result<()> {
        lock(&self.projects).close(name)
    }

    pub fn project_count(&self) -> usize {
        lock(&self.projects).len()
    }

    /// Repaints the terminal: new log lines scroll out above the live region
    /// (projects and prompt), which is redrawn in place. Without `force` this
    /// does nothing unless there are unrendered entries.
    ///
    /// Lines that reached the terminal count as rendered and are persisted
    /// even when a later write fails. A sink failure is returned only after
    /// the terminal has been fully repainted.
    pub fn flush(&self, force: bool) -> Result<()> {
        let mut output = lock(&self.output);
        if !force && !lock(&self.log).has_pending() {
            return Ok(());
        }
        let Output {
            writer,
            sink,
            live_lines,
        } = &mut *output;

        if *live_lines > 0 {
            let up = u16::try_from(*live_lines).unwrap_or(u16::MAX);
            queue!(writer, MoveUp(up), MoveToColumn(0)).map_err(Error::Terminal)?;
            *live_lines = 0;
        }

        let (drained, written) = self.drain(writer);
        let persisted = match sink {
            Some(sink) if !drained.is_empty() => sink.append(&drained),
            _ => Ok(()),
        };
        written?;

        let now = Instant::now();
        let mut live: Vec<String> = lock(&self.projects)
            .iter()
            .map(|project| project.line(now, self.config.stale_after))
            .collect();
        live.extend(lock(&self.input).prompt_line(now_secs()));
        for line in &live {
            write_line(writer, line)?;
            *live_lines += 1;
        }
        queue!(writer, Clear(ClearType::FromCursorDown)).map_err(Error::Terminal)?;
        writer.flush().map_err(Error::Terminal)?;

        persisted
    }

    /// Writes unrendered entries until the buffer is empty or the drain
    /// budget is spent, formatting them a chunk at a time so appends are only
    /// ever blocked for one chunk. Returns the lines that made it out.
    fn drain(&self, writer: &mut W) -> (Vec<String>, Result<()>) {
        let format = self.config.timestamp_format();
        let started = Instant::now();
        let mut drained = Vec::new();
        loop {
            let chunk: Vec<String> = lock(&self.log)
                .pending()
                .iter()
                .take(DRAIN_CHUNK)
                .map(|e| e.line(format))
                .collect();
            if chunk.is_empty() {
                return (drained, Ok(()));
            }
            for line in chunk {
                if !drained.is_empty() && started.elapsed() >= self.config.drain_budget {
                    debug!("render budget spent after {} entries", drained.len());
                    return (drained, Ok(()));
                }
                if let Err(err) = write_line(writer, &line) {
                    return (drained, Err(err));
                }
                lock(&self.log).mark_rendered(1);
                drained.push(line);
            }
        }
    }

    /// Appends every entry so far to `dir/<name>`, defaulting the name to
    /// `log_<timestamp>.txt`. Independent of the render cursor.
    pub fn save_to_file(&self, dir: &Path, name_override: Option<&str>) -> Result<PathBuf> {
        let name = match name_override {
            Some(name) => name.to_owned(),
            None => format!("log_{}.txt", Local::now().format("%Y%m%d_%H%M%S")),
        };
        let path = dir.join(name);
        let lines: Vec<String> = {
            let format = self.config.timestamp_format();
            lock(&self.log).entries().iter().map(|e| e.line(format)).collect()
        };
        sink::append_lines(&path, lines.iter().map(String::as_str))?;
        Ok(path)
    }
}

fn write_line<W: Write>(writer: &mut W, line: &str) -> Result<()> {
    queue!(
        writer,
        Clear(ClearType::UntilNewLine),
        Print(line),
        Print("\r\n")
    )
    .map_err(Error::Terminal)
}

#[cfg(test)]
impl Renderer<Vec<u8>> {
    /// Everything written since the last call.
    pub(crate) fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut lock(&self.output).writer)
    }
}
