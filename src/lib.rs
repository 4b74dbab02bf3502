/*
Many threads log and report progress, one terminal shows it all.

Screen layout:
    committed log lines (ordinary scrollback, never touched again)
    one line per live project
    the input prompt, while someone is waiting on a line

Render:
    move up over the live region drawn last time
    write unrendered log lines, each clearing whatever was there
    append those same lines to the session file
    redraw projects and prompt
    clear below, in case the live region shrank

Locks:
    log buffer, project table and input each have their own
    output lock covers a whole render; taken first, never while holding another

Keyboard input comes in through KeySource, the core never reads the tty.
*/
pub mod ansi;
mod config;
mod error;
mod input;
pub mod keys;
mod log_buffer;
mod projects;
mod scheduler;
mod sink;
pub mod spinner;
mod state;

pub use config::RendererConfig;
pub use error::{Error, Result};
pub use input::{CancelToken, KeyEvent};
pub use log_buffer::{LogBuffer, LogEntry, Severity};
pub use projects::{Project, ProjectTable};
pub use scheduler::{spawn_flush_task, FlushScheduler};
pub use sink::{session_name, FileSink, LogSink};
pub use state::Renderer;
