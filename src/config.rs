use std::path::PathBuf;
use std::time::Duration;

/// Knobs for a [`Renderer`](crate::Renderer). `Default` matches the behaviour
/// of the original logger: persist to `logs/<session>_latest.log`, time-only
/// stamps, projects go stale after five seconds.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Append every rendered line to `<log_dir>/<session>_latest.log`.
    pub latest_log: bool,
    pub log_dir: PathBuf,
    /// Stamp entries with `%Y-%m-%d %H:%M:%S` instead of `%H:%M:%S`.
    pub show_date: bool,
    pub stale_after: Duration,
    /// Upper bound on time spent draining backlog in a single render.
    pub drain_budget: Duration,
    /// How long a blocked `request_line` sleeps between checks.
    pub input_poll: Duration,
    /// Number of `<date>-<n>` suffixes tried before falling back to a
    /// timestamp session name.
    pub session_attempts: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            latest_log: true,
            log_dir: PathBuf::from("logs"),
            show_date: false,
            stale_after: Duration::from_secs(5),
            drain_budget: Duration::from_secs(5),
            input_poll: Duration::from_millis(100),
            session_attempts: 1000,
        }
    }
}

impl RendererConfig {
    pub fn with_latest_log(mut self, latest_log: bool) -> Self {
        self.latest_log = latest_log;
        self
    }

    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn with_show_date(mut self, show_date: bool) -> Self {
        self.show_date = show_date;
        self
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn with_drain_budget(mut self, drain_budget: Duration) -> Self {
        self.drain_budget = drain_budget;
        self
    }

    pub fn with_input_poll(mut self, input_poll: Duration) -> Self {
        self.input_poll = input_poll;
        self
    }

    pub fn with_session_attempts(mut self, session_attempts: u32) -> Self {
        self.session_attempts = session_attempts;
        self
    }

    pub(crate) fn timestamp_format(&self) -> &'static str {
        if self.show_date {
            "%Y-%m-%d %H:%M:%S"
        } else {
            "%H:%M:%S"
        }
    }
}
