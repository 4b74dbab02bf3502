use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::spinner::ellipsis;
use crate::state::{lock, Renderer};

/// A key press delivered by whatever is listening to the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Char(char),
    Enter,
}

/// Lets another thread abandon a blocked [`Renderer::request_line_cancellable`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The prompt being shown, if any, and everything typed since it appeared.
#[derive(Debug, Default)]
pub(crate) struct InputState {
    pub(crate) prompt: Option<String>,
    pub(crate) buffer: String,
}

impl InputState {
    pub(crate) fn prompt_line(&self, now_secs: f64) -> Option<String> {
        let prompt = self.prompt.as_ref()?;
        let typed = self.buffer.split('\n').next().unwrap_or_default();
        Some(format!("{prompt}{}{typed}", ellipsis(now_secs)))
    }
}

/// Clears the prompt however the request ends, including unwinding.
struct PromptGuard<'a> {
    input: &'a Mutex<InputState>,
}

impl Drop for PromptGuard<'_> {
    fn drop(&mut self) {
        lock(self.input).prompt = None;
    }
}

impl<W: Write + Send> Renderer<W> {
    /// Shows `prompt` below the projects and blocks until a line has been
    /// typed, returning it without the terminator. Renders from other threads
    /// keep running and redraw the prompt with what has been typed so far.
    pub fn request_line(&self, prompt: &str) -> Result<String> {
        self.request_line_cancellable(prompt, &CancelToken::new())
    }

    pub fn request_line_cancellable(&self, prompt: &str, cancel: &CancelToken) -> Result<String> {
        {
            let mut input = lock(&self.input);
            if input.prompt.is_some() {
                return Err(Error::ConcurrentInputConflict);
            }
            input.buffer.clear();
            input.prompt = Some(prompt.to_owned());
        }
        let _guard = PromptGuard { input: &self.input };
        if let Err(err) = self.flush(true) {
            warn!("failed to draw input prompt: {err}");
        }

        // Declared after the guard so it is released first.
        let mut input = lock(&self.input);
        loop {
            if let Some(end) = input.buffer.find('\n') {
                let line = input.buffer[..end].to_owned();
                input.buffer.clear();
                return Ok(line);
            }
            if cancel.is_cancelled() {
                return Err(Error::InputCancelled);
            }
            input = match self.input_ready.wait_timeout(input, self.config.input_poll) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    /// Entry point for the keyboard collaborator. Keys pressed while no
    /// prompt is waiting are dropped.
    pub fn on_key_event(&self, event: KeyEvent) {
        {
            let mut input = lock(&self.input);
            if input.prompt.is_none() {
                debug!("no prompt waiting, dropping {event:?}");
                return;
            }
            match event {
                KeyEvent::Char(c) => input.buffer.push(c),
                KeyEvent::Enter => input.buffer.push('\n'),
            }
        }
        self.input_ready.notify_all();
        if let Err(err) = self.flush(true) {
            warn!("render after key press failed: {err}");
        }
    }

    pub fn is_prompting(&self) -> bool {
        lock(&self.input).prompt.is_some()
    }
}
