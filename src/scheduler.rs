use std::io::Write;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::MissedTickBehavior;

use crate::state::Renderer;

/// A thread forcing a render every interval, for as long as this handle
/// lives.
pub struct FlushScheduler {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl FlushScheduler {
    /// Stops the thread and waits for an in-flight render to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("flush scheduler thread panicked");
            }
        }
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<W: Write + Send + 'static> Renderer<W> {
    pub fn start_flush_scheduler(self: &Arc<Self>, interval: Duration) -> FlushScheduler {
        let (stop, stopped) = mpsc::channel::<()>();
        let renderer = Arc::clone(self);
        let thread = thread::spawn(move || {
            // Nothing is ever sent; the sender being dropped is the signal.
            while let Err(RecvTimeoutError::Timeout) = stopped.recv_timeout(interval) {
                if let Err(err) = renderer.flush(true) {
                    warn!("scheduled render failed: {err}");
                }
            }
            debug!("flush scheduler stopped");
        });
        FlushScheduler {
            stop: Some(stop),
            thread: Some(thread),
        }
    }
}

/// The scheduler for programs already running a tokio runtime. Runs until
/// the task is aborted.
pub fn spawn_flush_task<W>(
    renderer: Arc<Renderer<W>>,
    interval: Duration,
) -> tokio::task::JoinHandle<()>
where
    W: Write + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval(interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticks.tick().await;
            let renderer = Arc::clone(&renderer);
            match tokio::task::spawn_blocking(move || renderer.flush(true)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!("scheduled render failed: {err}"),
                Err(err) => warn!("scheduled render panicked: {err}"),
            }
        }
    })
}
