use std::fs::{self, File};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use live_log::keys::{self, TerminalKeys};
use live_log::{Renderer, RendererConfig, Severity};
use simplelog::{Config, LevelFilter, WriteLogger};

fn main() -> Result<()> {
    let config = RendererConfig::default();
    fs::create_dir_all(&config.log_dir).context("creating log directory")?;
    // The terminal belongs to the renderer, so diagnostics go to a file.
    WriteLogger::init(
        LevelFilter::Debug,
        Config::default(),
        File::create(config.log_dir.join("demo-debug.log")).context("opening debug log")?,
    )?;

    // Keys reach the renderer unechoed; lines are written with "\r\n".
    let raw_mode = RawMode::enable()?;
    let renderer = Arc::new(Renderer::new(config));
    let scheduler = renderer.start_flush_scheduler(Duration::from_millis(100));
    keys::attach(Arc::clone(&renderer), TerminalKeys);

    let workers: Vec<_> = ["fetch", "build"]
        .into_iter()
        .enumerate()
        .map(|(n, name)| {
            let renderer = Arc::clone(&renderer);
            thread::spawn(move || work(&renderer, name, 0.7 + n as f64))
        })
        .collect();
    for worker in workers {
        worker
            .join()
            .map_err(|_| anyhow::anyhow!("worker panicked"))?;
    }

    let name = renderer.request_line("What's your name? ")?;
    renderer.log(format!("Hello, {name}!"), Severity::Log, None);
    renderer.flush(true)?;
    scheduler.stop();
    drop(raw_mode);

    let saved = renderer.save_to_file(&renderer.config().log_dir, None)?;
    println!("full log saved to {}", saved.display());
    Ok(())
}

/// Puts the terminal back however `main` exits.
struct RawMode;

impl RawMode {
    fn enable() -> Result<Self> {
        enable_raw_mode().context("enabling raw mode")?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

fn work(renderer: &Renderer, name: &str, step: f64) {
    renderer.start_project(name, Some(name));
    renderer.log(format!("{name} started"), Severity::Log, Some(name));
    let mut percent: f64 = 0.0;
    let mut tick = 0u32;
    while percent < 100.0 {
        percent += step;
        tick += 1;
        // Skip some updates so the spinner visibly lags behind.
        if tick % 3 != 0 {
            let _ = renderer.update_project(name, Some(percent.min(100.0)));
        }
        if tick % 40 == 0 {
            let severity = match tick / 40 % 4 {
                0 => Severity::Verbose,
                1 => Severity::Log,
                2 => Severity::Warn,
                _ => Severity::Error,
            };
            renderer.log(format!("{name} at tick {tick}"), severity, Some(name));
        }
        thread::sleep(Duration::from_millis(50));
    }
    renderer.log(format!("{name} done!"), Severity::Log, Some(name));
    if let Err(err) = renderer.close_project(name) {
        log::warn!("{err}");
    }
}
