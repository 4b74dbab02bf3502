use std::io::Write;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use log::{debug, warn};

use crate::input::KeyEvent;
use crate::state::Renderer;

/// Something that produces key presses. The renderer never listens to the
/// keyboard itself; a source is attached with [attach].
pub trait KeySource {
    fn subscribe<F>(self, on_key: F) -> JoinHandle<()>
    where
        F: FnMut(KeyEvent) + Send + 'static;
}

/// Feeds every key from `source` into the renderer's input buffer.
pub fn attach<W, S>(renderer: Arc<Renderer<W>>, source: S) -> JoinHandle<()>
where
    W: Write + Send + 'static,
    S: KeySource,
{
    source.subscribe(move |key| renderer.on_key_event(key))
}

/// Key presses read from the terminal with crossterm. Without raw mode the
/// terminal only hands them over once Enter is pressed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn subscribe<F>(self, mut on_key: F) -> JoinHandle<()>
    where
        F: FnMut(KeyEvent) + Send + 'static,
    {
        thread::spawn(move || loop {
            match event::read() {
                Ok(Event::Key(key)) => {
                    if let Some(key) = translate(key) {
                        on_key(key);
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("stopped reading terminal keys: {err}");
                    break;
                }
            }
        })
    }
}

/// Keys sent by another part of the program; stops when every sender is gone.
impl KeySource for Receiver<KeyEvent> {
    fn subscribe<F>(self, mut on_key: F) -> JoinHandle<()>
    where
        F: FnMut(KeyEvent) + Send + 'static,
    {
        thread::spawn(move || {
            for key in self {
                on_key(key);
            }
            debug!("key channel closed");
        })
    }
}

fn translate(key: event::KeyEvent) -> Option<KeyEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char(c) => Some(KeyEvent::Char(c)),
        KeyCode::Enter => Some(KeyEvent::Enter),
        _ => None,
    }
}
