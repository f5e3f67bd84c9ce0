//! Input/resize event plumbing for the editor's cooperative single-threaded
//! loop. Input is read on a dedicated thread; a second thread turns SIGWINCH
//! into resize notifications; the main loop selects between both channels.

use std::thread;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};

pub use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    /// The input thread's source was closed or errored; treat as the user
    /// requesting exit.
    InputClosed,
}

pub struct EventSource {
    receiver: Receiver<Event>,
    // Keeps the signal-hook registration (and its background thread) alive
    // for the lifetime of the EventSource.
    _resize_thread: thread::JoinHandle<()>,
}

impl EventSource {
    /// Spawns the input-reading and resize-signal threads and returns a
    /// handle whose `recv` blocks until the next key press or resize.
    pub fn spawn() -> Result<EventSource> {
        let (tx, rx) = crossbeam_channel::unbounded();

        spawn_input_thread(tx.clone());
        let resize_thread = spawn_resize_thread(tx)?;

        Ok(EventSource { receiver: rx, _resize_thread: resize_thread })
    }

    pub fn recv(&self) -> Event {
        // The sender halves are held by background threads for the program's
        // whole lifetime, so recv() only errs if both threads panicked.
        self.receiver.recv().unwrap_or(Event::InputClosed)
    }
}

fn spawn_input_thread(tx: Sender<Event>) {
    thread::spawn(move || loop {
        match crossterm::event::read() {
            Ok(crossterm::event::Event::Key(key_event)) => {
                if tx.send(Event::Key(key_event)).is_err() {
                    return;
                }
            }
            Ok(crossterm::event::Event::Resize(_, _)) => {
                if tx.send(Event::Resize).is_err() {
                    return;
                }
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(%error, "input_read_failed");
                let _ = tx.send(Event::InputClosed);
                return;
            }
        }
    });
}

fn spawn_resize_thread(tx: Sender<Event>) -> Result<thread::JoinHandle<()>> {
    let mut signals = signal_hook::iterator::Signals::new([signal_hook::consts::SIGWINCH])
        .context("registering SIGWINCH handler")?;

    Ok(thread::spawn(move || {
        for _ in signals.forever() {
            if tx.send(Event::Resize).is_err() {
                return;
            }
        }
    }))
}
