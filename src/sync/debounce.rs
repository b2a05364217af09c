// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Debounced upload: every commit restarts a quiet-window timer, and only the
//! latest snapshot is uploaded once the window passes without new commits.

use crate::book::CommitHook;
use crate::models::AppData;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(2000);
/// Longest accepted quiet window; longer windows are clamped to it.
pub const MAX_QUIET_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Cancel-and-restart timer, driven by explicit instants.
#[derive(Debug, Clone)]
pub struct DebounceTimer {
    window: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.min(MAX_QUIET_WINDOW),
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Restarts the window at `now`.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now.checked_add(self.window).unwrap_or(now));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once per burst: when the deadline has been reached.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if d <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drops a pending deadline. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

enum Command {
    Touch(Box<AppData>),
    Flush(Sender<()>),
    Shutdown,
}

/// Background thread owning the timer and the latest unsent snapshot.
pub struct UploadWorker {
    tx: Sender<Command>,
    handle: Option<JoinHandle<()>>,
}

impl UploadWorker {
    pub fn spawn<F>(window: Duration, upload: F) -> std::io::Result<Self>
    where
        F: FnMut(&AppData) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("miaoledger-sync".into())
            .spawn(move || run(rx, DebounceTimer::new(window), upload))?;
        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    pub fn trigger(&self) -> SyncTrigger {
        SyncTrigger {
            tx: self.tx.clone(),
        }
    }

    /// Uploads a pending snapshot right away and waits for it.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.tx.send(Command::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

impl Drop for UploadWorker {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run<F: FnMut(&AppData)>(rx: mpsc::Receiver<Command>, mut timer: DebounceTimer, mut upload: F) {
    let mut pending: Option<Box<AppData>> = None;
    loop {
        let msg = match timer.deadline() {
            Some(deadline) => {
                let now = Instant::now();
                if timer.fire_if_due(now) {
                    if let Some(snapshot) = pending.take() {
                        upload(&snapshot);
                    }
                    continue;
                }
                match rx.recv_timeout(deadline - now) {
                    Ok(msg) => msg,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(msg) => msg,
                Err(_) => break,
            },
        };
        match msg {
            Command::Touch(snapshot) => {
                timer.touch(Instant::now());
                pending = Some(snapshot);
            }
            Command::Flush(ack) => {
                if timer.cancel() {
                    if let Some(snapshot) = pending.take() {
                        upload(&snapshot);
                    }
                }
                let _ = ack.send(());
            }
            Command::Shutdown => {
                if timer.is_pending() {
                    debug!("sync worker stopping with an unsent snapshot");
                }
                break;
            }
        }
    }
}

/// Commit hook that feeds the worker. Cheap to clone.
#[derive(Clone)]
pub struct SyncTrigger {
    tx: Sender<Command>,
}

impl CommitHook for SyncTrigger {
    fn on_commit(&self, snapshot: &AppData) {
        if self.tx.send(Command::Touch(Box::new(snapshot.clone()))).is_err() {
            debug!("sync worker gone, commit not scheduled for upload");
        }
    }
}
