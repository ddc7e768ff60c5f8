//! File-system watch over the log root, feeding [`WatchEvent`]s to the tailer.
//!
//! The notify callback runs on the backend's thread and only forwards into a
//! channel. Consumers pull events one at a time from the main loop, so the
//! tailer itself never sees concurrent access.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, warn};

use crate::discovery::{is_log_file, logs_dir_exists};
use crate::tailer::{TailerError, WatchEvent};

pub struct LogWatcher {
    root: PathBuf,
    // held for its Drop; dropping it stops the backend
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    queued: VecDeque<WatchEvent>,
    disconnected: bool,
}

impl LogWatcher {
    /// Start a recursive watch on `root`. Fails fast when the root is absent.
    pub fn open(root: &Path) -> Result<Self, TailerError> {
        if !logs_dir_exists(root) {
            return Err(TailerError::RootNotFound(root.to_path_buf()));
        }
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // receiver gone means we are shutting down
            let _ = tx.send(res);
        })
        .map_err(|e| TailerError::Watch(e.to_string()))?;
        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| TailerError::Watch(e.to_string()))?;
        debug!(root = %root.display(), "watch acquired");

        Ok(Self {
            root: root.to_path_buf(),
            _watcher: watcher,
            rx,
            queued: VecDeque::new(),
            disconnected: false,
        })
    }

    /// Wait up to `timeout` for the next relevant event.
    ///
    /// Returns `None` on timeout or when the backend has gone away.
    pub fn next_event(&mut self, timeout: Duration) -> Option<WatchEvent> {
        loop {
            if let Some(ev) = self.queued.pop_front() {
                return Some(ev);
            }
            if self.disconnected {
                // keep the caller's cadence; polling still picks up appends
                std::thread::sleep(timeout);
                return None;
            }
            match self.rx.recv_timeout(timeout) {
                Ok(res) => self.queued.extend(translate(res)),
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("watch channel disconnected");
                    self.disconnected = true;
                    return None;
                }
            }
        }
    }

    /// Drain whatever is already pending without blocking.
    pub fn drain(&mut self) -> Vec<WatchEvent> {
        while let Ok(res) = self.rx.try_recv() {
            self.queued.extend(translate(res));
        }
        self.queued.drain(..).collect()
    }
}

impl Drop for LogWatcher {
    fn drop(&mut self) {
        debug!(root = %self.root.display(), "releasing watch");
    }
}

/// Map one raw notification to tailer events, keeping only log files.
pub fn translate(res: notify::Result<Event>) -> Vec<WatchEvent> {
    let event = match res {
        Ok(ev) => ev,
        Err(e) => return vec![WatchEvent::Failed(e.to_string())],
    };
    let make: fn(PathBuf) -> WatchEvent = match event.kind {
        EventKind::Create(_) => WatchEvent::Created,
        EventKind::Modify(_) => WatchEvent::Changed,
        _ => return Vec::new(),
    };
    event
        .paths
        .into_iter()
        .filter(|p| is_log_file(p))
        .map(make)
        .collect()
}
