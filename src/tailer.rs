//! # Tailer Module
//!
//! Incremental reader over the session log tree plus the request-id dedup index.
//!
//! A [`LogTailer`] owns all mutable observation state: per-file byte offsets,
//! the `request id -> entry` index, and the bag of entries without a request
//! id. It is driven by a single handler, [`LogTailer::handle`], one
//! [`WatchEvent`] at a time; nothing else mutates it.
//!
//! Streaming responses are logged as several lines sharing a request id with
//! growing token counts. Inserting each parsed line into the index replaces
//! the previous chunk, so the index converges to the final counts.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::discovery::{discover_log_files, logs_dir_exists};
use crate::models::UsageEntry;
use crate::parser::parse_line;
use crate::pricing::PricingOverrides;

#[derive(Debug, Error)]
pub enum TailerError {
    /// The only condition that prevents observation from starting
    #[error("Claude Code logs directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("File watcher error: {0}")]
    Watch(String),
}

/// A file-system notification, already narrowed to log files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Changed(PathBuf),
    Created(PathBuf),
    Failed(String),
}

#[derive(Debug)]
pub struct LogTailer {
    root: PathBuf,
    overrides: PricingOverrides,
    offsets: HashMap<PathBuf, u64>,
    // trailing bytes of a line caught mid-write, per file; may end inside a
    // multi-byte character, so kept undecoded
    pending: HashMap<PathBuf, Vec<u8>>,
    by_request: HashMap<String, UsageEntry>,
    anonymous: Vec<UsageEntry>,
    file_count: usize,
    watching: bool,
    last_error: Option<String>,
    last_update: Option<DateTime<Utc>>,
}

impl LogTailer {
    pub fn new(root: impl Into<PathBuf>, overrides: PricingOverrides) -> Self {
        Self {
            root: root.into(),
            overrides,
            offsets: HashMap::new(),
            pending: HashMap::new(),
            by_request: HashMap::new(),
            anonymous: Vec::new(),
            file_count: 0,
            watching: false,
            last_error: None,
            last_update: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read every existing log in full and record its length as the offset.
    ///
    /// Fails only when the root directory does not exist; the failure is also
    /// kept as [`last_error`](Self::last_error) for display.
    pub fn start(&mut self) -> Result<(), TailerError> {
        self.offsets.clear();
        self.pending.clear();
        self.by_request.clear();
        self.anonymous.clear();
        self.file_count = 0;

        if !logs_dir_exists(&self.root) {
            let err = TailerError::RootNotFound(self.root.clone());
            self.last_error = Some(err.to_string());
            self.watching = false;
            return Err(err);
        }

        let files = discover_log_files(&self.root);
        for f in &files {
            self.offsets.entry(f.path.clone()).or_insert(0);
            self.read_new_bytes(&f.path);
        }
        self.file_count = files.len();
        self.watching = true;
        self.last_error = None;
        if self.entry_count() > 0 {
            self.last_update = Some(Utc::now());
        }
        info!(
            root = %self.root.display(),
            files = self.file_count,
            entries = self.entry_count(),
            "initial scan complete"
        );
        Ok(())
    }

    /// Apply one notification. Returns true when the entry set changed.
    pub fn handle(&mut self, event: WatchEvent) -> bool {
        match event {
            WatchEvent::Changed(path) => self.read_new_bytes(&path),
            WatchEvent::Created(path) => {
                // a duplicate create for a file we already track is just a change
                if !self.offsets.contains_key(&path) {
                    self.file_count += 1;
                    self.offsets.insert(path.clone(), 0);
                }
                self.read_new_bytes(&path)
            }
            WatchEvent::Failed(msg) => {
                let err = TailerError::Watch(msg);
                warn!(error = %err, "watch subsystem reported an error");
                self.last_error = Some(err.to_string());
                false
            }
        }
    }

    /// Re-read every tracked file for bytes a notification never announced.
    ///
    /// Some backends coalesce or drop events under load; this is the fallback
    /// the main loop runs on the poll interval.
    pub fn poll(&mut self) -> bool {
        let paths: Vec<PathBuf> = self.offsets.keys().cloned().collect();
        let mut added = false;
        for path in paths {
            added |= self.read_new_bytes(&path);
        }
        added
    }

    /// Read bytes `(offset, size]` of `path` and ingest complete lines.
    fn read_new_bytes(&mut self, path: &Path) -> bool {
        let size = match fs::metadata(path) {
            Ok(m) => m.len(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable log");
                return false;
            }
        };
        let offset = self.offsets.get(path).copied().unwrap_or(0);
        if size <= offset {
            return false;
        }
        let chunk = match read_range(path, offset, size) {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable log");
                return false;
            }
        };
        self.offsets.insert(path.to_path_buf(), size);
        debug!(
            path = %path.display(),
            from = offset,
            to = size,
            "read appended bytes"
        );
        let added = self.ingest(path, &chunk);
        if added {
            self.last_update = Some(Utc::now());
        }
        added
    }

    /// Split `chunk` on newlines and ingest every complete line.
    ///
    /// The bytes after the last newline are held for the next read unless
    /// they already form a whole JSON value. Lines are decoded only once
    /// complete, so a character cut across two reads survives.
    fn ingest(&mut self, path: &Path, chunk: &[u8]) -> bool {
        let mut held = self.pending.remove(path).unwrap_or_default();
        let mut segments: Vec<&[u8]> = chunk.split(|b| *b == b'\n').collect();
        let tail = segments.pop().unwrap_or_default();

        let source = path.to_string_lossy().into_owned();
        let mut added = false;
        for seg in segments {
            let line = join_fragment(std::mem::take(&mut held), seg, path);
            added |= self.ingest_line(&line, &source);
        }

        let rest = join_fragment(held, tail, path);
        if is_json(&rest) {
            added |= self.ingest_line(&rest, &source);
        } else if !rest.iter().all(u8::is_ascii_whitespace) {
            self.pending.insert(path.to_path_buf(), rest);
        }
        added
    }

    fn ingest_line(&mut self, line: &[u8], source: &str) -> bool {
        let text = String::from_utf8_lossy(line);
        match parse_line(&text, source, &self.overrides) {
            Some(entry) => {
                self.insert(entry);
                true
            }
            None => false,
        }
    }

    fn insert(&mut self, entry: UsageEntry) {
        if entry.request_id.is_empty() {
            self.anonymous.push(entry);
        } else {
            self.by_request.insert(entry.request_id.clone(), entry);
        }
    }

    /// Current deduplicated entry set, in no particular order.
    pub fn entries(&self) -> Vec<UsageEntry> {
        self.by_request
            .values()
            .chain(self.anonymous.iter())
            .cloned()
            .collect()
    }

    pub fn entry_count(&self) -> usize {
        self.by_request.len() + self.anonymous.len()
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn is_watching(&self) -> bool {
        self.watching
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn offset(&self, path: &Path) -> Option<u64> {
        self.offsets.get(path).copied()
    }
}

fn read_range(path: &Path, from: u64, to: u64) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(from))?;
    let mut buf = Vec::with_capacity((to - from) as usize);
    file.take(to - from).read_to_end(&mut buf)?;
    Ok(buf)
}

fn is_json(bytes: &[u8]) -> bool {
    serde_json::from_slice::<IgnoredAny>(bytes).is_ok()
}

/// Prefix `segment` with the fragment held from the previous read.
///
/// A fragment left by a writer that died mid-line never completes. When the
/// joined bytes are not JSON but `segment` alone is, the fragment is dropped
/// so it cannot swallow the next record.
fn join_fragment(held: Vec<u8>, segment: &[u8], path: &Path) -> Vec<u8> {
    if held.is_empty() {
        return segment.to_vec();
    }
    let mut joined = held;
    joined.extend_from_slice(segment);
    if !is_json(&joined) && is_json(segment) {
        debug!(
            path = %path.display(),
            dropped = joined.len() - segment.len(),
            "discarding truncated line fragment"
        );
        return segment.to_vec();
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn line(req: &str, ts: &str, out: u64) -> String {
        serde_json::json!({
            "type": "assistant",
            "timestamp": ts,
            "sessionId": "s1",
            "requestId": req,
            "message": {"model": "claude-sonnet-4-5", "usage": {"output_tokens": out}}
        })
        .to_string()
    }

    #[test]
    fn test_partial_line_is_held_until_completed() {
        let dir = tempfile::tempdir().unwrap();
        let proj = dir.path().join("proj");
        fs::create_dir_all(&proj).unwrap();
        let log = proj.join("s1.jsonl");
        fs::write(&log, "").unwrap();

        let mut tailer = LogTailer::new(dir.path(), PricingOverrides::new());
        tailer.start().unwrap();

        let full = line("r1", "2026-02-17T10:00:00Z", 7);
        let (head, tail) = full.split_at(full.len() / 2);
        {
            let mut f = fs::OpenOptions::new().append(true).open(&log).unwrap();
            f.write_all(head.as_bytes()).unwrap();
        }
        assert!(!tailer.handle(WatchEvent::Changed(log.clone())));
        assert_eq!(tailer.entry_count(), 0);
        assert_eq!(tailer.offset(&log), Some(head.len() as u64));

        {
            let mut f = fs::OpenOptions::new().append(true).open(&log).unwrap();
            writeln!(f, "{tail}").unwrap();
        }
        assert!(tailer.handle(WatchEvent::Changed(log.clone())));
        assert_eq!(tailer.entries()[0].output_tokens, 7);
    }

    #[test]
    fn test_watch_error_is_recorded_but_reads_continue() {
        let dir = tempfile::tempdir().unwrap();
        let proj = dir.path().join("proj");
        fs::create_dir_all(&proj).unwrap();
        let mut tailer = LogTailer::new(dir.path(), PricingOverrides::new());
        tailer.start().unwrap();

        assert!(!tailer.handle(WatchEvent::Failed("inotify limit".into())));
        assert_eq!(tailer.last_error(), Some("File watcher error: inotify limit"));
        assert!(tailer.is_watching());

        let log = proj.join("s2.jsonl");
        fs::write(&log, format!("{}\n", line("r9", "2026-02-17T10:00:00Z", 1))).unwrap();
        assert!(tailer.handle(WatchEvent::Created(log)));
        assert_eq!(tailer.entry_count(), 1);
    }
}
