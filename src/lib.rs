//! # cc-guard
//!
//! Live cost guard for Claude Code sessions. Tails the per-session JSONL usage
//! logs under `~/.claude/projects`, rebuilds 5-hour billing blocks, and keeps
//! burn rates and budget alerts current as new lines are appended.
//!
//! ## Overview
//!
//! Data flows in one direction:
//! discovery → tailer (parser + dedup index) → blocks → burn rate / aggregate
//! → alert → snapshot → display.
//!
//! Only the [`tailer::LogTailer`] holds mutable state. Everything downstream
//! is a pure function of its entry set and an explicit `now`, so any instant
//! can be replayed deterministically.
//!
//! ## Features
//!
//! - `colors` (default): Enables terminal color output via owo-colors

/// Per-model and per-session rollups
pub mod aggregate;

/// Budget threshold evaluation
pub mod alert;

/// 5-hour billing block segmentation
pub mod blocks;

/// Cost and token burn rates, trend, sparkline
pub mod burn_rate;

/// Command-line argument parsing
pub mod cli;

/// `~/.cc-guard.json` loading and CLI merging
pub mod config;

/// Session log enumeration
pub mod discovery;

/// Text dashboard and JSON snapshot output
pub mod display;

/// tracing subscriber setup
pub mod logging;

/// Data models for entries, blocks, rates, and summaries
pub mod models;

/// JSONL line parsing
pub mod parser;

/// Model-specific pricing calculations
pub mod pricing;

/// Derived view of the entry set at one instant
pub mod snapshot;

/// Incremental log reader and request-id dedup index
pub mod tailer;

/// Formatting helpers and shared constants
pub mod utils;

/// File-system notifications for the log root
pub mod watcher;
