//! # Blocks Module
//!
//! Segments usage entries into 5-hour billing blocks.
//!
//! A block opens at its first entry's timestamp floored to the UTC hour and
//! closes when the next entry is either 5h past the block start or 5h after
//! the previous entry. The scan is a single forward pass over entries sorted
//! by timestamp, so a late entry never reopens a closed block.

use chrono::{DateTime, TimeDelta, Timelike, Utc};

use crate::models::{BillingBlock, UsageEntry};
use crate::utils::{BLOCK_DURATION_HOURS, BLOCK_DURATION_SECONDS};

fn block_length() -> TimeDelta {
    TimeDelta::hours(BLOCK_DURATION_HOURS)
}

/// Truncate to the start of the UTC hour
pub fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

fn seed(entry: &UsageEntry) -> BillingBlock {
    let start = floor_to_hour(entry.timestamp);
    BillingBlock {
        start,
        end: start + block_length(),
        is_active: false,
        entries: vec![entry.clone()],
        total_cost: entry.cost_usd,
    }
}

pub fn compute_blocks(entries: &[UsageEntry], now: DateTime<Utc>) -> Vec<BillingBlock> {
    let mut sorted: Vec<&UsageEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.timestamp);

    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };

    let mut blocks = Vec::new();
    let mut open = seed(first);
    let mut prev = first.timestamp;

    for e in iter {
        let since_start = e.timestamp - open.start;
        let gap = e.timestamp - prev;
        if since_start >= block_length() || gap >= block_length() {
            blocks.push(std::mem::replace(&mut open, seed(e)));
        } else {
            open.total_cost += e.cost_usd;
            open.entries.push(e.clone());
        }
        prev = e.timestamp;
    }

    open.is_active = now - prev < block_length() && now - open.start < block_length();
    blocks.push(open);
    blocks
}

/// The last block, if it is still active at `now`
pub fn current_block(entries: &[UsageEntry], now: DateTime<Utc>) -> Option<BillingBlock> {
    compute_blocks(entries, now).pop().filter(|b| b.is_active)
}

/// Elapsed share of the block, clamped to `[0, 1]`
pub fn block_progress(block: &BillingBlock, now: DateTime<Utc>) -> f64 {
    let elapsed = (now - block.start).num_milliseconds() as f64 / 1000.0;
    (elapsed / BLOCK_DURATION_SECONDS as f64).clamp(0.0, 1.0)
}

pub fn block_remaining(block: &BillingBlock, now: DateTime<Utc>) -> TimeDelta {
    (block.end - now).max(TimeDelta::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 17, h, m, 0).unwrap()
    }

    fn entry(ts: DateTime<Utc>, cost: f64) -> UsageEntry {
        UsageEntry {
            timestamp: ts,
            session_id: "s".into(),
            request_id: String::new(),
            model: "claude-sonnet-4-5".into(),
            input_tokens: 10,
            output_tokens: 5,
            cache_creation_tokens: 0,
            cache_write_5m_tokens: 0,
            cache_write_1h_tokens: 0,
            cache_read_tokens: 0,
            cost_usd: cost,
            source: "/p/s.jsonl".into(),
        }
    }

    #[test]
    fn test_floor_to_hour() {
        let ts = Utc.with_ymd_and_hms(2026, 2, 17, 10, 47, 13).unwrap()
            + TimeDelta::milliseconds(250);
        assert_eq!(floor_to_hour(ts), at(10, 0));
        assert_eq!(floor_to_hour(floor_to_hour(ts)), floor_to_hour(ts));
    }

    #[test]
    fn test_single_active_block() {
        let entries = vec![entry(at(10, 30), 0.02), entry(at(10, 0), 0.01)];
        let blocks = compute_blocks(&entries, at(12, 0));
        assert_eq!(blocks.len(), 1);
        let b = &blocks[0];
        assert_eq!(b.start, at(10, 0));
        assert_eq!(b.end, at(15, 0));
        assert!((b.total_cost - 0.03).abs() < 1e-12);
        assert!(b.is_active);
        // sorted on the way in
        assert_eq!(b.entries[0].timestamp, at(10, 0));
    }

    #[test]
    fn test_gap_splits_blocks() {
        let entries = vec![entry(at(8, 0), 1.0), entry(at(16, 0), 2.0)];
        let blocks = compute_blocks(&entries, at(17, 0));
        assert_eq!(blocks.len(), 2);
        assert!(!blocks[0].is_active);
        assert!(blocks[1].is_active);
        assert_eq!(blocks[1].start, at(16, 0));
    }

    #[test]
    fn test_span_splits_blocks_without_gap() {
        // every gap is 2h but the run lasts longer than 5h from its floored start
        let entries = vec![
            entry(at(9, 15), 1.0),
            entry(at(11, 15), 1.0),
            entry(at(13, 15), 1.0),
            entry(at(15, 15), 1.0),
        ];
        let blocks = compute_blocks(&entries, at(15, 30));
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].entries.len(), 3);
        assert_eq!(blocks[1].start, at(15, 0));
    }

    #[test]
    fn test_expired_block_is_inactive() {
        let entries = vec![entry(at(10, 0), 1.0)];
        assert!(current_block(&entries, at(15, 0)).is_none());
        assert!(current_block(&entries, at(14, 59)).is_some());
        assert!(compute_blocks(&[], at(12, 0)).is_empty());
        assert!(current_block(&[], at(12, 0)).is_none());
    }

    #[test]
    fn test_progress_and_remaining() {
        let entries = vec![entry(at(10, 0), 1.0)];
        let b = current_block(&entries, at(12, 30)).unwrap();
        assert!((block_progress(&b, at(12, 30)) - 0.5).abs() < 1e-9);
        assert_eq!(block_progress(&b, at(9, 0)), 0.0);
        assert_eq!(block_progress(&b, at(18, 0)), 1.0);
        assert_eq!(block_remaining(&b, at(12, 30)), TimeDelta::minutes(150));
        assert_eq!(block_remaining(&b, at(18, 0)), TimeDelta::zero());
    }
}
