use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use cc_guard::blocks::{block_progress, compute_blocks, current_block, floor_to_hour};
use cc_guard::burn_rate::{calculate_burn_rate, SPARKLINE_BUCKETS};
use cc_guard::models::{BillingBlock, UsageEntry};

fn ts(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 17, h, m, 0).unwrap()
}

fn create_test_entry(ts: DateTime<Utc>, cost: f64) -> UsageEntry {
    UsageEntry {
        timestamp: ts,
        session_id: "session1".to_string(),
        request_id: String::new(),
        model: "claude-sonnet-4-5".to_string(),
        input_tokens: 1000,
        output_tokens: 500,
        cache_creation_tokens: 0,
        cache_write_5m_tokens: 0,
        cache_write_1h_tokens: 0,
        cache_read_tokens: 0,
        cost_usd: cost,
        source: "/logs/test-project/session1.jsonl".to_string(),
    }
}

#[test]
fn test_two_entries_one_block() {
    let entries = vec![
        create_test_entry(ts(10, 0), 0.01),
        create_test_entry(ts(10, 30), 0.02),
    ];
    let blocks = compute_blocks(&entries, ts(12, 0));
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].start, ts(10, 0));
    assert_eq!(blocks[0].end, ts(15, 0));
    assert!((blocks[0].total_cost - 0.03).abs() < 1e-12);
    assert!(blocks[0].is_active);
}

#[test]
fn test_eight_hour_gap_two_blocks() {
    let entries = vec![
        create_test_entry(ts(8, 0), 1.0),
        create_test_entry(ts(16, 0), 1.0),
    ];
    let blocks = compute_blocks(&entries, ts(16, 30));
    assert_eq!(blocks.len(), 2);
    assert!(!blocks[0].is_active);
    assert_eq!(blocks[1].start, ts(16, 0));
    assert!(current_block(&entries, ts(16, 30)).is_some());
}

fn assert_partition(entries: &[UsageEntry], blocks: &[BillingBlock]) {
    let mut sorted: Vec<DateTime<Utc>> = entries.iter().map(|e| e.timestamp).collect();
    sorted.sort();
    let flattened: Vec<DateTime<Utc>> = blocks
        .iter()
        .flat_map(|b| b.entries.iter().map(|e| e.timestamp))
        .collect();
    assert_eq!(flattened, sorted);

    for (i, b) in blocks.iter().enumerate() {
        let first = b.entries.first().unwrap().timestamp;
        let last = b.entries.last().unwrap().timestamp;
        assert_eq!(b.start, floor_to_hour(first));
        assert!(last - b.start < TimeDelta::hours(5));
        for w in b.entries.windows(2) {
            assert!(w[1].timestamp - w[0].timestamp < TimeDelta::hours(5));
        }
        let sum: f64 = b.entries.iter().map(|e| e.cost_usd).sum();
        assert!((b.total_cost - sum).abs() < 1e-9);
        if i + 1 < blocks.len() {
            assert!(!b.is_active);
            assert!(blocks[i + 1].start >= floor_to_hour(last));
        }
    }
}

#[test]
fn test_blocks_partition_entries() {
    // irregular minute offsets across two days, shuffled
    let base = ts(0, 0);
    let offsets = [
        725, 5, 90, 1300, 301, 299, 2000, 61, 1900, 410, 1301, 2500, 2790, 15, 888,
    ];
    let entries: Vec<UsageEntry> = offsets
        .iter()
        .enumerate()
        .map(|(i, m)| create_test_entry(base + TimeDelta::minutes(*m), i as f64 * 0.1))
        .collect();

    let now = base + TimeDelta::minutes(2800);
    let blocks = compute_blocks(&entries, now);
    assert!(blocks.len() > 1);
    assert_partition(&entries, &blocks);
    assert!(blocks.iter().filter(|b| b.is_active).count() <= 1);
}

#[test]
fn test_floor_to_hour_idempotent() {
    for m in [0, 1, 29, 59] {
        let t = ts(13, m) + TimeDelta::seconds(17);
        let f = floor_to_hour(t);
        assert_eq!(f, ts(13, 0));
        assert_eq!(floor_to_hour(f), f);
    }
}

#[test]
fn test_progress_monotonic() {
    let entries = vec![create_test_entry(ts(10, 0), 1.0)];
    let block = current_block(&entries, ts(10, 0)).unwrap();
    let mut prev = 0.0;
    for m in (0..=420).step_by(15) {
        let p = block_progress(&block, ts(9, 0) + TimeDelta::minutes(m));
        assert!((0.0..=1.0).contains(&p));
        assert!(p >= prev);
        prev = p;
    }
    assert_eq!(prev, 1.0);
}

#[test]
fn test_sparkline_always_full_length() {
    let entries = vec![create_test_entry(ts(10, 0), 1.0)];
    let block = current_block(&entries, ts(10, 0)).unwrap();

    // one entry, far outside the sparkline window
    let rate = calculate_burn_rate(&block, ts(14, 0));
    assert_eq!(rate.sparkline.len(), SPARKLINE_BUCKETS);
    assert!(rate.sparkline.iter().all(|v| *v == 0.0));
}
