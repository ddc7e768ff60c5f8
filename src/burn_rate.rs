//! # Burn Rate Module
//!
//! Cost and token consumption rates for the active billing block.
//!
//! Both rates share one computation over a per-entry quantity:
//! - overall rate: block total over elapsed hours (at least 0.01h)
//! - recent rate: last 15 minutes over `min(elapsed, 0.25h)`
//! - projection: total plus overall rate times remaining hours
//! - trend: recent/overall ratio, only with 3+ entries and 3+ minutes elapsed
//! - sparkline: 30 two-minute buckets over the trailing hour

use chrono::{DateTime, TimeDelta, Utc};

use crate::models::{BillingBlock, BurnRate, TokenBurnRate, Trend, UsageEntry};

pub const SPARKLINE_BUCKETS: usize = 30;
const BUCKET_MINUTES: i64 = 2;
const RECENT_WINDOW_MINUTES: i64 = 15;
const MIN_ELAPSED_HOURS: f64 = 0.01;
const RECENT_WINDOW_HOURS: f64 = 0.25;
const MIN_TREND_ENTRIES: usize = 3;
const MIN_TREND_HOURS: f64 = 0.05;
const RISING_RATIO: f64 = 1.3;
const FALLING_RATIO: f64 = 0.7;

fn hours(d: TimeDelta) -> f64 {
    d.num_milliseconds() as f64 / 3_600_000.0
}

struct Rates {
    overall: f64,
    recent: f64,
    projected: f64,
    trend: Trend,
    sparkline: Vec<f64>,
}

fn compute(
    block: &BillingBlock,
    now: DateTime<Utc>,
    epsilon: f64,
    value: impl Fn(&UsageEntry) -> f64,
) -> Rates {
    let elapsed = hours(now - block.start).max(MIN_ELAPSED_HOURS);
    let remaining = hours(block.end - now).max(0.0);

    let total: f64 = block.entries.iter().map(&value).sum();
    let overall = total / elapsed;

    let recent_cutoff = now - TimeDelta::minutes(RECENT_WINDOW_MINUTES);
    let recent_total: f64 = block
        .entries
        .iter()
        .filter(|e| e.timestamp >= recent_cutoff)
        .map(&value)
        .sum();
    let recent = recent_total / elapsed.min(RECENT_WINDOW_HOURS).max(MIN_ELAPSED_HOURS);

    let trend = if block.entries.len() < MIN_TREND_ENTRIES || elapsed <= MIN_TREND_HOURS {
        Trend::Stable
    } else {
        let ratio = recent / overall.max(epsilon);
        if ratio > RISING_RATIO {
            Trend::Rising
        } else if ratio < FALLING_RATIO {
            Trend::Falling
        } else {
            Trend::Stable
        }
    };

    Rates {
        overall,
        recent,
        projected: total + overall * remaining,
        trend,
        sparkline: sparkline(&block.entries, now, &value),
    }
}

fn sparkline(
    entries: &[UsageEntry],
    now: DateTime<Utc>,
    value: impl Fn(&UsageEntry) -> f64,
) -> Vec<f64> {
    let bucket = TimeDelta::minutes(BUCKET_MINUTES);
    let window_start = now - bucket * SPARKLINE_BUCKETS as i32;
    let mut buckets = vec![0.0; SPARKLINE_BUCKETS];
    for e in entries {
        if e.timestamp < window_start || e.timestamp > now {
            continue;
        }
        let offset = (e.timestamp - window_start).num_milliseconds() / bucket.num_milliseconds();
        let idx = (offset as usize).min(SPARKLINE_BUCKETS - 1);
        buckets[idx] += value(e);
    }
    buckets
}

pub fn calculate_burn_rate(block: &BillingBlock, now: DateTime<Utc>) -> BurnRate {
    let r = compute(block, now, 0.0001, |e| e.cost_usd);
    BurnRate {
        cost_per_hour: r.overall,
        recent_cost_per_hour: r.recent,
        projected_block_total: r.projected,
        trend: r.trend,
        sparkline: r.sparkline,
    }
}

pub fn calculate_token_burn_rate(block: &BillingBlock, now: DateTime<Utc>) -> TokenBurnRate {
    let r = compute(block, now, 1.0, |e| e.total_tokens() as f64);
    TokenBurnRate {
        tokens_per_hour: r.overall,
        recent_tokens_per_hour: r.recent,
        projected_block_tokens: r.projected,
        trend: r.trend,
        sparkline: r.sparkline,
    }
}
