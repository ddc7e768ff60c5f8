//! # Parser Module
//!
//! Turns one raw JSONL log line into a [`UsageEntry`].
//!
//! Malformed or irrelevant lines yield `None`; nothing here returns an error.
//! Lines are dropped when they are blank, not JSON, lack a timestamp, have a
//! `type` other than `assistant`, or carry neither usage nor a `costUSD`.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;

use crate::models::{LogLine, MessageUsage, UsageEntry};
use crate::pricing::{calculate_entry_cost, BillableTokens, PricingOverrides};

/// Cache-write tokens split by tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheWrites {
    /// Legacy union of both tiers
    pub total: u64,
    pub ephemeral_5m: u64,
    pub ephemeral_1h: u64,
}

/// Split cache writes into tiers.
///
/// A record with per-tier detail is used as-is. Otherwise the flat
/// `cache_creation_input_tokens` value is attributed entirely to the 5m tier;
/// the 1h tier is never filled from the flat field.
pub fn split_cache_writes(usage: &MessageUsage) -> CacheWrites {
    let (detail_5m, detail_1h) = usage
        .cache_creation
        .as_ref()
        .map(|d| {
            (
                d.ephemeral_5m_input_tokens.unwrap_or(0),
                d.ephemeral_1h_input_tokens.unwrap_or(0),
            )
        })
        .unwrap_or((0, 0));
    let detail_sum = detail_5m + detail_1h;
    if detail_sum > 0 {
        CacheWrites {
            total: detail_sum,
            ephemeral_5m: detail_5m,
            ephemeral_1h: detail_1h,
        }
    } else {
        let flat = usage.cache_creation_input_tokens.unwrap_or(0);
        CacheWrites {
            total: flat,
            ephemeral_5m: flat,
            ephemeral_1h: 0,
        }
    }
}

fn session_from_path(source: &str) -> String {
    Path::new(source)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub fn parse_line(line: &str, source: &str, overrides: &PricingOverrides) -> Option<UsageEntry> {
    let t = line.trim();
    if t.is_empty() {
        return None;
    }
    let raw: LogLine = serde_json::from_str(t).ok()?;

    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(raw.timestamp.as_deref()?)
        .ok()?
        .with_timezone(&Utc);

    if let Some(kind) = raw.r#type.as_deref() {
        if kind != "assistant" {
            return None;
        }
    }

    let supplied_cost = raw.cost_usd.filter(|c| c.is_finite() && *c >= 0.0);
    let (model, usage) = match raw.message {
        Some(m) => (m.model, m.usage),
        None => (None, None),
    };
    if usage.is_none() && supplied_cost.is_none() {
        return None;
    }
    let usage = usage.unwrap_or_default();
    let model = model.unwrap_or_else(|| "unknown".to_string());

    let input_tokens = usage.input_tokens.unwrap_or(0);
    let output_tokens = usage.output_tokens.unwrap_or(0);
    let cache_read_tokens = usage.cache_read_input_tokens.unwrap_or(0);
    let cache = split_cache_writes(&usage);

    let cost_usd = match supplied_cost {
        Some(c) => c,
        None => calculate_entry_cost(
            &model,
            &BillableTokens {
                input: input_tokens,
                output: output_tokens,
                cache_write_5m: cache.ephemeral_5m,
                cache_write_1h: cache.ephemeral_1h,
                cache_read: cache_read_tokens,
            },
            overrides,
        ),
    };

    Some(UsageEntry {
        timestamp,
        session_id: raw
            .session_id
            .unwrap_or_else(|| session_from_path(source)),
        request_id: raw.request_id.unwrap_or_default(),
        model,
        input_tokens,
        output_tokens,
        cache_creation_tokens: cache.total,
        cache_write_5m_tokens: cache.ephemeral_5m,
        cache_write_1h_tokens: cache.ephemeral_1h,
        cache_read_tokens,
        cost_usd,
        source: source.to_string(),
    })
}

/// Parse a whole buffer, keeping only the last entry per request id.
///
/// Entries without a request id are all kept, after the deduplicated ones.
pub fn parse_lines(content: &str, source: &str, overrides: &PricingOverrides) -> Vec<UsageEntry> {
    let mut by_request: HashMap<String, UsageEntry> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut anonymous: Vec<UsageEntry> = Vec::new();

    for line in content.lines() {
        let Some(entry) = parse_line(line, source, overrides) else {
            continue;
        };
        if entry.request_id.is_empty() {
            anonymous.push(entry);
        } else {
            if !by_request.contains_key(&entry.request_id) {
                order.push(entry.request_id.clone());
            }
            by_request.insert(entry.request_id.clone(), entry);
        }
    }

    let mut out: Vec<UsageEntry> = order
        .iter()
        .filter_map(|id| by_request.remove(id))
        .collect();
    out.extend(anonymous);
    out
}
