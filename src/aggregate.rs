//! Per-model and per-session rollups over a set of entries.

use std::collections::HashMap;
use std::path::Path;

use crate::models::{ModelBreakdown, SessionSummary, UsageEntry};
use crate::pricing::{has_pricing, PricingOverrides};

/// Group by model id, most expensive first.
pub fn model_breakdown(
    entries: &[UsageEntry],
    overrides: &PricingOverrides,
) -> Vec<ModelBreakdown> {
    let mut by_model: HashMap<&str, ModelBreakdown> = HashMap::new();
    for e in entries {
        let m = by_model
            .entry(e.model.as_str())
            .or_insert_with(|| ModelBreakdown {
                model: e.model.clone(),
                input_tokens: 0,
                output_tokens: 0,
                cache_creation_tokens: 0,
                cache_write_5m_tokens: 0,
                cache_write_1h_tokens: 0,
                cache_read_tokens: 0,
                total_tokens: 0,
                total_cost: 0.0,
                entry_count: 0,
                has_pricing: has_pricing(&e.model, overrides),
            });
        m.input_tokens += e.input_tokens;
        m.output_tokens += e.output_tokens;
        m.cache_creation_tokens += e.cache_creation_tokens;
        m.cache_write_5m_tokens += e.cache_write_5m_tokens;
        m.cache_write_1h_tokens += e.cache_write_1h_tokens;
        m.cache_read_tokens += e.cache_read_tokens;
        m.total_tokens += e.total_tokens();
        m.total_cost += e.cost_usd;
        m.entry_count += 1;
    }
    let mut out: Vec<ModelBreakdown> = by_model.into_values().collect();
    out.sort_by(|a, b| {
        b.total_cost
            .total_cmp(&a.total_cost)
            .then_with(|| a.model.cmp(&b.model))
    });
    out
}

fn project_label(source: &str) -> String {
    Path::new(source)
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Group by session id, most recently active first.
pub fn session_summaries(entries: &[UsageEntry]) -> Vec<SessionSummary> {
    let mut by_session: HashMap<&str, SessionSummary> = HashMap::new();
    for e in entries {
        let s = by_session
            .entry(e.session_id.as_str())
            .or_insert_with(|| SessionSummary {
                session_id: e.session_id.clone(),
                project: project_label(&e.source),
                total_cost: 0.0,
                total_tokens: 0,
                entry_count: 0,
                last_activity: e.timestamp,
                model: e.model.clone(),
            });
        s.total_cost += e.cost_usd;
        s.total_tokens += e.total_tokens();
        s.entry_count += 1;
        if e.timestamp >= s.last_activity {
            s.last_activity = e.timestamp;
            s.model = e.model.clone();
        }
    }
    let mut out: Vec<SessionSummary> = by_session.into_values().collect();
    out.sort_by(|a, b| {
        b.last_activity
            .cmp(&a.last_activity)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    out
}

pub fn total_cost(entries: &[UsageEntry]) -> f64 {
    entries.iter().map(|e| e.cost_usd).sum()
}

pub fn total_tokens(entries: &[UsageEntry]) -> u64 {
    entries.iter().map(|e| e.total_tokens()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 17, 10, m, 0).unwrap()
    }

    fn entry(session: &str, model: &str, m: u32, cost: f64, source: &str) -> UsageEntry {
        UsageEntry {
            timestamp: at(m),
            session_id: session.into(),
            request_id: String::new(),
            model: model.into(),
            input_tokens: 100,
            output_tokens: 10,
            cache_creation_tokens: 30,
            cache_write_5m_tokens: 20,
            cache_write_1h_tokens: 10,
            cache_read_tokens: 1,
            cost_usd: cost,
            source: source.into(),
        }
    }

    #[test]
    fn test_model_breakdown_sorted_by_cost() {
        let entries = vec![
            entry("a", "claude-sonnet-4-5", 0, 1.0, "/r/p/a.jsonl"),
            entry("a", "glm-4.7", 1, 0.0, "/r/p/a.jsonl"),
            entry("b", "claude-opus-4-6", 2, 3.0, "/r/p/b.jsonl"),
            entry("b", "claude-sonnet-4-5", 3, 1.5, "/r/p/b.jsonl"),
        ];
        let out = model_breakdown(&entries, &PricingOverrides::new());
        let models: Vec<&str> = out.iter().map(|m| m.model.as_str()).collect();
        assert_eq!(models, vec!["claude-opus-4-6", "claude-sonnet-4-5", "glm-4.7"]);

        let sonnet = &out[1];
        assert_eq!(sonnet.entry_count, 2);
        assert_eq!(sonnet.input_tokens, 200);
        assert_eq!(sonnet.cache_write_5m_tokens, 40);
        assert_eq!(sonnet.cache_write_1h_tokens, 20);
        assert_eq!(sonnet.total_tokens, 2 * 141);
        assert!((sonnet.total_cost - 2.5).abs() < 1e-12);
        assert!(sonnet.has_pricing);
        assert!(!out[2].has_pricing);
    }

    #[test]
    fn test_session_summaries() {
        let entries = vec![
            entry("a", "claude-opus-4-6", 5, 1.0, "/r/proj-x/a.jsonl"),
            entry("a", "claude-haiku-4-5", 20, 1.0, "/r/proj-x/a.jsonl"),
            entry("a", "claude-sonnet-4-5", 10, 1.0, "/r/proj-x/a.jsonl"),
            entry("b", "claude-opus-4-6", 15, 2.0, "b.jsonl"),
        ];
        let out = session_summaries(&entries);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].session_id, "a");
        assert_eq!(out[0].project, "proj-x");
        assert_eq!(out[0].entry_count, 3);
        assert_eq!(out[0].last_activity, at(20));
        // latest entry's model, not the most frequent
        assert_eq!(out[0].model, "claude-haiku-4-5");
        assert_eq!(out[1].project, "unknown");
    }

    #[test]
    fn test_totals() {
        let entries = vec![
            entry("a", "m", 0, 0.25, "/r/p/a.jsonl"),
            entry("a", "m", 1, 0.5, "/r/p/a.jsonl"),
        ];
        assert!((total_cost(&entries) - 0.75).abs() < 1e-12);
        assert_eq!(total_tokens(&entries), 282);
        assert_eq!(total_tokens(&[]), 0);
    }
}
