//! One observation of the entry set at a given instant.
//!
//! Everything here is recomputed from scratch on each call; nothing carries
//! over between observations.

use chrono::{DateTime, TimeDelta, Utc};

use crate::aggregate::{model_breakdown, session_summaries, total_cost, total_tokens};
use crate::alert::evaluate_alert;
use crate::blocks::{block_progress, block_remaining, compute_blocks};
use crate::burn_rate::{calculate_burn_rate, calculate_token_burn_rate};
use crate::config::Config;
use crate::models::{
    BillingBlock, BudgetAlert, BurnRate, ModelBreakdown, SessionSummary, TokenBurnRate,
    UsageEntry,
};

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub now: DateTime<Utc>,
    pub blocks: Vec<BillingBlock>,
    pub current: Option<BillingBlock>,
    pub progress: f64,
    pub remaining: TimeDelta,
    pub burn: BurnRate,
    pub token_burn: TokenBurnRate,
    /// Over the active block's entries
    pub models: Vec<ModelBreakdown>,
    /// Over the active block's entries
    pub sessions: Vec<SessionSummary>,
    pub all_time_cost: f64,
    pub all_time_tokens: u64,
    pub entry_count: usize,
    pub alert: BudgetAlert,
    pub unpriced_models: usize,
}

impl Snapshot {
    pub fn observe(entries: &[UsageEntry], now: DateTime<Utc>, config: &Config) -> Self {
        let blocks = compute_blocks(entries, now);
        let current = blocks.last().filter(|b| b.is_active).cloned();

        let (progress, remaining, burn, token_burn, models, sessions) = match current {
            Some(ref b) => (
                block_progress(b, now),
                block_remaining(b, now),
                calculate_burn_rate(b, now),
                calculate_token_burn_rate(b, now),
                model_breakdown(&b.entries, &config.custom_pricing),
                session_summaries(&b.entries),
            ),
            None => (
                0.0,
                TimeDelta::zero(),
                BurnRate::default(),
                TokenBurnRate::default(),
                Vec::new(),
                Vec::new(),
            ),
        };

        let block_cost = current.as_ref().map(|b| b.total_cost).unwrap_or(0.0);
        let alert = evaluate_alert(block_cost, &config.alert_config());
        let unpriced_models = models.iter().filter(|m| !m.has_pricing).count();

        Self {
            now,
            current,
            progress,
            remaining,
            burn,
            token_burn,
            models,
            sessions,
            all_time_cost: total_cost(entries),
            all_time_tokens: total_tokens(entries),
            entry_count: entries.len(),
            alert,
            unpriced_models,
            blocks,
        }
    }

    pub fn block_cost(&self) -> f64 {
        self.current.as_ref().map(|b| b.total_cost).unwrap_or(0.0)
    }

    pub fn block_tokens(&self) -> u64 {
        self.current.as_ref().map(|b| b.tokens().total()).unwrap_or(0)
    }

    /// Share of the token budget used, when one is configured
    pub fn token_budget_percent(&self, config: &Config) -> Option<f64> {
        config
            .token_budget_per_block
            .filter(|b| *b > 0.0)
            .map(|b| self.block_tokens() as f64 / b * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertLevel;
    use chrono::TimeZone;
    use serial_test::serial;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 17, h, m, 0).unwrap()
    }

    fn entry(ts: DateTime<Utc>, model: &str, cost: f64) -> UsageEntry {
        UsageEntry {
            timestamp: ts,
            session_id: "s1".into(),
            request_id: String::new(),
            model: model.into(),
            input_tokens: 1000,
            output_tokens: 0,
            cache_creation_tokens: 0,
            cache_write_5m_tokens: 0,
            cache_write_1h_tokens: 0,
            cache_read_tokens: 0,
            cost_usd: cost,
            source: "/logs/proj/s1.jsonl".into(),
        }
    }

    fn config() -> Config {
        Config {
            budget_per_block: 10.0,
            token_budget_per_block: Some(4000.0),
            ..Config::default()
        }
    }

    #[test]
    #[serial]
    fn test_observe_active_block() {
        let entries = vec![
            entry(at(4, 0), "claude-opus-4-6", 100.0),
            entry(at(10, 0), "claude-opus-4-6", 6.0),
            entry(at(11, 0), "glm-4.7", 3.0),
        ];
        let snap = Snapshot::observe(&entries, at(12, 0), &config());

        assert_eq!(snap.blocks.len(), 2);
        let cur = snap.current.as_ref().unwrap();
        assert_eq!(cur.start, at(10, 0));
        assert!((snap.block_cost() - 9.0).abs() < 1e-9);
        assert!((snap.progress - 0.4).abs() < 1e-9);
        assert_eq!(snap.remaining, TimeDelta::hours(3));
        assert_eq!(snap.alert.level, AlertLevel::Warning);
        assert_eq!(snap.models.len(), 2);
        assert_eq!(snap.unpriced_models, 1);
        assert_eq!(snap.sessions.len(), 1);
        assert!((snap.all_time_cost - 109.0).abs() < 1e-9);
        assert_eq!(snap.all_time_tokens, 3000);
        assert_eq!(snap.token_budget_percent(&config()), Some(50.0));
    }

    #[test]
    #[serial]
    fn test_observe_without_active_block() {
        let entries = vec![entry(at(4, 0), "claude-opus-4-6", 1.0)];
        let snap = Snapshot::observe(&entries, at(12, 0), &config());
        assert!(snap.current.is_none());
        assert_eq!(snap.burn, BurnRate::default());
        assert_eq!(snap.progress, 0.0);
        assert_eq!(snap.alert.level, AlertLevel::None);
        assert!(snap.models.is_empty());
        assert_eq!(snap.entry_count, 1);
    }
}
