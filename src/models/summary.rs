use chrono::{DateTime, Utc};
use serde::Serialize;

/// Token and cost totals for one model id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelBreakdown {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_write_5m_tokens: u64,
    pub cache_write_1h_tokens: u64,
    pub cache_read_tokens: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub entry_count: usize,
    /// False when no price could be resolved; costs for this model read as 0
    pub has_pricing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    /// Parent directory name of the session's log file
    pub project: String,
    pub total_cost: f64,
    pub total_tokens: u64,
    pub entry_count: usize,
    pub last_activity: DateTime<Utc>,
    /// Model of the most recent entry, not the most frequent one
    pub model: String,
}
