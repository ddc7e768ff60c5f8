use chrono::{DateTime, Utc};
use serde::Serialize;

/// One normalized usage record for a single model invocation.
///
/// Entries are never mutated after parsing; a later streaming chunk with the
/// same request id replaces the indexed entry instead.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UsageEntry {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    /// Dedup key; empty when the record carried none
    pub request_id: String,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Legacy union of the 5m and 1h cache-write tiers
    pub cache_creation_tokens: u64,
    pub cache_write_5m_tokens: u64,
    pub cache_write_1h_tokens: u64,
    pub cache_read_tokens: u64,
    pub cost_usd: f64,
    pub source: String,
}

impl UsageEntry {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_creation_tokens + self.cache_read_tokens
    }
}
