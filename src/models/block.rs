use crate::models::entry::UsageEntry;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Default, Clone, Debug, PartialEq, Serialize)]
pub struct TokenCounts {
    pub input: u64,
    pub output: u64,
    pub cache_create: u64,
    pub cache_read: u64,
}

impl TokenCounts {
    pub fn add(&mut self, e: &UsageEntry) {
        self.input += e.input_tokens;
        self.output += e.output_tokens;
        self.cache_create += e.cache_creation_tokens;
        self.cache_read += e.cache_read_tokens;
    }

    pub fn total(&self) -> u64 {
        self.input + self.output + self.cache_create + self.cache_read
    }
}

/// A 5-hour billing window.
#[derive(Clone, Debug, PartialEq)]
pub struct BillingBlock {
    /// First entry's timestamp floored to the UTC hour
    pub start: DateTime<Utc>,
    /// `start` + 5h
    pub end: DateTime<Utc>,
    pub is_active: bool,
    /// Entries in timestamp order
    pub entries: Vec<UsageEntry>,
    pub total_cost: f64,
}

impl BillingBlock {
    pub fn tokens(&self) -> TokenCounts {
        let mut t = TokenCounts::default();
        for e in &self.entries {
            t.add(e);
        }
        t
    }
}
