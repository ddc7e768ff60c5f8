//! Raw shape of one assistant log line.
//!
//! Streaming responses are logged as several lines sharing a `requestId`;
//! only `type = "assistant"` lines carry usage.

use serde::Deserialize;

#[derive(Deserialize, Debug, Default)]
pub struct CacheCreationDetail {
    #[serde(default)]
    pub ephemeral_5m_input_tokens: Option<u64>,
    #[serde(default)]
    pub ephemeral_1h_input_tokens: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
pub struct MessageUsage {
    #[serde(default)]
    pub input_tokens: Option<u64>,
    #[serde(default)]
    pub output_tokens: Option<u64>,
    #[serde(default)]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default)]
    pub cache_read_input_tokens: Option<u64>,
    #[serde(default)]
    pub cache_creation: Option<CacheCreationDetail>,
}

#[derive(Deserialize, Debug)]
pub struct MessageObj {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<MessageUsage>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LogLine {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub message: Option<MessageObj>,
    /// Precomputed cost, honored as-is when present
    #[serde(default, rename = "costUSD")]
    pub cost_usd: Option<f64>,
}
