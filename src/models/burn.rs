use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    #[default]
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Stable => "stable",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Self::Rising => "↑",
            Self::Falling => "↓",
            Self::Stable => "→",
        }
    }
}

/// Cost burn for the active block. Recomputed on every observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BurnRate {
    pub cost_per_hour: f64,
    /// Over the trailing 15 minutes
    pub recent_cost_per_hour: f64,
    pub projected_block_total: f64,
    pub trend: Trend,
    /// 30 two-minute buckets covering the last hour
    pub sparkline: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TokenBurnRate {
    pub tokens_per_hour: f64,
    pub recent_tokens_per_hour: f64,
    pub projected_block_tokens: f64,
    pub trend: Trend,
    pub sparkline: Vec<f64>,
}
