use chrono::{DateTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

pub const BLOCK_DURATION_HOURS: i64 = 5;
pub const BLOCK_DURATION_SECONDS: i64 = BLOCK_DURATION_HOURS * 60 * 60;

pub fn format_path(p: &str) -> String {
    if let Some(b) = directories::BaseDirs::new() {
        let home_s = b.home_dir().to_string_lossy();
        if let Some(rest) = p.strip_prefix(&*home_s) {
            return format!("~{rest}");
        }
    }
    p.to_owned()
}

/// More decimals for small amounts so sub-cent costs stay visible
pub fn format_currency(v: f64) -> String {
    if v < 0.01 {
        format!("${v:.4}")
    } else if v < 1.0 {
        format!("${v:.3}")
    } else {
        format!("${v:.2}")
    }
}

pub fn format_tokens(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.1}B", n as f64 / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1e6)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1e3)
    } else {
        n.to_string()
    }
}

pub fn format_duration(d: TimeDelta) -> String {
    let secs = d.num_seconds().max(0);
    let (h, m) = (secs / 3600, (secs / 60) % 60);
    if h > 0 {
        format!("{h}h {m}m")
    } else if m > 0 {
        format!("{m}m")
    } else {
        format!("{secs}s")
    }
}

pub fn format_percent(v: f64) -> String {
    format!("{}%", v.round())
}

pub fn format_rate(usd_per_hour: f64) -> String {
    format!("{}/hr", format_currency(usd_per_hour))
}

pub fn format_token_rate(tokens_per_hour: f64) -> String {
    format!("{}/hr", format_tokens(tokens_per_hour.max(0.0).round() as u64))
}

pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let mins = (now - then).num_minutes();
    if mins >= 60 {
        format!("{}h ago", mins / 60)
    } else if mins > 0 {
        format!("{mins}m ago")
    } else {
        "just now".to_string()
    }
}

// claude-3-7-sonnet-20250219
static OLD_MODEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\D)(\d)(?:-(\d+))?-(opus|sonnet|haiku)").unwrap());
// claude-sonnet-4-5-20250929
static NEW_MODEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(opus|sonnet|haiku)-(\d+)(?:-(\d+))?").unwrap());

/// Compact model label, e.g. `claude-sonnet-4-5-20250929` -> `sonnet-4.5`.
///
/// Ids without a known family are returned unchanged.
pub fn abbreviate_model(model_id: &str) -> String {
    let lower = model_id.to_lowercase();
    let label = |family: &str, major: &str, minor: Option<&str>| match minor {
        Some(m) => format!("{family}-{major}.{m}"),
        None => format!("{family}-{major}"),
    };
    if let Some(c) = OLD_MODEL_RE.captures(&lower) {
        return label(&c[3], &c[1], c.get(2).map(|m| m.as_str()));
    }
    if let Some(c) = NEW_MODEL_RE.captures(&lower) {
        // a 4+ digit suffix is a date stamp, not a minor version
        let minor = c.get(3).map(|m| m.as_str()).filter(|m| m.len() < 4);
        return label(&c[1], &c[2], minor);
    }
    model_id.to_string()
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_len.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0012), "$0.0012");
        assert_eq!(format_currency(0.125), "$0.125");
        assert_eq!(format_currency(12.5), "$12.50");
        assert_eq!(format_rate(2.0), "$2.00/hr");
    }

    #[test]
    fn test_format_tokens() {
        assert_eq!(format_tokens(999), "999");
        assert_eq!(format_tokens(1_500), "1.5K");
        assert_eq!(format_tokens(2_500_000), "2.5M");
        assert_eq!(format_token_rate(1_500.4), "1.5K/hr");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(TimeDelta::minutes(150)), "2h 30m");
        assert_eq!(format_duration(TimeDelta::minutes(45)), "45m");
        assert_eq!(format_duration(TimeDelta::seconds(12)), "12s");
        assert_eq!(format_duration(TimeDelta::seconds(-5)), "0s");
    }

    #[test]
    fn test_format_time_ago() {
        let now = Utc.with_ymd_and_hms(2026, 2, 17, 12, 0, 0).unwrap();
        assert_eq!(format_time_ago(now, now), "just now");
        assert_eq!(format_time_ago(now - TimeDelta::minutes(5), now), "5m ago");
        assert_eq!(format_time_ago(now - TimeDelta::minutes(130), now), "2h ago");
    }

    #[test]
    fn test_abbreviate_model() {
        assert_eq!(abbreviate_model("claude-opus-4-6"), "opus-4.6");
        assert_eq!(abbreviate_model("claude-sonnet-4-20250514"), "sonnet-4");
        assert_eq!(abbreviate_model("claude-sonnet-4-5-20250929"), "sonnet-4.5");
        assert_eq!(abbreviate_model("claude-3-7-sonnet-20250219"), "sonnet-3.7");
        assert_eq!(abbreviate_model("claude-3-haiku-20240307"), "haiku-3");
        assert_eq!(abbreviate_model("glm-4.7"), "glm-4.7");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(format_percent(83.6), "84%");
    }
}
