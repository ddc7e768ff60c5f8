use chrono::{DateTime, Utc};
use std::env;
use std::fmt::Write as _;
use std::path::Path;

#[cfg(feature = "colors")]
use owo_colors::OwoColorize;

// Provide a no-op color shim when "colors" feature is disabled
#[cfg(not(feature = "colors"))]
pub mod color_shim {
    use std::fmt::{self, Display, Formatter};

    #[derive(Clone)]
    pub struct Plain(pub String);

    impl Display for Plain {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    pub trait ColorizeShim {
        fn as_str(&self) -> &str;

        fn bright_black(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bright_white(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bright_blue(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bright_cyan(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bright_magenta(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bright_yellow(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn red(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn yellow(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn green(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bold(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn dimmed(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn cyan(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
    }

    impl ColorizeShim for &str {
        fn as_str(&self) -> &str {
            self
        }
    }
    impl ColorizeShim for String {
        fn as_str(&self) -> &str {
            self.as_str()
        }
    }
    impl ColorizeShim for Plain {
        fn as_str(&self) -> &str {
            &self.0
        }
    }
}

#[cfg(not(feature = "colors"))]
use color_shim::ColorizeShim as OwoColorize;

use crate::config::{Config, Mode};
use crate::models::{AlertLevel, ModelBreakdown, Trend};
use crate::snapshot::Snapshot;
use crate::tailer::LogTailer;
use crate::utils::{
    abbreviate_model, format_currency, format_duration, format_path, format_percent,
    format_rate, format_time_ago, format_token_rate, format_tokens, truncate,
};

const SPARK_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const DEFAULT_WIDTH: usize = 80;
const MAX_LIST_ROWS: usize = 5;

/// Watch-side status shown under the dashboard
#[derive(Debug, Clone)]
pub struct WatchStatus<'a> {
    pub root: &'a Path,
    pub files: usize,
    pub entries: usize,
    pub watching: bool,
    pub last_error: Option<&'a str>,
    pub last_update: Option<DateTime<Utc>>,
}

impl<'a> From<&'a LogTailer> for WatchStatus<'a> {
    fn from(t: &'a LogTailer) -> Self {
        Self {
            root: t.root(),
            files: t.file_count(),
            entries: t.entry_count(),
            watching: t.is_watching(),
            last_error: t.last_error(),
            last_update: t.last_update(),
        }
    }
}

pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

fn colors_disabled() -> bool {
    env::var("NO_COLOR").is_ok()
}

fn colorize_percent(pct: f64, config: &Config) -> String {
    let text = format_percent(pct);
    if colors_disabled() {
        return text;
    }
    if pct >= config.critical_threshold {
        text.red().bold().to_string()
    } else if pct >= config.warning_threshold {
        text.yellow().bold().to_string()
    } else {
        text.green().to_string()
    }
}

pub fn model_colored_name(model_id: &str) -> String {
    let display = abbreviate_model(model_id);
    if colors_disabled() {
        return display;
    }
    let lower = model_id.to_lowercase();
    if lower.contains("opus") {
        display.bright_magenta().to_string()
    } else if lower.contains("sonnet") {
        display.bright_yellow().to_string()
    } else if lower.contains("haiku") {
        display.bright_cyan().to_string()
    } else {
        display.bright_white().to_string()
    }
}

/// Render bucket values as block glyphs scaled to the largest bucket
pub fn sparkline(values: &[f64]) -> String {
    let max = values.iter().copied().fold(0.001_f64, f64::max);
    values
        .iter()
        .map(|v| {
            let idx = ((v / max) * (SPARK_CHARS.len() - 1) as f64).floor();
            SPARK_CHARS[(idx.max(0.0) as usize).min(SPARK_CHARS.len() - 1)]
        })
        .collect()
}

pub fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn trend_label(trend: Trend) -> String {
    let text = format!("{} {}", trend.arrow(), trend.as_str());
    if colors_disabled() {
        return text;
    }
    match trend {
        Trend::Rising => text.red().to_string(),
        Trend::Falling => text.green().to_string(),
        Trend::Stable => text.bright_black().to_string(),
    }
}

fn label(s: &str) -> String {
    if colors_disabled() {
        s.to_string()
    } else {
        s.bright_black().dimmed().to_string()
    }
}

/// In/out plus the cache tiers that are non-zero. Entries logged without a
/// 5m/1h split fall back to a flat `CW` figure.
fn token_split(m: &ModelBreakdown) -> String {
    let mut parts = vec![
        format!("{} {}", label("In"), format_tokens(m.input_tokens)),
        format!("{} {}", label("Out"), format_tokens(m.output_tokens)),
    ];
    if m.cache_write_5m_tokens > 0 || m.cache_write_1h_tokens > 0 {
        parts.push(format!("{} {}", label("W5m"), format_tokens(m.cache_write_5m_tokens)));
        parts.push(format!("{} {}", label("W1h"), format_tokens(m.cache_write_1h_tokens)));
    } else if m.cache_creation_tokens > 0 {
        parts.push(format!("{} {}", label("CW"), format_tokens(m.cache_creation_tokens)));
    }
    if m.cache_read_tokens > 0 {
        let cr = format_tokens(m.cache_read_tokens);
        parts.push(format!("{} {}", label("CR"), cr.green()));
    }
    parts.join("  ")
}

/// Build the text dashboard for one snapshot.
pub fn render_text(
    snap: &Snapshot,
    status: &WatchStatus<'_>,
    config: &Config,
    width: usize,
) -> String {
    let mut out = String::new();
    let sep = format!(" {} ", label("·"));

    // header
    let mode = format!("[{}]", config.mode.as_str());
    let _ = writeln!(
        out,
        "{} {} {}",
        "cc-guard".bold(),
        format_path(&status.root.to_string_lossy()).bright_blue(),
        mode.cyan()
    );

    // alert banner
    if config.mode == Mode::Api {
        match snap.alert.level {
            AlertLevel::Critical => {
                let _ = writeln!(out, "{}", format!("✗ {}", snap.alert.message).red().bold());
            }
            AlertLevel::Warning => {
                let _ = writeln!(out, "{}", format!("⚠ {}", snap.alert.message).yellow().bold());
            }
            AlertLevel::None => {}
        }
    }

    let Some(block) = snap.current.as_ref() else {
        let _ = writeln!(out, "{}", label("no active billing block"));
        render_status(&mut out, snap, status, &sep);
        return out;
    };

    // block line
    let bar_width = width.saturating_sub(60).clamp(10, 40);
    let window = format!(
        "{}–{} UTC",
        block.start.format("%H:%M"),
        block.end.format("%H:%M")
    );
    let mut line = format!(
        "{}{} {}",
        label("block "),
        window.bright_white(),
        progress_bar(snap.progress, bar_width)
    );
    let _ = write!(line, " {}", format_percent(snap.progress * 100.0));
    let _ = write!(line, "{sep}{}{}", format_duration(snap.remaining), label(" left"));
    let _ = writeln!(out, "{line}");

    // cost line
    let mut line = format!(
        "{}{}",
        label("cost  "),
        format_currency(snap.block_cost()).bold().bright_white()
    );
    if config.mode == Mode::Api {
        let _ = write!(
            line,
            "{} {}",
            label(&format!(" / {}", format_currency(config.budget_per_block))),
            colorize_percent(snap.alert.percentage, config)
        );
    } else {
        let _ = write!(line, " {}", label("(subscription, informational)"));
    }
    let _ = write!(line, "{sep}{}{}", label("tokens "), format_tokens(snap.block_tokens()));
    if let Some(pct) = snap.token_budget_percent(config) {
        let _ = write!(line, " {}", colorize_percent(pct, config));
    }
    let _ = writeln!(out, "{line}");

    // burn lines
    let b = &snap.burn;
    let _ = writeln!(
        out,
        "{}{} {}{}{}{}{}{} {}",
        label("burn  "),
        format_rate(b.cost_per_hour).bright_white(),
        label("15m "),
        format_rate(b.recent_cost_per_hour),
        sep,
        label("proj "),
        format_currency(b.projected_block_total),
        sep,
        trend_label(b.trend)
    );
    let t = &snap.token_burn;
    let _ = writeln!(
        out,
        "{}{} {}{}{}{}{}",
        label("      "),
        format_token_rate(t.tokens_per_hour),
        label("15m "),
        format_token_rate(t.recent_tokens_per_hour),
        sep,
        label("proj "),
        format_tokens(t.projected_block_tokens.max(0.0).round() as u64)
    );
    let _ = writeln!(out, "{}{}", label("1h    "), sparkline(&b.sparkline).green());

    // models
    if !snap.models.is_empty() {
        let _ = writeln!(out, "{}", label("models"));
        for m in snap.models.iter().take(MAX_LIST_ROWS) {
            let (cost, flag) = if m.has_pricing {
                (format_currency(m.total_cost), String::new())
            } else {
                ("no pricing".to_string(), format!(" {}", "⚠".yellow()))
            };
            let _ = writeln!(
                out,
                "  {}{} {}{}{}{}{} req",
                model_colored_name(&m.model),
                flag,
                cost,
                sep,
                format_tokens(m.total_tokens),
                sep,
                m.entry_count
            );
            let _ = writeln!(out, "    {}", token_split(m));
        }
    }

    // sessions
    if !snap.sessions.is_empty() {
        let _ = writeln!(out, "{}", label("sessions"));
        let name_width = (width / 4).max(12);
        for s in snap.sessions.iter().take(MAX_LIST_ROWS) {
            let _ = writeln!(
                out,
                "  {} {}{}{}{}{}{}{}",
                truncate(&s.project, name_width).bright_blue(),
                label(&truncate(&s.session_id, 8)),
                sep,
                format_currency(s.total_cost),
                sep,
                format_time_ago(s.last_activity, snap.now),
                sep,
                model_colored_name(&s.model)
            );
        }
    }

    render_status(&mut out, snap, status, &sep);
    out
}

fn render_status(out: &mut String, snap: &Snapshot, status: &WatchStatus<'_>, sep: &str) {
    if let Some(err) = status.last_error {
        let _ = writeln!(out, "{}", format!("✗ {err}").red());
    }
    let watching = if status.watching {
        "● watching".green().to_string()
    } else {
        "○ idle".bright_black().to_string()
    };
    let mut line = format!(
        "{watching}{sep}{} file{}{sep}{} entries",
        status.files,
        if status.files == 1 { "" } else { "s" },
        status.entries
    );
    if snap.unpriced_models > 0 {
        let warn = format!(
            "{} unknown model{}",
            snap.unpriced_models,
            if snap.unpriced_models == 1 { "" } else { "s" }
        );
        let _ = write!(line, "{sep}{}", warn.yellow());
    }
    if let Some(at) = status.last_update {
        let updated = format!("updated {}", format_time_ago(at, snap.now));
        let _ = write!(line, "{sep}{}", label(&updated));
    }
    let _ = writeln!(out, "{line}");
}

pub fn print_text_output(snap: &Snapshot, status: &WatchStatus<'_>, config: &Config) {
    print!("{}", render_text(snap, status, config, terminal_width()));
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

pub fn build_json_output(snap: &Snapshot, config: &Config) -> serde_json::Value {
    let block_json = snap.current.as_ref().map(|b| {
        let tokens = b.tokens();
        serde_json::json!({
            "start": b.start.to_rfc3339(),
            "end": b.end.to_rfc3339(),
            "is_active": b.is_active,
            "cost_usd": round4(b.total_cost),
            "entry_count": b.entries.len(),
            "tokens": {
                "input_tokens": tokens.input,
                "output_tokens": tokens.output,
                "cache_creation_input_tokens": tokens.cache_create,
                "cache_read_input_tokens": tokens.cache_read,
                "total_tokens": tokens.total(),
            },
            "progress_percent": round2(snap.progress * 100.0),
            "remaining_minutes": snap.remaining.num_minutes().max(0),
        })
    });

    serde_json::json!({
        "now": snap.now.to_rfc3339(),
        "mode": config.mode.as_str(),
        "block": block_json,
        "blocks_total": snap.blocks.len(),
        "burn_rate": snap.burn,
        "token_burn_rate": snap.token_burn,
        "alert": snap.alert,
        "budget": {
            "per_block_usd": config.budget_per_block,
            "warning_threshold": config.warning_threshold,
            "critical_threshold": config.critical_threshold,
            "alerts_enabled": config.alerts_enabled,
            "tokens_per_block": config.token_budget_per_block,
            "tokens_percent": snap.token_budget_percent(config).map(round2),
        },
        "models": snap.models,
        "sessions": snap.sessions,
        "unpriced_models": snap.unpriced_models,
        "totals": {
            "cost_usd": round4(snap.all_time_cost),
            "tokens": snap.all_time_tokens,
            "entries": snap.entry_count,
        },
    })
}

pub fn build_status_json(status: &WatchStatus<'_>) -> serde_json::Value {
    serde_json::json!({
        "root": status.root.to_string_lossy(),
        "files": status.files,
        "entries": status.entries,
        "watching": status.watching,
        "last_error": status.last_error,
        "last_update": status.last_update.map(|d| d.to_rfc3339()),
    })
}

pub fn print_json_output(
    snap: &Snapshot,
    status: &WatchStatus<'_>,
    config: &Config,
) -> anyhow::Result<()> {
    let mut json = build_json_output(snap, config);
    json["status"] = build_status_json(status);
    println!("{}", serde_json::to_string(&json)?);
    Ok(())
}
