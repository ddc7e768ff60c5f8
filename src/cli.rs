use chrono::{DateTime, Utc};
use std::path::PathBuf;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Pay-per-token API billing; budget alerts apply
    Api,
    /// Subscription plan; costs are informational
    Sub,
}

fn parse_now(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

#[derive(clap::Parser, Debug, Default)]
#[command(
    name = "cc-guard",
    version,
    about = "Live cost and burn-rate monitor for Claude Code sessions"
)]
pub struct Args {
    /// Budget in USD per 5-hour block
    #[arg(short, long)]
    pub budget: Option<f64>,

    /// Disable budget alerts
    #[arg(long)]
    pub no_alert: bool,

    /// Session log root. Defaults to ~/.claude/projects
    #[arg(short = 'd', long, env = "CC_GUARD_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Warning threshold, percent of budget
    #[arg(long)]
    pub warning: Option<f64>,

    /// Critical threshold, percent of budget
    #[arg(long)]
    pub critical: Option<f64>,

    /// Billing mode: api|sub (default: api when ANTHROPIC_API_KEY is set)
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Config file. Defaults to ~/.cc-guard.json
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit a JSON snapshot instead of the text dashboard
    #[arg(long)]
    pub json: bool,

    /// Print one snapshot and exit instead of watching
    #[arg(long)]
    pub once: bool,

    /// Evaluate as of this instant (RFC 3339) instead of the wall clock
    #[arg(long, value_parser = parse_now)]
    pub now: Option<DateTime<Utc>>,

    /// Debug logging to stderr
    #[arg(long, env = "CC_GUARD_DEBUG")]
    pub debug: bool,
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "cc-guard",
            "--budget",
            "20",
            "--no-alert",
            "--mode",
            "sub",
            "--once",
            "--json",
            "--now",
            "2026-02-17T12:00:00Z",
        ])
        .unwrap();
        assert_eq!(args.budget, Some(20.0));
        assert!(args.no_alert);
        assert_eq!(args.mode, Some(ModeArg::Sub));
        assert!(args.once && args.json);
        assert_eq!(args.now.unwrap().to_rfc3339(), "2026-02-17T12:00:00+00:00");
    }

    #[test]
    fn test_bad_now_is_rejected() {
        assert!(Args::try_parse_from(["cc-guard", "--now", "noon"]).is_err());
    }

    #[test]
    fn test_short_aliases() {
        let args =
            Args::try_parse_from(["cc-guard", "-b", "7.5", "-d", "/tmp/logs", "-m", "api"])
                .unwrap();
        assert_eq!(args.budget, Some(7.5));
        assert_eq!(args.log_dir, Some(PathBuf::from("/tmp/logs")));
        assert_eq!(args.mode, Some(ModeArg::Api));
    }
}
