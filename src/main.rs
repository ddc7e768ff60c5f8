use anyhow::{Context, Result};
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info};

use cc_guard::cli::Args;
use cc_guard::config::{load_config, Config};
use cc_guard::display::{print_json_output, print_text_output, WatchStatus};
use cc_guard::logging::init_logging;
use cc_guard::snapshot::Snapshot;
use cc_guard::tailer::LogTailer;
use cc_guard::watcher::LogWatcher;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

fn render(tailer: &LogTailer, args: &Args, config: &Config) -> Result<()> {
    let now = args.now.unwrap_or_else(Utc::now);
    let snap = Snapshot::observe(&tailer.entries(), now, config);
    let status = WatchStatus::from(tailer);
    if args.json {
        print_json_output(&snap, &status, config)?;
    } else {
        print_text_output(&snap, &status, config);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let mut config = load_config(args.config.as_deref());
    config.merge_args(&args);
    let root = config.logs_root();
    debug!(root = %root.display(), mode = config.mode.as_str(), "resolved config");

    let mut tailer = LogTailer::new(&root, config.custom_pricing.clone());
    if let Err(e) = tailer.start() {
        // show the empty dashboard with the error before bailing out
        render(&tailer, &args, &config)?;
        return Err(e).context("cannot start observing");
    }

    if args.once {
        return render(&tailer, &args, &config);
    }

    let mut watcher = LogWatcher::open(&root).context("cannot watch log directory")?;
    info!(root = %root.display(), "watching for new usage");
    let refresh = config.refresh();
    let poll = config.poll();
    let mut next_poll = Instant::now() + poll;

    loop {
        if !args.json {
            print!("{CLEAR_SCREEN}");
        }
        render(&tailer, &args, &config)?;

        let deadline = Instant::now() + refresh;
        loop {
            let now = Instant::now();
            if now >= next_poll {
                tailer.poll();
                next_poll = now + poll;
            }
            if now >= deadline {
                break;
            }
            let wait = deadline.min(next_poll).saturating_duration_since(now);
            if let Some(ev) = watcher.next_event(wait) {
                tailer.handle(ev);
            }
        }
    }
}
