//! Session log discovery under `<root>/<project-id>/<session-id>.jsonl`.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const LOG_EXTENSIONS: [&str; 2] = ["jsonl", "log"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    pub project_dir: String,
    pub session_id: String,
}

/// `~/.claude/projects`
pub fn default_logs_dir() -> PathBuf {
    let home = directories::BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~"));
    home.join(".claude").join("projects")
}

pub fn logs_dir_exists(root: &Path) -> bool {
    root.is_dir()
}

pub fn is_log_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| LOG_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Enumerate session logs one directory below `root`, sorted by path.
///
/// Unreadable directories are skipped; a missing root yields an empty list.
pub fn discover_log_files(root: &Path) -> Vec<LogFile> {
    let mut files: Vec<LogFile> = WalkDir::new(root)
        .min_depth(2)
        .max_depth(2)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_log_file(e.path()))
        .map(|e| {
            let path = e.into_path();
            let project_dir = path
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let session_id = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            LogFile {
                path,
                project_dir,
                session_id,
            }
        })
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}
