//! Content fetch — loads retrieved documents into one context blob.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Resolve `path` against `root` unless it is already absolute.
fn resolve_path(root: Option<&Path>, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    match root {
        Some(root) if candidate.is_relative() => root.join(candidate),
        _ => candidate.to_path_buf(),
    }
}

/// Read every path that exists and join the contents with `\n`.
///
/// Missing or unreadable files are skipped with a warning. The result is an
/// empty string when nothing could be read.
pub async fn fetch_documents(root: Option<&Path>, paths: &[String]) -> String {
    let mut contents = Vec::with_capacity(paths.len());

    for path in paths {
        let full = resolve_path(root, path);
        match tokio::fs::try_exists(&full).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("File not found: {}", full.display());
                continue;
            }
            Err(e) => {
                warn!("cannot check {}: {e}", full.display());
                continue;
            }
        }
        match tokio::fs::read_to_string(&full).await {
            Ok(text) => contents.push(text),
            Err(e) => warn!("cannot read {}: {e}", full.display()),
        }
    }

    contents.join("\n")
}
