//! Path lookup — asks an external ranking process for candidate documents.
//!
//! The process receives the search query as its last argument and prints one
//! path per line, best match first. Any failure degrades to "no paths".

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

/// Source of ranked document paths for a search query.
#[async_trait]
pub trait PathLookup: Send + Sync {
    async fn lookup(&self, query: &str) -> Vec<String>;
}

/// Runs a retrieval command and reads ranked paths from its stdout.
#[derive(Debug, Clone)]
pub struct ProcessLookup {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeout: Duration,
}

impl ProcessLookup {
    /// `program args... <query>`.
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
            timeout,
        }
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }
}

#[async_trait]
impl PathLookup for ProcessLookup {
    async fn lookup(&self, query: &str) -> Vec<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(query)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        // `output()` drains stdout/stderr before waiting on exit.
        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(program = %self.program, "retrieval process failed to run: {e}");
                return Vec::new();
            }
            Err(_) => {
                warn!(
                    program = %self.program,
                    "retrieval process timed out after {:?}", self.timeout
                );
                return Vec::new();
            }
        };

        if !output.status.success() {
            warn!(
                program = %self.program,
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "retrieval process exited unsuccessfully"
            );
            return Vec::new();
        }

        let stdout = match String::from_utf8(output.stdout) {
            Ok(s) => s,
            Err(e) => {
                warn!(program = %self.program, "retrieval output is not UTF-8: {e}");
                return Vec::new();
            }
        };

        let paths = parse_paths(&stdout);
        debug!(count = paths.len(), %query, "retrieval returned paths");
        paths
    }
}

/// One path per non-blank line, order preserved.
pub fn parse_paths(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
