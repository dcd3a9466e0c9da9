//! Runtime configuration.
//!
//! Layers, lowest to highest priority: built-in defaults, optional YAML file,
//! environment (`OPENAI_TOKEN`, `OPENAI_MODEL`, `OPENAI_BASE_URL`), CLI flags
//! (applied by the binary). The API credential only comes from the
//! environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::agent::orchestrator::DEFAULT_MAX_TOOL_ROUNDS;
use crate::agent::prompts::SYSTEM_PROMPT;
use crate::llm::client::DEFAULT_BASE_URL;

pub const API_KEY_VAR: &str = "OPENAI_TOKEN";
pub const MODEL_VAR: &str = "OPENAI_MODEL";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";

/// Configuration errors. All are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing OPENAI_TOKEN environment variable")]
    MissingApiKey,

    #[error("no model configured (set OPENAI_MODEL, pass --model, or set `model` in the config file)")]
    MissingModel,

    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Retrieval command settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrieverConfig {
    /// Executable to run.
    pub program: String,
    /// Arguments placed before the query.
    pub args: Vec<String>,
    /// Working directory for the process.
    pub working_dir: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            program: "python3".into(),
            args: vec!["query.py".into()],
            working_dir: None,
            timeout_secs: 30,
        }
    }
}

impl RetrieverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Contents of the YAML file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tool_rounds: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub documents_root: Option<PathBuf>,
    pub retriever: RetrieverConfig,
}

impl FileConfig {
    pub fn from_yaml(yaml: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&yaml, path)
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub system_prompt: String,
    pub temperature: Option<f32>,
    pub max_tool_rounds: usize,
    pub request_timeout: Duration,
    pub documents_root: Option<PathBuf>,
    pub retriever: RetrieverConfig,
}

impl Config {
    /// Resolve from a file config and an environment lookup. `model_override`
    /// (the `--model` flag) beats both.
    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        model_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(API_KEY_VAR).ok_or(ConfigError::MissingApiKey)?;
        let model = model_override
            .filter(|m| !m.trim().is_empty())
            .or_else(|| non_empty(MODEL_VAR))
            .or(file.model)
            .ok_or(ConfigError::MissingModel)?;
        let base_url = non_empty(BASE_URL_VAR)
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            api_key,
            model,
            base_url,
            system_prompt: file.system_prompt.unwrap_or_else(|| SYSTEM_PROMPT.to_string()),
            temperature: file.temperature,
            max_tool_rounds: file.max_tool_rounds.unwrap_or(DEFAULT_MAX_TOOL_ROUNDS),
            request_timeout: Duration::from_secs(file.request_timeout_secs.unwrap_or(120)),
            documents_root: file.documents_root,
            retriever: file.retriever,
        })
    }

    /// Load the optional file and read the process environment.
    pub fn load(path: Option<&Path>, model_override: Option<String>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => FileConfig::load(p)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok(), model_override)
    }
}
