//! TOML configuration parsing.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
}

/// Settings for the OpenAI-backed collaborators (chat oracle + embedder).
///
/// The API key itself is never configured here; both providers read
/// `OPENAI_API_KEY` from the environment.
#[derive(Debug, Deserialize, Clone)]
pub struct OpenAiConfig {
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            dims: default_dims(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_dims() -> usize {
    1536
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Pages kept by the page-level search.
    #[serde(default = "default_page_k")]
    pub page_k: usize,
    /// Words per chunk for the chunk-level search.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            page_k: default_page_k(),
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_page_k() -> usize {
    4
}
fn default_chunk_size() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnswerConfig {
    /// Per-text word cap applied on the degraded-context retry.
    #[serde(default = "default_truncate_words")]
    pub truncate_words: usize,
    /// Context word budget for the truncation answer strategy.
    #[serde(default = "default_context_words")]
    pub context_words: usize,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            truncate_words: default_truncate_words(),
            context_words: default_context_words(),
        }
    }
}

fn default_truncate_words() -> usize {
    256
}
fn default_context_words() -> usize {
    3000
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.retrieval.page_k == 0 {
        anyhow::bail!("retrieval.page_k must be >= 1");
    }
    if config.retrieval.chunk_size == 0 {
        anyhow::bail!("retrieval.chunk_size must be >= 1");
    }
    if config.openai.dims == 0 {
        anyhow::bail!("openai.dims must be > 0");
    }
    if config.answer.truncate_words == 0 {
        anyhow::bail!("answer.truncate_words must be >= 1");
    }

    Ok(config)
}

/// Load the config file when it exists, fall back to defaults otherwise.
///
/// The `dqa` CLI works out of the box without a config file; the file is
/// only needed to override models or retrieval parameters.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        Ok(Config::default())
    }
}
