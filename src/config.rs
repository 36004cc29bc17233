use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Origin that a relative `apiUrl` is resolved against.
    #[serde(default = "default_origin")]
    pub origin: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
        }
    }
}

fn default_origin() -> String {
    "http://127.0.0.1:8000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateConfig {
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fehres")
        .join("state.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    /// Plain JSON calls (listing, search, info, acknowledgements).
    #[serde(default = "default_request_secs")]
    pub request_secs: u64,
    /// OCR / prescription analysis uploads.
    #[serde(default = "default_analysis_secs")]
    pub analysis_secs: u64,
    /// Scrape, processing, index push and answer generation.
    #[serde(default = "default_long_running_secs")]
    pub long_running_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: default_request_secs(),
            analysis_secs: default_analysis_secs(),
            long_running_secs: default_long_running_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
    pub fn analysis(&self) -> Duration {
        Duration::from_secs(self.analysis_secs)
    }
    pub fn long_running(&self) -> Duration {
        Duration::from_secs(self.long_running_secs)
    }
}

fn default_request_secs() -> u64 {
    30
}
fn default_analysis_secs() -> u64 {
    180
}
fn default_long_running_secs() -> u64 {
    600
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Recent user/assistant messages sent along with a question.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Context chunks retrieved per answer.
    #[serde(default = "default_answer_limit")]
    pub answer_limit: i64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            answer_limit: default_answer_limit(),
        }
    }
}

fn default_history_window() -> usize {
    10
}
fn default_answer_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_search_limit")]
    pub default_limit: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
        }
    }
}

fn default_search_limit() -> i64 {
    5
}

impl Config {
    /// Defaults for every section, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

/// Load the config at `path`, or [`Config::minimal`] when the file does
/// not exist.
pub fn load_or_minimal(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        Ok(Config::minimal())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content)?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate timeouts
    if config.timeouts.request_secs == 0
        || config.timeouts.analysis_secs == 0
        || config.timeouts.long_running_secs == 0
    {
        anyhow::bail!("timeouts must be > 0 seconds");
    }

    // Validate chat
    if config.chat.history_window > fehres_core::store::CHAT_HISTORY_LIMIT {
        anyhow::bail!(
            "chat.history_window must be <= {}",
            fehres_core::store::CHAT_HISTORY_LIMIT
        );
    }
    if !(1..=20).contains(&config.chat.answer_limit) {
        anyhow::bail!("chat.answer_limit must be in [1, 20]");
    }

    // Validate search
    if !(1..=20).contains(&config.search.default_limit) {
        anyhow::bail!("search.default_limit must be in [1, 20]");
    }

    if reqwest::Url::parse(&config.client.origin).is_err() {
        anyhow::bail!(
            "client.origin must be an absolute URL, got '{}'",
            config.client.origin
        );
    }

    Ok(config)
}
