use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::markup::protector::validate_tag_name;
use crate::translation::coordinator::RetryPolicy;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Chunking config
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Checkpoint config
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Mistral (OpenAI-compatible chat completions)
    #[default]
    Mistral,
    // @provider: OpenAI
    OpenAI,
    // @provider: DeepSeek (OpenAI-compatible chat completions)
    DeepSeek,
    // @provider: Kimi / Moonshot (OpenAI-compatible chat completions)
    Kimi,
    // @provider: Anthropic
    Anthropic,
}

impl TranslationProvider {
    /// Every supported provider, in display order
    pub const ALL: [TranslationProvider; 5] = [
        Self::Mistral,
        Self::OpenAI,
        Self::DeepSeek,
        Self::Kimi,
        Self::Anthropic,
    ];

    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Mistral => "Mistral",
            Self::OpenAI => "OpenAI",
            Self::DeepSeek => "DeepSeek",
            Self::Kimi => "Kimi",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Mistral => "mistral".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::DeepSeek => "deepseek".to_string(),
            Self::Kimi => "kimi".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }

    /// Environment variable consulted when no API key is configured
    pub fn api_key_env_var(&self) -> String {
        format!("{}_API_KEY", self.to_lowercase_string().to_uppercase())
    }

    /// Whether the provider speaks the OpenAI chat completions protocol
    pub fn is_openai_compatible(&self) -> bool {
        !matches!(self, Self::Anthropic)
    }

    fn default_model(&self) -> String {
        match self {
            Self::Mistral => "mistral-small-latest",
            Self::OpenAI => "gpt-4o-mini",
            Self::DeepSeek => "deepseek-chat",
            Self::Kimi => "moonshot-v1-auto",
            Self::Anthropic => "claude-3-5-haiku-latest",
        }
        .to_string()
    }

    fn default_endpoint(&self) -> String {
        match self {
            Self::Mistral => "https://api.mistral.ai/v1",
            Self::OpenAI => "https://api.openai.com/v1",
            Self::DeepSeek => "https://api.deepseek.com/v1",
            Self::Kimi => "https://api.moonshot.cn/v1",
            Self::Anthropic => "https://api.anthropic.com",
        }
        .to_string()
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mistral" => Ok(Self::Mistral),
            "openai" => Ok(Self::OpenAI),
            "deepseek" => Ok(Self::DeepSeek),
            "kimi" | "moonshot" => Ok(Self::Kimi),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key; empty means read <PROVIDER>_API_KEY
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: provider_type.default_model(),
            api_key: String::new(),
            endpoint: provider_type.default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt template for translation
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Minimum delay in milliseconds between consecutive requests
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Attempts per chunk before it is left untranslated
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff before the first retry (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Upper bound on the retry backoff (in milliseconds)
    #[serde(default = "default_retry_backoff_max_ms")]
    pub retry_backoff_max_ms: u64,

    /// Temperature parameter for text generation (0.0 to 2.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            cooldown_ms: default_cooldown_ms(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            retry_backoff_max_ms: default_retry_backoff_max_ms(),
            temperature: default_temperature(),
        }
    }
}

/// How documents are cut into translation requests
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Maximum tokens per chunk
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,

    /// Characters per token for the built-in token estimator
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,

    /// Tag names protected in addition to the built-in set
    #[serde(default)]
    pub extra_ignore_tags: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            token_budget: default_token_budget(),
            chars_per_token: default_chars_per_token(),
            extra_ignore_tags: Vec::new(),
        }
    }
}

/// Resumable run settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CheckpointConfig {
    /// Whether finished sub-files are recorded and skipped on rerun
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path of the checkpoint state file
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            state_file: default_state_file(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "zh".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_cooldown_ms() -> u64 {
    3000
}

fn default_retry_count() -> u32 {
    10
}

fn default_retry_backoff_ms() -> u64 {
    10_000
}

fn default_retry_backoff_max_ms() -> u64 {
    30_000
}

fn default_temperature() -> f32 {
    0.1
}

fn default_token_budget() -> usize {
    6000
}

fn default_chars_per_token() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_state_file() -> PathBuf {
    PathBuf::from(".translation_state.json")
}

fn default_system_prompt() -> String {
    "You are an expert XML/HTML translator. Translate the text content of the HTML snippet \
     provided by the user from {source_language} to {target_language}.\n\
     - Translate ONLY the text that appears between tags.\n\
     - Preserve ALL tags and attributes exactly as they appear. No tag or attribute may be lost, added or changed.\n\
     - Copy every placeholder of the form {XXXXXXXX} (eight letters or digits in braces) unchanged.\n\
     - Respond with the translated HTML only: no explanations, no markdown, no code block markers."
        .to_string()
}

impl Config {
    /// Load the configuration at `path`, writing a default file if none exists
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            return serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()));
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json =
            serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;
        if crate::language_utils::language_codes_match(&self.source_language, &self.target_language) {
            return Err(anyhow!(
                "Source and target language are both '{}'",
                self.source_language
            ));
        }

        if self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider (set it in the config or {})",
                self.translation.provider.display_name(),
                self.translation.provider.api_key_env_var()
            ));
        }

        let common = &self.translation.common;
        if common.retry_count == 0 {
            return Err(anyhow!("retry_count must allow at least one attempt"));
        }
        if !(0.0..=2.0).contains(&common.temperature) {
            return Err(anyhow!("temperature must be between 0.0 and 2.0, got {}", common.temperature));
        }

        if self.chunking.token_budget == 0 {
            return Err(anyhow!("chunking.token_budget must be greater than zero"));
        }
        if self.chunking.chars_per_token == 0 {
            return Err(anyhow!("chunking.chars_per_token must be greater than zero"));
        }
        for tag in &self.chunking.extra_ignore_tags {
            validate_tag_name(tag)?;
        }

        Ok(())
    }

    /// Retry schedule for chunk translation
    pub fn retry_policy(&self) -> RetryPolicy {
        let common = &self.translation.common;
        RetryPolicy {
            max_attempts: common.retry_count,
            backoff_base: Duration::from_millis(common.retry_backoff_ms),
            backoff_max: Duration::from_millis(common.retry_backoff_max_ms),
        }
    }

    /// Minimum spacing between provider requests
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.translation.common.cooldown_ms)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            chunking: ChunkingConfig::default(),
            checkpoint: CheckpointConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable configuration of the active provider, created with defaults when absent
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        match self
            .available_providers
            .iter()
            .position(|p| p.provider_type == provider_str)
        {
            Some(index) => &mut self.available_providers[index],
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider));
                let last = self.available_providers.len() - 1;
                &mut self.available_providers[last]
            }
        }
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.model.clone())
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Get the API key for the active provider, falling back to the environment
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var(self.provider.api_key_env_var()).ok())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.endpoint.clone())
            .filter(|endpoint| !endpoint.is_empty())
            .unwrap_or_else(|| self.provider.default_endpoint())
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout(&self) -> Duration {
        let secs = self
            .get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or_else(default_timeout_secs);
        Duration::from_secs(secs)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: TranslationProvider::ALL
                .iter()
                .map(|provider| ProviderConfig::new(*provider))
                .collect(),
            common: TranslationCommonConfig::default(),
        }
    }
}
