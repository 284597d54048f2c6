//! Configuration loading, validation, and management for cvrag.
//!
//! Loads configuration from `~/.cvrag/config.toml` (or an explicit path) with
//! environment variable overrides. Validates all settings at startup so that a
//! bad language tag or budget stops the process before any request is served.

use cvrag_core::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.cvrag/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Max tokens per LLM response (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_tokens: Option<u32>,

    /// Answer language
    #[serde(default)]
    pub language: Language,

    /// Model client timeout and retry policy
    #[serde(default)]
    pub client: ClientConfig,

    /// Pipeline budgets and limits
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Content index and retrieval settings
    #[serde(default)]
    pub index: IndexConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_temperature() -> f32 {
    0.7
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("language", &self.language)
            .field("client", &self.client)
            .field("pipeline", &self.pipeline)
            .field("index", &self.index)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Timeout and retry policy applied by the model client to every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt (total attempts = max_retries + 1)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    2
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum combined characters of fragments passed to the answer prompt
    #[serde(default = "default_context_budget")]
    pub context_budget_chars: usize,

    /// Messages retained per conversation
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Longest accepted question, in characters
    #[serde(default = "default_max_question_chars")]
    pub max_question_chars: usize,

    /// Number of retrieved fragments previewed in the result
    #[serde(default = "default_preview_count")]
    pub preview_count: usize,

    /// Characters kept per preview
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

fn default_context_budget() -> usize {
    4000
}
fn default_history_limit() -> usize {
    20
}
fn default_max_question_chars() -> usize {
    5000
}
fn default_preview_count() -> usize {
    5
}
fn default_preview_chars() -> usize {
    300
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            context_budget_chars: default_context_budget(),
            history_limit: default_history_limit(),
            max_question_chars: default_max_question_chars(),
            preview_count: default_preview_count(),
            preview_chars: default_preview_chars(),
        }
    }
}

/// How queries are matched against the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Embedding similarity with MMR re-ranking
    Vector,
    /// Term overlap, no embeddings needed
    #[default]
    Keyword,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory holding `index.json`
    #[serde(default = "default_index_dir")]
    pub dir: PathBuf,

    #[serde(default)]
    pub mode: RetrievalMode,

    /// Provider used for query embeddings (defaults to `default_provider`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_provider: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Fragments returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Candidates considered before MMR selection
    #[serde(default = "default_fetch_k")]
    pub fetch_k: usize,

    /// MMR trade-off: 1.0 = pure relevance, 0.0 = pure diversity
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f32,
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("index_faiss_linkedin")
}
fn default_embedding_model() -> String {
    "BAAI/bge-m3".into()
}
fn default_top_k() -> usize {
    3
}
fn default_fetch_k() -> usize {
    4
}
fn default_mmr_lambda() -> f32 {
    0.5
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: default_index_dir(),
            mode: RetrievalMode::default(),
            embedding_provider: None,
            embedding_model: default_embedding_model(),
            top_k: default_top_k(),
            fetch_k: default_fetch_k(),
            mmr_lambda: default_mmr_lambda(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.cvrag/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_at(&Self::config_dir().join("config.toml"))
    }

    /// Load configuration from `path`, then apply environment overrides:
    /// - `CVRAG_API_KEY`, `GROQ_API_KEY`, `OPENAI_API_KEY` (first found wins)
    /// - `CVRAG_PROVIDER`, `CVRAG_MODEL`, `CVRAG_LANGUAGE`, `CVRAG_INDEX_DIR`
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, without env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.api_key.is_none() {
            self.api_key = lookup("CVRAG_API_KEY")
                .or_else(|| lookup("GROQ_API_KEY"))
                .or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("CVRAG_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("CVRAG_MODEL") {
            self.default_model = model;
        }

        if let Some(tag) = lookup("CVRAG_LANGUAGE") {
            self.language = tag
                .parse()
                .map_err(|e: cvrag_core::UnknownLanguage| ConfigError::ValidationError(e.to_string()))?;
        }

        if let Some(dir) = lookup("CVRAG_INDEX_DIR") {
            self.index.dir = PathBuf::from(dir);
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".cvrag")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.client.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "client.timeout_secs must be > 0".into(),
            ));
        }

        let pipeline = &self.pipeline;
        if pipeline.context_budget_chars == 0
            || pipeline.history_limit == 0
            || pipeline.max_question_chars == 0
        {
            return Err(ConfigError::ValidationError(
                "pipeline budgets and limits must be > 0".into(),
            ));
        }

        if self.index.top_k == 0 {
            return Err(ConfigError::ValidationError("index.top_k must be > 0".into()));
        }

        if self.index.fetch_k < self.index.top_k {
            return Err(ConfigError::ValidationError(
                "index.fetch_k must be >= index.top_k".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.index.mmr_lambda) {
            return Err(ConfigError::ValidationError(
                "index.mmr_lambda must be between 0.0 and 1.0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Provider used for query embeddings.
    pub fn embedding_provider(&self) -> &str {
        self.index
            .embedding_provider
            .as_deref()
            .unwrap_or(&self.default_provider)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: None,
            language: Language::default(),
            client: ClientConfig::default(),
            pipeline: PipelineConfig::default(),
            index: IndexConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_provider, "groq");
        assert_eq!(config.language, Language::Pt);
        assert_eq!(config.client.timeout_secs, 60);
        assert_eq!(config.client.max_retries, 2);
        assert_eq!(config.pipeline.context_budget_chars, 4000);
        assert_eq!(config.pipeline.history_limit, 20);
        assert_eq!(config.pipeline.max_question_chars, 5000);
        assert_eq!(config.index.top_k, 3);
        assert_eq!(config.index.fetch_k, 4);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.index.dir, config.index.dir);
        assert_eq!(parsed.language, config.language);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn fetch_k_below_top_k_rejected() {
        let mut config = AppConfig::default();
        config.index.top_k = 5;
        config.index.fetch_k = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_budget_rejected() {
        let mut config = AppConfig::default();
        config.pipeline.context_budget_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "groq");
    }

    #[test]
    fn unknown_language_in_file_fails_at_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "language = \"fr\"\n").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
language = "en"

[pipeline]
context_budget_chars = 1200

[index]
dir = "/srv/cv-index"
mode = "vector"
"#,
        )
        .unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.language, Language::En);
        assert_eq!(config.pipeline.context_budget_chars, 1200);
        assert_eq!(config.pipeline.history_limit, 20);
        assert_eq!(config.index.mode, RetrievalMode::Vector);
        assert_eq!(config.index.dir, PathBuf::from("/srv/cv-index"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[
                ("GROQ_API_KEY", "gsk-test"),
                ("CVRAG_MODEL", "llama-3.1-8b-instant"),
                ("CVRAG_LANGUAGE", "en"),
                ("CVRAG_INDEX_DIR", "/tmp/idx"),
            ]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(config.default_model, "llama-3.1-8b-instant");
        assert_eq!(config.language, Language::En);
        assert_eq!(config.index.dir, PathBuf::from("/tmp/idx"));
    }

    #[test]
    fn api_key_precedence() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[("CVRAG_API_KEY", "first"), ("GROQ_API_KEY", "second")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("first"));
    }

    #[test]
    fn unknown_language_in_env_fails_fast() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(env(&[("CVRAG_LANGUAGE", "klingon")]))
            .unwrap_err();
        assert!(err.to_string().contains("klingon"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = AppConfig {
            api_key: Some("gsk-very-secret".into()),
            ..AppConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("gsk-very-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn default_mode_needs_no_embeddings() {
        let config = AppConfig::default();
        assert_eq!(config.index.mode, RetrievalMode::Keyword);

        let config: AppConfig = toml::from_str("[index]\nmode = \"vector\"").unwrap();
        assert_eq!(config.index.mode, RetrievalMode::Vector);
    }

    #[test]
    fn embedding_provider_falls_back_to_default() {
        let mut config = AppConfig::default();
        assert_eq!(config.embedding_provider(), "groq");
        config.index.embedding_provider = Some("openai".into());
        assert_eq!(config.embedding_provider(), "openai");
    }
}
