//! Application configuration for Brandcast.
//!
//! User config lives at `~/.brandcast/brandcast.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BrandcastError, Result};
use crate::types::Channel;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "brandcast.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".brandcast";

// ---------------------------------------------------------------------------
// Config structs (matching brandcast.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Text generation backends.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Backend and temperature per pipeline stage.
    #[serde(default)]
    pub stages: StagesConfig,

    /// Web search settings.
    #[serde(default)]
    pub search: SearchConfig,
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Per-request timeout for generation calls.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Self-hosted model, e.g. Ollama's OpenAI-compatible endpoint.
    #[serde(default = "default_local_endpoint")]
    pub local: EndpointConfig,

    /// Hosted model, e.g. Groq.
    #[serde(default = "default_remote_endpoint")]
    pub remote: EndpointConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_llm_timeout(),
            local: default_local_endpoint(),
            remote: default_remote_endpoint(),
        }
    }
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_local_endpoint() -> EndpointConfig {
    EndpointConfig {
        base_url: "http://localhost:11434/v1".into(),
        model: "llama3.2".into(),
        api_key_env: None,
    }
}

fn default_remote_endpoint() -> EndpointConfig {
    EndpointConfig {
        base_url: "https://api.groq.com/openai/v1".into(),
        model: "llama-3.1-8b-instant".into(),
        api_key_env: Some("GROQ_API_KEY".into()),
    }
}

/// An OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL; `/chat/completions` is appended.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Name of the env var holding the API key (never store the key itself).
    /// `None` for endpoints that need no key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

/// Which endpoint a stage talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Local,
    Remote,
}

/// Backend and sampling temperature for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageModel {
    pub backend: Backend,
    /// Creativity parameter in [0, 1].
    pub temperature: f32,
}

impl StageModel {
    const fn new(backend: Backend, temperature: f32) -> Self {
        Self {
            backend,
            temperature,
        }
    }
}

/// `[stages]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagesConfig {
    pub research: StageModel,
    pub strategy: StageModel,
    pub twitter: StageModel,
    pub linkedin: StageModel,
    pub instagram: StageModel,
    pub newsletter: StageModel,
    pub quality: StageModel,
    /// Source analysis for `brandcast repurpose`.
    pub analysis: StageModel,
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            research: StageModel::new(Backend::Local, 0.2),
            strategy: StageModel::new(Backend::Local, 0.3),
            twitter: StageModel::new(Backend::Remote, 0.7),
            linkedin: StageModel::new(Backend::Remote, 0.6),
            instagram: StageModel::new(Backend::Remote, 0.7),
            newsletter: StageModel::new(Backend::Remote, 0.6),
            quality: StageModel::new(Backend::Remote, 0.2),
            analysis: StageModel::new(Backend::Remote, 0.3),
        }
    }
}

impl StagesConfig {
    /// Stage settings for a channel writer.
    pub fn for_channel(&self, channel: Channel) -> StageModel {
        match channel {
            Channel::Twitter => self.twitter,
            Channel::LinkedIn => self.linkedin,
            Channel::Instagram => self.instagram,
            Channel::Newsletter => self.newsletter,
        }
    }

    /// Every stage setting, labelled.
    pub fn all(&self) -> [(&'static str, StageModel); 8] {
        [
            ("research", self.research),
            ("strategy", self.strategy),
            ("twitter", self.twitter),
            ("linkedin", self.linkedin),
            ("instagram", self.instagram),
            ("newsletter", self.newsletter),
            ("quality", self.quality),
            ("analysis", self.analysis),
        ]
    }

    /// Whether any stage routes to `backend`.
    pub fn uses(&self, backend: Backend) -> bool {
        self.all().iter().any(|(_, s)| s.backend == backend)
    }
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Use Tavily as the primary search backend.
    #[serde(default = "default_true")]
    pub tavily_enabled: bool,

    #[serde(default = "default_tavily_base_url")]
    pub tavily_base_url: String,

    /// Name of the env var holding the Tavily key.
    #[serde(default = "default_tavily_key_env")]
    pub tavily_api_key_env: String,

    /// Fall back to DuckDuckGo when Tavily fails or returns nothing.
    #[serde(default = "default_true")]
    pub duckduckgo_fallback: bool,

    #[serde(default = "default_duckduckgo_base_url")]
    pub duckduckgo_base_url: String,

    /// Result cap per research query.
    #[serde(default = "default_max_results")]
    pub max_results_per_query: usize,

    /// Characters of each snippet kept in the research corpus.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tavily_enabled: true,
            tavily_base_url: default_tavily_base_url(),
            tavily_api_key_env: default_tavily_key_env(),
            duckduckgo_fallback: true,
            duckduckgo_base_url: default_duckduckgo_base_url(),
            max_results_per_query: default_max_results(),
            snippet_chars: default_snippet_chars(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_tavily_base_url() -> String {
    "https://api.tavily.com".into()
}
fn default_tavily_key_env() -> String {
    "TAVILY_API_KEY".into()
}
fn default_duckduckgo_base_url() -> String {
    "https://html.duckduckgo.com".into()
}
fn default_max_results() -> usize {
    3
}
fn default_snippet_chars() -> usize {
    500
}
fn default_search_timeout() -> u64 {
    20
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.brandcast/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BrandcastError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.brandcast/brandcast.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BrandcastError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        BrandcastError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BrandcastError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BrandcastError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BrandcastError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that every API key a campaign run will need is set and non-empty.
pub fn validate_api_keys(config: &AppConfig) -> Result<()> {
    validate_llm_keys(config)?;

    // DuckDuckGo covers a keyless Tavily, so the key is only mandatory without it.
    if config.search.tavily_enabled {
        let var = config.search.tavily_api_key_env.as_str();
        if !config.search.duckduckgo_fallback {
            require_env(var)?;
        } else if api_key_from_env(Some(var)).is_none() {
            tracing::warn!(var, "Tavily API key not set, searches will use DuckDuckGo");
        }
    }

    Ok(())
}

/// Check only the LLM endpoint keys. Repurposing never searches.
pub fn validate_llm_keys(config: &AppConfig) -> Result<()> {
    for (backend, endpoint) in [
        (Backend::Local, &config.llm.local),
        (Backend::Remote, &config.llm.remote),
    ] {
        if let Some(var) = endpoint.api_key_env.as_deref() {
            if config.stages.uses(backend) {
                require_env(var)?;
            }
        }
    }
    Ok(())
}

fn require_env(var_name: &str) -> Result<()> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(BrandcastError::config(format!(
            "API key not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Read an optional API key from the env var named by `var_name`.
pub fn api_key_from_env(var_name: Option<&str>) -> Option<String> {
    var_name
        .and_then(|name| std::env::var(name).ok())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("GROQ_API_KEY"));
        assert!(toml_str.contains("TAVILY_API_KEY"));
        assert!(toml_str.contains("llama3.2"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.search.max_results_per_query, 3);
        assert_eq!(parsed.search.snippet_chars, 500);
        assert_eq!(parsed.stages.quality.backend, Backend::Remote);
        assert!(parsed.llm.local.api_key_env.is_none());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[llm.remote]
base_url = "https://api.example.com/v1"
model = "big-model"
api_key_env = "EXAMPLE_KEY"

[stages.twitter]
backend = "local"
temperature = 0.9
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.llm.remote.model, "big-model");
        assert_eq!(config.llm.local.model, "llama3.2");
        assert_eq!(config.stages.twitter.backend, Backend::Local);
        assert_eq!(config.stages.linkedin.temperature, 0.6);
        assert!(config.search.duckduckgo_fallback);
    }

    #[test]
    fn stage_lookup_by_channel() {
        let stages = StagesConfig::default();
        assert_eq!(stages.for_channel(Channel::Twitter).temperature, 0.7);
        assert_eq!(stages.for_channel(Channel::Newsletter).temperature, 0.6);
        assert!(stages.uses(Backend::Local));
        assert!(stages.uses(Backend::Remote));
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Unique env var names so other tests are unaffected
        config.llm.remote.api_key_env = Some("BC_TEST_NONEXISTENT_KEY_12345".into());
        let result = validate_api_keys(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }

    #[test]
    fn unused_backend_key_is_not_required() {
        let mut config = AppConfig::default();
        config.llm.remote.api_key_env = Some("BC_TEST_UNUSED_KEY_67890".into());
        config.search.tavily_enabled = false;
        let local = StageModel::new(Backend::Local, 0.5);
        config.stages = StagesConfig {
            research: local,
            strategy: local,
            twitter: local,
            linkedin: local,
            instagram: local,
            newsletter: local,
            quality: local,
            analysis: local,
        };
        assert!(validate_api_keys(&config).is_ok());
    }

    #[test]
    fn tavily_key_required_only_without_fallback() {
        let mut config = AppConfig::default();
        config.llm.remote.api_key_env = None;
        config.search.tavily_api_key_env = "BC_TEST_NO_TAVILY_KEY_13579".into();

        config.search.duckduckgo_fallback = true;
        assert!(validate_api_keys(&config).is_ok());

        config.search.duckduckgo_fallback = false;
        let err = validate_api_keys(&config).unwrap_err();
        assert!(err.to_string().contains("BC_TEST_NO_TAVILY_KEY_13579"));
    }

    #[test]
    fn llm_validation_ignores_search_keys() {
        let mut config = AppConfig::default();
        config.llm.remote.api_key_env = None;
        config.search.duckduckgo_fallback = false;
        config.search.tavily_api_key_env = "BC_TEST_NO_TAVILY_KEY_24680".into();

        assert!(validate_llm_keys(&config).is_ok());
        assert!(validate_api_keys(&config).is_err());
    }

    #[test]
    fn missing_env_var_yields_no_key() {
        assert_eq!(api_key_from_env(Some("BC_TEST_NO_SUCH_VAR_424242")), None);
        assert_eq!(api_key_from_env(None), None);
    }
}
