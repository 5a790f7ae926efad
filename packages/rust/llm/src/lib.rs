//! Text generation for Brandcast.
//!
//! Every pipeline stage talks to a language model through the
//! [`TextGenerator`] trait. [`ChatClient`] implements it against any
//! OpenAI-compatible `/chat/completions` endpoint (Groq, Ollama, OpenRouter).

mod client;

use std::sync::Arc;

use async_trait::async_trait;

use brandcast_shared::{AppConfig, Backend, Result, api_key_from_env};

pub use client::ChatClient;

/// A single generation call: a fully rendered prompt plus its temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Creativity parameter in [0, 1].
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: temperature.clamp(0.0, 1.0),
        }
    }
}

/// Request/response text generation. No streaming, no partial results.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `request`, or fail with [`brandcast_shared::BrandcastError::Generation`].
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}

/// One shared client per configured backend.
#[derive(Clone)]
pub struct Backends {
    pub local: Arc<dyn TextGenerator>,
    pub remote: Arc<dyn TextGenerator>,
}

impl Backends {
    /// Build both chat clients from config. Keys are read from the environment.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let timeout = std::time::Duration::from_secs(config.llm.timeout_secs);

        let local = ChatClient::new(
            &config.llm.local.base_url,
            &config.llm.local.model,
            api_key_from_env(config.llm.local.api_key_env.as_deref()),
            timeout,
        )?;
        let remote = ChatClient::new(
            &config.llm.remote.base_url,
            &config.llm.remote.model,
            api_key_from_env(config.llm.remote.api_key_env.as_deref()),
            timeout,
        )?;

        Ok(Self {
            local: Arc::new(local),
            remote: Arc::new(remote),
        })
    }

    /// The generator a stage routed to `backend` should use.
    pub fn get(&self, backend: Backend) -> Arc<dyn TextGenerator> {
        match backend {
            Backend::Local => Arc::clone(&self.local),
            Backend::Remote => Arc::clone(&self.remote),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_clamps_temperature() {
        assert_eq!(GenerationRequest::new("p", 1.7).temperature, 1.0);
        assert_eq!(GenerationRequest::new("p", -0.2).temperature, 0.0);
        assert_eq!(GenerationRequest::new("p", 0.3).temperature, 0.3);
    }

    #[test]
    fn backends_route_by_stage() {
        let config = AppConfig::default();
        let backends = Backends::from_config(&config).expect("build clients");
        assert_eq!(backends.get(Backend::Local).model(), "llama3.2");
        assert_eq!(backends.get(Backend::Remote).model(), "llama-3.1-8b-instant");
    }
}
