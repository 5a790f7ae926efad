//! Web search backends for the research stage.
//!
//! This crate provides:
//! - [`SearchProvider`]: the query → ranked snippets contract
//! - [`TavilySearch`]: LLM-oriented search API, the primary backend
//! - [`DuckDuckGoSearch`]: keyless HTML search, used as a fallback
//! - [`FallbackSearch`]: tries a primary provider, then a fallback

mod duckduckgo;
mod tavily;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use brandcast_shared::{BrandcastError, Result, SearchConfig};

pub use duckduckgo::DuckDuckGoSearch;
pub use tavily::TavilySearch;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("Brandcast/", env!("CARGO_PKG_VERSION"));

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    /// Content snippet.
    pub content: String,
    /// Relevance score as reported by the backend.
    pub score: f64,
}

/// Query → ranked snippets. An empty result is a valid answer, not an error.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;

    /// Backend name, for logs.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// FallbackSearch
// ---------------------------------------------------------------------------

/// Uses `primary` first and falls back when it fails or finds nothing.
pub struct FallbackSearch {
    primary: Arc<dyn SearchProvider>,
    fallback: Arc<dyn SearchProvider>,
}

impl FallbackSearch {
    pub fn new(primary: Arc<dyn SearchProvider>, fallback: Arc<dyn SearchProvider>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl SearchProvider for FallbackSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        match self.primary.search(query, max_results).await {
            Ok(hits) if !hits.is_empty() => return Ok(hits),
            Ok(_) => {
                info!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    "no results, trying fallback"
                );
            }
            Err(e) => {
                warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "search failed, trying fallback"
                );
            }
        }

        self.fallback.search(query, max_results).await
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}

// ---------------------------------------------------------------------------
// Construction from config
// ---------------------------------------------------------------------------

/// Build the configured search stack. The Tavily key is read from the environment.
pub fn from_config(config: &SearchConfig) -> Result<Arc<dyn SearchProvider>> {
    let timeout = Duration::from_secs(config.timeout_secs);

    let duckduckgo = || -> Result<Arc<dyn SearchProvider>> {
        Ok(Arc::new(DuckDuckGoSearch::new(
            &config.duckduckgo_base_url,
            timeout,
        )?))
    };

    if !config.tavily_enabled {
        if config.duckduckgo_fallback {
            return duckduckgo();
        }
        return Err(BrandcastError::config(
            "no search backend enabled: set search.tavily_enabled or search.duckduckgo_fallback",
        ));
    }

    let api_key = std::env::var(&config.tavily_api_key_env).unwrap_or_default();
    let tavily: Arc<dyn SearchProvider> =
        Arc::new(TavilySearch::new(&config.tavily_base_url, api_key, timeout)?);

    if config.duckduckgo_fallback {
        Ok(Arc::new(FallbackSearch::new(tavily, duckduckgo()?)))
    } else {
        Ok(tavily)
    }
}

/// Shared reqwest client for search backends.
fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| BrandcastError::Network(format!("failed to build HTTP client: {e}")))
}
