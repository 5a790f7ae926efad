//! Tavily search API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use brandcast_shared::{BrandcastError, Result};

use crate::{SearchHit, SearchProvider, build_client};

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'static str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
}

/// Tavily `/search` with advanced depth.
pub struct TavilySearch {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl TavilySearch {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: format!("{}/search", base_url.trim_end_matches('/')),
            api_key,
        })
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    #[instrument(skip(self), fields(backend = "tavily"))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        if self.api_key.is_empty() {
            return Err(BrandcastError::Search("Tavily API key is not set".into()));
        }

        let body = TavilyRequest {
            api_key: &self.api_key,
            query,
            search_depth: "advanced",
            max_results,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| BrandcastError::Search(format!("tavily: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BrandcastError::Search(format!("tavily: HTTP {status}")));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| BrandcastError::Search(format!("tavily: invalid response: {e}")))?;

        let hits: Vec<SearchHit> = parsed
            .results
            .into_iter()
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                content: r.content,
                score: r.score,
            })
            .collect();

        debug!(count = hits.len(), "tavily results");
        Ok(hits)
    }

    fn name(&self) -> &'static str {
        "tavily"
    }
}
