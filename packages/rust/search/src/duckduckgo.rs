//! DuckDuckGo HTML search, scraped. Needs no API key.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use brandcast_shared::{BrandcastError, Result};

use crate::{SearchHit, SearchProvider, build_client};

static RESULT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.result").expect("valid selector"));
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.result__a").expect("valid selector"));
static SNIPPET_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".result__snippet").expect("valid selector"));

pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: format!("{}/html/", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    #[instrument(skip(self), fields(backend = "duckduckgo"))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| BrandcastError::Search(format!("duckduckgo: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BrandcastError::Search(format!("duckduckgo: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BrandcastError::Search(format!("duckduckgo: {e}")))?;

        let hits = parse_results(&body, max_results);
        debug!(count = hits.len(), "duckduckgo results");
        Ok(hits)
    }

    fn name(&self) -> &'static str {
        "duckduckgo"
    }
}

/// Extract ranked hits from a results page. Results without a title link are skipped.
fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let doc = Html::parse_document(html);
    let mut hits = Vec::new();

    for result in doc.select(&RESULT_SEL) {
        if hits.len() >= max_results {
            break;
        }

        let Some(link) = result.select(&TITLE_SEL).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };

        let title = element_text(link);
        if title.is_empty() {
            continue;
        }

        let content = result
            .select(&SNIPPET_SEL)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let rank = hits.len();
        hits.push(SearchHit {
            title,
            url: resolve_link(href),
            content,
            // DuckDuckGo has no relevance score; use reciprocal rank.
            score: 1.0 / (rank as f64 + 1.0),
        });
    }

    hits
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unwrap `//duckduckgo.com/l/?uddg=<target>` redirect links.
fn resolve_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };

    Url::parse(&absolute)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(absolute)
}
