//! Research stage: derived web searches, then one synthesis call.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use tracing::{info, instrument, warn};

use brandcast_llm::{GenerationRequest, TextGenerator};
use brandcast_search::{SearchHit, SearchProvider};
use brandcast_shared::{ResearchReport, Result, SearchConfig};

use crate::prompts::{self, BriefContext};

/// Search limits for the research stage.
#[derive(Debug, Clone, Copy)]
pub struct ResearchOptions {
    /// Result cap per query.
    pub max_results_per_query: usize,
    /// Snippet length kept per source, in characters.
    pub snippet_chars: usize,
}

impl Default for ResearchOptions {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for ResearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            max_results_per_query: config.max_results_per_query,
            snippet_chars: config.snippet_chars,
        }
    }
}

pub struct Researcher {
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
    search: Arc<dyn SearchProvider>,
    options: ResearchOptions,
}

impl Researcher {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        temperature: f32,
        search: Arc<dyn SearchProvider>,
        options: ResearchOptions,
    ) -> Self {
        Self {
            generator,
            temperature,
            search,
            options,
        }
    }

    /// Run every derived query, then synthesize the collected snippets.
    ///
    /// Failed queries count as zero results. A failed synthesis call is returned.
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn conduct_research(
        &self,
        topic: &str,
        brand_info: &str,
        target_audience: &str,
    ) -> Result<ResearchReport> {
        let queries = search_queries(topic, brand_info, target_audience, Utc::now().year());
        let total = queries.len();

        let mut hits: Vec<SearchHit> = Vec::new();
        for (i, query) in queries.iter().enumerate() {
            match self
                .search
                .search(query, self.options.max_results_per_query)
                .await
            {
                Ok(found) => {
                    info!(query = %query, n = i + 1, total, found = found.len(), "search complete");
                    hits.extend(found);
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "search failed, continuing without it");
                }
            }
        }

        info!(sources = hits.len(), "synthesizing research");

        let sources = format_sources(&hits, self.options.snippet_chars);
        let prompt = prompts::research_synthesis(
            &BriefContext {
                brand_info,
                topic,
                target_audience,
            },
            &sources,
        );

        let report = self
            .generator
            .generate(&GenerationRequest::new(prompt, self.temperature))
            .await?;

        Ok(ResearchReport {
            report,
            source_count: hits.len(),
        })
    }
}

/// The six research queries, in order.
pub fn search_queries(topic: &str, brand_info: &str, target_audience: &str, year: i32) -> Vec<String> {
    vec![
        format!("{topic} latest trends {year}"),
        format!("{topic} statistics and data"),
        format!("{topic} for {target_audience}"),
        format!("{brand_info} {topic}"),
        format!("{topic} best practices"),
        format!("{topic} common questions"),
    ]
}

/// Numbered source blocks for the synthesis prompt.
fn format_sources(hits: &[SearchHit], snippet_chars: usize) -> String {
    let mut out = String::new();
    for (i, hit) in hits.iter().enumerate() {
        let _ = write!(
            out,
            "Source {n}:\nTitle: {title}\nURL: {url}\nContent: {content}...\n---\n\n",
            n = i + 1,
            title = or_na(&hit.title),
            url = or_na(&hit.url),
            content = truncate_chars(&hit.content, snippet_chars),
        );
    }
    out
}

fn or_na(s: &str) -> &str {
    if s.is_empty() { "N/A" } else { s }
}

/// Cut `s` to at most `max` characters without splitting a code point.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedGenerator, StaticSearch};

    fn hit(title: &str, content: &str) -> SearchHit {
        SearchHit {
            title: title.into(),
            url: format!("https://example.com/{title}"),
            content: content.into(),
            score: 0.5,
        }
    }

    #[test]
    fn six_queries_from_templates() {
        let q = search_queries("solar panels", "Acme Solar", "homeowners", 2026);
        assert_eq!(q.len(), 6);
        assert_eq!(q[0], "solar panels latest trends 2026");
        assert_eq!(q[2], "solar panels for homeowners");
        assert_eq!(q[3], "Acme Solar solar panels");
        assert_eq!(q[5], "solar panels common questions");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 500), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn sources_are_numbered_and_truncated() {
        let hits = vec![hit("a", "0123456789"), hit("", "xyz")];
        let text = format_sources(&hits, 4);
        assert!(text.contains("Source 1:\nTitle: a\n"));
        assert!(text.contains("Content: 0123...\n---"));
        assert!(text.contains("Source 2:\nTitle: N/A\n"));
    }

    #[tokio::test]
    async fn failed_queries_count_as_zero_results() {
        let search = StaticSearch::with_failures(vec![hit("only", "one result")], &["statistics"]);
        let generator = ScriptedGenerator::new(|_prompt| Ok("REPORT".into()));
        let researcher = Researcher::new(
            generator.clone(),
            0.2,
            search.clone(),
            ResearchOptions::default(),
        );

        let report = researcher
            .conduct_research("solar", "Acme", "homeowners")
            .await
            .unwrap();

        assert_eq!(report.report, "REPORT");
        // Six queries, one fails, each of the rest returns one hit.
        assert_eq!(report.source_count, 5);
        assert_eq!(search.queries().len(), 6);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn synthesis_failure_propagates() {
        let search = StaticSearch::new(vec![]);
        let generator = ScriptedGenerator::new(|_prompt| {
            Err(brandcast_shared::BrandcastError::Generation("down".into()))
        });
        let researcher =
            Researcher::new(generator, 0.2, search, ResearchOptions::default());

        let err = researcher
            .conduct_research("solar", "Acme", "homeowners")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("down"));
    }

    #[tokio::test]
    async fn synthesis_prompt_carries_sources() {
        let search = StaticSearch::new(vec![hit("Solar stats", "Installs rose sharply")]);
        let generator = ScriptedGenerator::new(|_prompt| Ok("ok".into()));
        let researcher = Researcher::new(
            generator.clone(),
            0.2,
            search,
            ResearchOptions::default(),
        );

        researcher
            .conduct_research("solar", "Acme", "homeowners")
            .await
            .unwrap();

        let prompt = &generator.prompts()[0];
        assert!(prompt.starts_with(prompts::RESEARCH_PREAMBLE));
        assert!(prompt.contains("Title: Solar stats"));
        assert!(prompt.contains("Source 6:"));
    }
}
