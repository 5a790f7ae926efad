//! Repurposing: adapt an existing long-form piece to each channel.
//!
//! One analysis call, then one call per channel. A failed analysis aborts
//! the run; a failed channel is recorded on its post and the rest still run.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use brandcast_llm::{Backends, GenerationRequest, TextGenerator};
use brandcast_shared::{
    AppConfig, BrandcastError, Channel, ContentAnalysis, RepurposeResult, RepurposedPost, Result,
    RunId, StagesConfig,
};

use crate::prompts;

/// Channels repurposed when the caller does not pick any.
pub const DEFAULT_REPURPOSE_CHANNELS: [Channel; 3] =
    [Channel::Twitter, Channel::LinkedIn, Channel::Instagram];

pub struct ContentAnalyzer {
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
}

impl ContentAnalyzer {
    pub fn new(generator: Arc<dyn TextGenerator>, temperature: f32) -> Self {
        Self {
            generator,
            temperature,
        }
    }

    /// Extract topic, key points, tone, audience, call to action and hooks.
    #[instrument(skip_all, fields(chars = content.chars().count()))]
    pub async fn analyze_content(&self, content: &str) -> Result<ContentAnalysis> {
        if content.trim().is_empty() {
            return Err(BrandcastError::validation("content to repurpose is empty"));
        }

        let analysis = self
            .generator
            .generate(&GenerationRequest::new(
                prompts::content_analysis(content),
                self.temperature,
            ))
            .await?;

        debug!(chars = analysis.len(), "analysis complete");
        Ok(ContentAnalysis {
            analysis,
            source_chars: content.chars().count(),
        })
    }
}

/// Writes one channel's version of an analyzed source piece.
pub struct RepurposeWriter {
    channel: Channel,
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
}

impl RepurposeWriter {
    pub fn new(channel: Channel, generator: Arc<dyn TextGenerator>, temperature: f32) -> Self {
        Self {
            channel,
            generator,
            temperature,
        }
    }

    #[instrument(skip_all, fields(channel = %self.channel))]
    pub async fn generate(&self, analysis: &ContentAnalysis, original: &str) -> Result<String> {
        let prompt = prompts::repurpose(self.channel, &analysis.analysis, original);
        self.generator
            .generate(&GenerationRequest::new(prompt, self.temperature))
            .await
    }
}

pub struct Repurposer {
    analyzer: ContentAnalyzer,
    writers: BTreeMap<Channel, RepurposeWriter>,
}

impl Repurposer {
    /// Route analysis and each channel writer to their configured backends.
    pub fn new(stages: &StagesConfig, backends: &Backends) -> Self {
        let writers = Channel::ALL
            .iter()
            .map(|&channel| {
                let model = stages.for_channel(channel);
                (
                    channel,
                    RepurposeWriter::new(channel, backends.get(model.backend), model.temperature),
                )
            })
            .collect();

        Self {
            analyzer: ContentAnalyzer::new(
                backends.get(stages.analysis.backend),
                stages.analysis.temperature,
            ),
            writers,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let backends = Backends::from_config(config)?;
        Ok(Self::new(&config.stages, &backends))
    }

    /// Analyze `content` and write one post per channel in `channels`.
    ///
    /// Duplicate channels are written once, at their first position.
    #[instrument(skip_all, fields(chars = content.len(), channels = channels.len()))]
    pub async fn run(&self, content: &str, channels: &[Channel]) -> Result<RepurposeResult> {
        if channels.is_empty() {
            return Err(BrandcastError::validation("no channels selected"));
        }

        let start = Instant::now();
        let run_id = RunId::new();
        info!(%run_id, "starting repurpose run");

        let analysis = self.analyzer.analyze_content(content).await?;

        let mut posts: Vec<RepurposedPost> = Vec::with_capacity(channels.len());
        for &channel in channels {
            if posts.iter().any(|p| p.channel == channel) {
                continue;
            }
            let Some(writer) = self.writers.get(&channel) else {
                continue;
            };

            let post = match writer.generate(&analysis, content).await {
                Ok(text) => RepurposedPost {
                    channel,
                    content: Some(text),
                    error: None,
                },
                Err(e) => {
                    warn!(%channel, error = %e, "repurpose failed");
                    RepurposedPost {
                        channel,
                        content: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            posts.push(post);
        }

        let failed = posts.iter().filter(|p| p.error.is_some()).count();
        info!(
            %run_id,
            posts = posts.len(),
            failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "repurpose run complete"
        );

        Ok(RepurposeResult {
            run_id,
            analysis,
            posts,
            generated_at: Utc::now(),
        })
    }
}
