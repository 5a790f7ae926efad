//! Run report writer.
//!
//! Writes a finished campaign to disk:
//! ```text
//! <output_root>/<run_id>/
//! ├── campaign.json
//! ├── twitter.md
//! ├── linkedin.md
//! ├── instagram.md
//! └── newsletter.md
//! ```
//!
//! A repurpose run gets `repurpose.json`, `analysis.md`, and one Markdown
//! file per channel that produced content.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use brandcast_shared::{
    Attempt, BrandcastError, CampaignRequest, CampaignResult, Channel, ChannelOutcome,
    QualityVerdict, RepurposeResult, Result, RunId,
};

/// Contents of `campaign.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignManifest {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub request: CampaignRequest,
    pub research_sources: usize,
    pub quality_passes: u32,
    pub retry_count: u32,
    pub all_approved: bool,
    pub channels: Vec<ChannelEntry>,
}

/// One channel in `campaign.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub channel: Channel,
    /// File name of the channel's content, relative to the run directory.
    pub file: String,
    /// SHA-256 of the final content.
    pub content_hash: String,
    pub selected_pass: Option<u32>,
    pub best_score: Option<f64>,
    pub verdict: QualityVerdict,
    pub attempts: Vec<Attempt>,
}

/// Contents of `repurpose.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepurposeManifest {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub source_chars: usize,
    /// File holding the source analysis, relative to the run directory.
    pub analysis_file: String,
    pub posts: Vec<PostEntry>,
}

/// One channel in `repurpose.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostEntry {
    pub channel: Channel,
    /// Absent when the channel failed.
    pub file: Option<String>,
    pub content_hash: Option<String>,
    pub error: Option<String>,
}

/// Write `result` under `output_root/<run_id>/` and return that directory.
#[instrument(skip_all, fields(run_id = %result.run_id))]
pub fn write_campaign(output_root: &Path, result: &CampaignResult) -> Result<PathBuf> {
    let run_dir = output_root.join(result.run_id.to_string());
    std::fs::create_dir_all(&run_dir).map_err(|e| BrandcastError::io(&run_dir, e))?;

    info!(path = %run_dir.display(), "writing campaign report");

    let mut channels = Vec::with_capacity(result.channels.len());
    for outcome in &result.channels {
        let file = format!("{}.md", outcome.channel.slug());
        write_text(&run_dir.join(&file), &render_channel(outcome))?;

        channels.push(ChannelEntry {
            channel: outcome.channel,
            file,
            content_hash: compute_hash(&outcome.content),
            selected_pass: outcome.selected_pass,
            best_score: outcome.best_score(),
            verdict: outcome.verdict.clone(),
            attempts: outcome.attempts.clone(),
        });
    }

    let manifest = CampaignManifest {
        run_id: result.run_id.clone(),
        generated_at: result.generated_at,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        request: result.request.clone(),
        research_sources: result.research_sources,
        quality_passes: result.quality_passes,
        retry_count: result.retry_count,
        all_approved: result.all_approved,
        channels,
    };
    write_json(&run_dir.join("campaign.json"), &manifest)?;

    Ok(run_dir)
}

/// Write a repurpose run under `output_root/<run_id>/` and return that directory.
#[instrument(skip_all, fields(run_id = %result.run_id))]
pub fn write_repurpose(output_root: &Path, result: &RepurposeResult) -> Result<PathBuf> {
    let run_dir = output_root.join(result.run_id.to_string());
    std::fs::create_dir_all(&run_dir).map_err(|e| BrandcastError::io(&run_dir, e))?;

    info!(path = %run_dir.display(), "writing repurpose report");

    let analysis_file = "analysis.md".to_string();
    write_text(
        &run_dir.join(&analysis_file),
        &format!("{}\n", result.analysis.analysis.trim_end()),
    )?;

    let mut posts = Vec::with_capacity(result.posts.len());
    for post in &result.posts {
        let (file, content_hash) = match &post.content {
            Some(content) => {
                let file = format!("{}.md", post.channel.slug());
                write_text(&run_dir.join(&file), &format!("{}\n", content.trim_end()))?;
                (Some(file), Some(compute_hash(content)))
            }
            None => (None, None),
        };
        posts.push(PostEntry {
            channel: post.channel,
            file,
            content_hash,
            error: post.error.clone(),
        });
    }

    let manifest = RepurposeManifest {
        run_id: result.run_id.clone(),
        generated_at: result.generated_at,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        source_chars: result.analysis.source_chars,
        analysis_file,
        posts,
    };
    write_json(&run_dir.join("repurpose.json"), &manifest)?;

    Ok(run_dir)
}

/// Read back a `campaign.json`.
pub fn read_manifest(path: &Path) -> Result<CampaignManifest> {
    let text = std::fs::read_to_string(path).map_err(|e| BrandcastError::io(path, e))?;
    serde_json::from_str(&text)
        .map_err(|e| BrandcastError::parse(format!("invalid {}: {e}", path.display())))
}

/// Channel content with a small front-matter header.
///
/// `best_score` and `selected_pass` describe the content below; the
/// `last_*` fields describe the final evaluation, which may be of a later draft.
fn render_channel(outcome: &ChannelOutcome) -> String {
    let score = outcome
        .best_score()
        .map_or_else(|| "n/a".to_string(), |s| format!("{s:.1}"));
    let pass = outcome
        .selected_pass
        .map_or_else(|| "n/a".to_string(), |p| p.to_string());

    format!(
        "---\nchannel: {}\nbest_score: {score}\nselected_pass: {pass}\n\
         last_recommendation: {}\nlast_approved: {}\n---\n\n{}\n",
        outcome.channel.slug(),
        outcome.verdict.recommendation,
        outcome.verdict.approved,
        outcome.content.trim_end(),
    )
}

fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| BrandcastError::validation(format!("JSON serialization failed: {e}")))?;
    write_text(path, &json)
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).map_err(|e| BrandcastError::io(path, e))?;
    debug!(path = %path.display(), "wrote file");
    Ok(())
}
