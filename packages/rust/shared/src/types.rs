//! Core domain types for Brandcast campaigns.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BrandcastError;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// CampaignRequest
// ---------------------------------------------------------------------------

/// Immutable pipeline input. Created once per run and only ever borrowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignRequest {
    /// Free-text brand description.
    pub brand_info: String,
    /// Industry the brand operates in.
    pub industry: String,
    /// Who the content is for.
    pub target_audience: String,
    /// What the campaign is about.
    pub topic: String,
    /// Voice the content should be written in.
    pub brand_tone: String,
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// One output surface of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Short-form numbered thread.
    Twitter,
    /// Long-form professional post.
    LinkedIn,
    /// Caption with hashtags.
    Instagram,
    /// Email newsletter.
    Newsletter,
}

impl Channel {
    /// Every channel, in pipeline order.
    pub const ALL: [Channel; 4] = [
        Channel::Twitter,
        Channel::LinkedIn,
        Channel::Instagram,
        Channel::Newsletter,
    ];

    /// Human-readable platform name, used in prompts and output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Twitter => "Twitter",
            Self::LinkedIn => "LinkedIn",
            Self::Instagram => "Instagram",
            Self::Newsletter => "Newsletter",
        }
    }

    /// Stable lowercase identifier (file names, config keys).
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::LinkedIn => "linkedin",
            Self::Instagram => "instagram",
            Self::Newsletter => "newsletter",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Channel {
    type Err = BrandcastError;

    /// Accepts a slug, case-insensitively. `x` is an alias for Twitter.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted == "x" {
            return Ok(Self::Twitter);
        }
        Self::ALL
            .into_iter()
            .find(|c| c.slug() == wanted)
            .ok_or_else(|| {
                BrandcastError::validation(format!(
                    "unknown channel '{s}' (expected twitter, linkedin, instagram or newsletter)"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Research & strategy
// ---------------------------------------------------------------------------

/// Synthesized research, produced once by the researcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReport {
    /// Generated report text.
    pub report: String,
    /// Number of search snippets that fed the synthesis.
    pub source_count: usize,
}

/// Structured content guidance derived from the research report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub text: String,
}

// ---------------------------------------------------------------------------
// Quality verdicts
// ---------------------------------------------------------------------------

/// Evaluator recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Recommendation {
    Approve,
    Revise,
    /// Any other token the evaluator produced, upper-cased.
    Other(String),
}

impl Recommendation {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Approve => "APPROVE",
            Self::Revise => "REVISE",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Recommendation {
    fn from(s: String) -> Self {
        match s.to_uppercase().as_str() {
            "APPROVE" => Self::Approve,
            "REVISE" => Self::Revise,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<Recommendation> for String {
    fn from(r: Recommendation) -> Self {
        r.as_str().to_string()
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six rubric sub-scores (1–10). Missing lines stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RubricScores {
    pub brand_alignment: Option<f64>,
    pub strategy_adherence: Option<f64>,
    pub engagement_potential: Option<f64>,
    pub clarity: Option<f64>,
    pub call_to_action: Option<f64>,
    pub platform_optimization: Option<f64>,
}

/// Evaluator output for one draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityVerdict {
    pub channel: Channel,
    pub rubric: RubricScores,
    /// Overall score, 0–10.
    pub overall_score: f64,
    pub recommendation: Recommendation,
    /// Constructive feedback, threaded into the next regeneration prompt.
    pub feedback: String,
    /// `recommendation == APPROVE && overall_score >= 7.5`.
    pub approved: bool,
    /// Raw evaluator text (or the error message on a failed call).
    pub evaluation: String,
    /// Whether the fail-open defaults were applied.
    pub fallback: bool,
}

// ---------------------------------------------------------------------------
// Attempts & results
// ---------------------------------------------------------------------------

/// One generated draft for one channel at one pass, paired with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-based quality-check pass that recorded this attempt.
    pub pass: u32,
    pub content: String,
    pub score: f64,
}

/// Final output for one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelOutcome {
    pub channel: Channel,
    /// Content of the best-scoring attempt.
    pub content: String,
    /// Pass number of the attempt selected as `content`.
    pub selected_pass: Option<u32>,
    /// Most recent verdict for this channel.
    pub verdict: QualityVerdict,
    /// Every recorded attempt, in pass order.
    pub attempts: Vec<Attempt>,
}

impl ChannelOutcome {
    /// Score of the attempt that was selected as final content.
    pub fn best_score(&self) -> Option<f64> {
        let pass = self.selected_pass?;
        self.attempts.iter().find(|a| a.pass == pass).map(|a| a.score)
    }
}

/// Everything a finished run returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignResult {
    pub run_id: RunId,
    pub request: CampaignRequest,
    /// Total research snippets used.
    pub research_sources: usize,
    /// One entry per channel, in [`Channel::ALL`] order.
    pub channels: Vec<ChannelOutcome>,
    /// Regeneration passes executed (0–2).
    pub retry_count: u32,
    pub all_approved: bool,
    /// Quality-check passes executed (1–3).
    pub quality_passes: u32,
    pub generated_at: DateTime<Utc>,
}

impl CampaignResult {
    /// Look up the outcome for a channel.
    pub fn channel(&self, channel: Channel) -> Option<&ChannelOutcome> {
        self.channels.iter().find(|c| c.channel == channel)
    }
}

// ---------------------------------------------------------------------------
// Repurposing
// ---------------------------------------------------------------------------

/// Analysis of an existing long-form piece: topic, key points, tone,
/// audience, call to action and hook material, as free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub analysis: String,
    /// Length of the source text, in characters.
    pub source_chars: usize,
}

/// One channel's repurposed post. Exactly one of `content` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepurposedPost {
    pub channel: Channel,
    pub content: Option<String>,
    pub error: Option<String>,
}

/// Everything a repurposing run returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepurposeResult {
    pub run_id: RunId,
    pub analysis: ContentAnalysis,
    /// One entry per requested channel, in request order.
    pub posts: Vec<RepurposedPost>,
    pub generated_at: DateTime<Utc>,
}

impl RepurposeResult {
    /// Look up the post for a channel.
    pub fn post(&self, channel: Channel) -> Option<&RepurposedPost> {
        self.posts.iter().find(|p| p.channel == channel)
    }
}
