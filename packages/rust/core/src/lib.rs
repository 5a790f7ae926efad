//! Core pipeline orchestration and domain logic for Brandcast.
//!
//! This crate ties research, strategy, channel writing, and quality
//! evaluation into one campaign run (see [`ContentPipeline`]), and adapts
//! existing long-form content to each channel (see [`Repurposer`]).

pub mod channels;
pub mod pipeline;
mod prompts;
pub mod quality;
pub mod report;
pub mod repurpose;
pub mod research;
pub mod state;
pub mod strategy;

#[cfg(test)]
mod test_support;

pub use channels::ChannelWriter;
pub use pipeline::{ContentPipeline, ProgressReporter, SilentProgress};
pub use quality::{APPROVAL_THRESHOLD, QualityEvaluator};
pub use report::{
    CampaignManifest, ChannelEntry, PostEntry, RepurposeManifest, read_manifest, write_campaign,
    write_repurpose,
};
pub use repurpose::{ContentAnalyzer, DEFAULT_REPURPOSE_CHANNELS, RepurposeWriter, Repurposer};
pub use research::{ResearchOptions, Researcher};
pub use state::{MAX_REGENERATION_PASSES, PipelineState, Stage, next_stage, select_best};
pub use strategy::Strategist;
