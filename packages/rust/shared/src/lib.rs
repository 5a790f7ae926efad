//! Shared types, error model, and configuration for Brandcast.
//!
//! This crate is the foundation depended on by all other Brandcast crates.
//! It provides:
//! - [`BrandcastError`]: the unified error type
//! - Domain types ([`CampaignRequest`], [`Channel`], [`QualityVerdict`], [`CampaignResult`])
//! - Configuration ([`AppConfig`], [`StagesConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, Backend, EndpointConfig, LlmConfig, SearchConfig, StageModel, StagesConfig,
    api_key_from_env, config_dir, config_file_path, init_config, load_config, load_config_from,
    validate_api_keys, validate_llm_keys,
};
pub use error::{BrandcastError, Result};
pub use types::{
    Attempt, CampaignRequest, CampaignResult, Channel, ChannelOutcome, ContentAnalysis,
    QualityVerdict, Recommendation, RepurposeResult, RepurposedPost, ResearchReport, RubricScores,
    RunId, Strategy,
};
