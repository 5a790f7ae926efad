//! End-to-end campaign pipeline:
//! research → strategy → generate → quality check → (regenerate → quality check)* → done.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use brandcast_llm::Backends;
use brandcast_search::SearchProvider;
use brandcast_shared::{
    AppConfig, CampaignRequest, CampaignResult, Channel, QualityVerdict, Result, RunId,
    StagesConfig,
};

use crate::channels::ChannelWriter;
use crate::quality::QualityEvaluator;
use crate::research::{ResearchOptions, Researcher};
use crate::state::{PipelineState, Stage, next_stage};
use crate::strategy::Strategist;

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a stage.
    fn stage(&self, stage: Stage);
    /// Called after each channel is scored.
    fn channel_evaluated(&self, verdict: &QualityVerdict, pass: u32);
    /// Called when the pipeline completes.
    fn done(&self, result: &CampaignResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage(&self, _stage: Stage) {}
    fn channel_evaluated(&self, _verdict: &QualityVerdict, _pass: u32) {}
    fn done(&self, _result: &CampaignResult) {}
}

/// The wired-up stage components for one configuration.
pub struct ContentPipeline {
    researcher: Researcher,
    strategist: Strategist,
    writers: BTreeMap<Channel, ChannelWriter>,
    evaluator: QualityEvaluator,
}

impl ContentPipeline {
    /// Route every stage to its configured backend and temperature.
    pub fn new(
        stages: &StagesConfig,
        backends: &Backends,
        search: Arc<dyn SearchProvider>,
        research: ResearchOptions,
    ) -> Self {
        let writers = Channel::ALL
            .iter()
            .map(|&channel| {
                let model = stages.for_channel(channel);
                (
                    channel,
                    ChannelWriter::new(channel, backends.get(model.backend), model.temperature),
                )
            })
            .collect();

        Self {
            researcher: Researcher::new(
                backends.get(stages.research.backend),
                stages.research.temperature,
                search,
                research,
            ),
            strategist: Strategist::new(
                backends.get(stages.strategy.backend),
                stages.strategy.temperature,
            ),
            writers,
            evaluator: QualityEvaluator::new(
                backends.get(stages.quality.backend),
                stages.quality.temperature,
            ),
        }
    }

    /// Build HTTP clients for the configured LLM and search backends.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let backends = Backends::from_config(config)?;
        let search = brandcast_search::from_config(&config.search)?;
        Ok(Self::new(
            &config.stages,
            &backends,
            search,
            ResearchOptions::from(&config.search),
        ))
    }

    /// Run one campaign.
    ///
    /// Fails only if research synthesis or strategy creation fails; both
    /// happen before any channel content is written.
    #[instrument(skip_all, fields(topic = %request.topic))]
    pub async fn run(
        &self,
        request: &CampaignRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<CampaignResult> {
        let start = Instant::now();
        let run_id = RunId::new();

        info!(%run_id, brand = %request.brand_info, "starting campaign pipeline");

        progress.stage(Stage::Research);
        let research = self
            .researcher
            .conduct_research(&request.topic, &request.brand_info, &request.target_audience)
            .await?;

        progress.stage(Stage::Strategy);
        let strategy = self
            .strategist
            .create_strategy(
                &research,
                &request.brand_info,
                &request.topic,
                &request.target_audience,
                &request.brand_tone,
            )
            .await?;

        let mut state = PipelineState::new(request.clone(), research, strategy);
        let mut stage = Stage::Generate;

        loop {
            progress.stage(stage);
            stage = match stage {
                Stage::Generate => {
                    let all = Channel::ALL.iter().map(|&c| (c, String::new())).collect();
                    self.write_drafts(&mut state, all).await;
                    Stage::QualityCheck
                }
                Stage::QualityCheck => {
                    self.quality_check(&mut state, progress).await?;
                    next_stage(&state)
                }
                Stage::Regenerate => {
                    let revisions = state.begin_regeneration();
                    info!(
                        retry = state.retry_count(),
                        channels = revisions.len(),
                        "regenerating unapproved channels"
                    );
                    self.write_drafts(&mut state, revisions).await;
                    Stage::QualityCheck
                }
                // Research and strategy run once, before the loop.
                Stage::Done | Stage::Research | Stage::Strategy => break,
            };
        }

        let result = state.finish(run_id)?;

        info!(
            run_id = %result.run_id,
            passes = result.quality_passes,
            retries = result.retry_count,
            all_approved = result.all_approved,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "campaign pipeline complete"
        );

        progress.done(&result);
        Ok(result)
    }

    /// Run the writer for each `(channel, feedback)` pair. A failed write
    /// keeps the channel's current draft.
    async fn write_drafts(&self, state: &mut PipelineState, jobs: Vec<(Channel, String)>) {
        for (channel, feedback) in jobs {
            let Some(writer) = self.writers.get(&channel) else {
                continue;
            };

            let written = {
                let request = state.request();
                writer
                    .generate(
                        state.research(),
                        state.strategy(),
                        &request.brand_info,
                        &request.topic,
                        &request.brand_tone,
                        &feedback,
                    )
                    .await
            };

            match written {
                Ok(draft) => state.set_draft(channel, draft),
                Err(e) => {
                    warn!(%channel, error = %e, "draft generation failed, keeping previous draft");
                }
            }
        }
    }

    async fn quality_check(
        &self,
        state: &mut PipelineState,
        progress: &dyn ProgressReporter,
    ) -> Result<()> {
        let pass = state.quality_passes() + 1;
        let mut verdicts = Vec::with_capacity(Channel::ALL.len());

        for channel in Channel::ALL {
            let verdict = self
                .evaluator
                .evaluate(
                    channel,
                    state.draft(channel),
                    state.strategy(),
                    &state.request().brand_tone,
                )
                .await;

            info!(
                %channel,
                pass,
                score = verdict.overall_score,
                recommendation = %verdict.recommendation,
                approved = verdict.approved,
                "channel evaluated"
            );
            progress.channel_evaluated(&verdict, pass);
            verdicts.push(verdict);
        }

        state.record_quality_pass(verdicts)
    }
}
