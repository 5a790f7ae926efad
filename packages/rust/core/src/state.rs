//! Pipeline state and the stage transition function.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;

use brandcast_shared::{
    Attempt, BrandcastError, CampaignRequest, CampaignResult, Channel, ChannelOutcome,
    QualityVerdict, ResearchReport, Result, RunId, Strategy,
};

/// Regeneration passes allowed after the first quality check.
pub const MAX_REGENERATION_PASSES: u32 = 2;

/// Orchestrator stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Research,
    Strategy,
    Generate,
    QualityCheck,
    Regenerate,
    Done,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Strategy => "strategy",
            Self::Generate => "generate",
            Self::QualityCheck => "quality check",
            Self::Regenerate => "regenerate",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-channel working state.
#[derive(Debug, Clone, Default)]
pub struct ChannelSlot {
    /// Current draft; empty until a writer succeeds.
    pub draft: String,
    /// Verdict from the most recent quality check.
    pub verdict: Option<QualityVerdict>,
    pub attempts: Vec<Attempt>,
}

/// Everything a run accumulates after research and strategy are done.
///
/// Research and strategy are only taken at construction, so they are set
/// exactly once per run.
#[derive(Debug)]
pub struct PipelineState {
    request: CampaignRequest,
    research: ResearchReport,
    strategy: Strategy,
    channels: BTreeMap<Channel, ChannelSlot>,
    retry_count: u32,
    all_approved: bool,
    quality_passes: u32,
}

impl PipelineState {
    pub fn new(request: CampaignRequest, research: ResearchReport, strategy: Strategy) -> Self {
        Self {
            request,
            research,
            strategy,
            channels: Channel::ALL
                .iter()
                .map(|&c| (c, ChannelSlot::default()))
                .collect(),
            retry_count: 0,
            all_approved: false,
            quality_passes: 0,
        }
    }

    pub fn request(&self) -> &CampaignRequest {
        &self.request
    }

    pub fn research(&self) -> &ResearchReport {
        &self.research
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn all_approved(&self) -> bool {
        self.all_approved
    }

    pub fn quality_passes(&self) -> u32 {
        self.quality_passes
    }

    pub fn slot(&self, channel: Channel) -> &ChannelSlot {
        &self.channels[&channel]
    }

    pub fn draft(&self, channel: Channel) -> &str {
        &self.slot(channel).draft
    }

    pub fn set_draft(&mut self, channel: Channel, draft: String) {
        if let Some(slot) = self.channels.get_mut(&channel) {
            slot.draft = draft;
        }
    }

    /// Record one quality-check pass: one verdict per channel.
    ///
    /// Appends an attempt for every channel (regenerated or not) and
    /// recomputes `all_approved`.
    pub fn record_quality_pass(&mut self, verdicts: Vec<QualityVerdict>) -> Result<()> {
        if verdicts.len() != self.channels.len()
            || !self.channels.keys().all(|c| verdicts.iter().any(|v| v.channel == *c))
        {
            return Err(BrandcastError::validation(
                "quality pass must carry exactly one verdict per channel",
            ));
        }

        self.quality_passes += 1;
        let pass = self.quality_passes;

        for verdict in verdicts {
            if let Some(slot) = self.channels.get_mut(&verdict.channel) {
                slot.attempts.push(Attempt {
                    pass,
                    content: slot.draft.clone(),
                    score: verdict.overall_score,
                });
                slot.verdict = Some(verdict);
            }
        }

        self.all_approved = self
            .channels
            .values()
            .all(|s| s.verdict.as_ref().is_some_and(|v| v.approved));
        Ok(())
    }

    /// Start a regeneration pass and return the channels to rewrite with
    /// their latest feedback.
    pub fn begin_regeneration(&mut self) -> Vec<(Channel, String)> {
        self.retry_count += 1;
        self.channels
            .iter()
            .filter_map(|(&channel, slot)| match &slot.verdict {
                Some(v) if !v.approved => Some((channel, v.feedback.clone())),
                _ => None,
            })
            .collect()
    }

    /// Pick the best attempt per channel and produce the run result.
    pub fn finish(self, run_id: RunId) -> Result<CampaignResult> {
        let mut channels = Vec::with_capacity(self.channels.len());

        for (channel, slot) in self.channels {
            let verdict = slot.verdict.ok_or_else(|| {
                BrandcastError::validation(format!("{channel} was never evaluated"))
            })?;
            let best = select_best(&slot.attempts);

            channels.push(ChannelOutcome {
                channel,
                content: best.map(|a| a.content.clone()).unwrap_or_default(),
                selected_pass: best.map(|a| a.pass),
                verdict,
                attempts: slot.attempts,
            });
        }

        Ok(CampaignResult {
            run_id,
            research_sources: self.research.source_count,
            request: self.request,
            channels,
            retry_count: self.retry_count,
            all_approved: self.all_approved,
            quality_passes: self.quality_passes,
            generated_at: Utc::now(),
        })
    }
}

/// Transition taken after every quality check.
pub fn next_stage(state: &PipelineState) -> Stage {
    if state.all_approved || state.retry_count >= MAX_REGENERATION_PASSES {
        Stage::Done
    } else {
        Stage::Regenerate
    }
}

/// Highest-scoring attempt; on ties the earliest wins.
pub fn select_best(attempts: &[Attempt]) -> Option<&Attempt> {
    let mut best: Option<&Attempt> = None;
    for attempt in attempts {
        match best {
            Some(b) if attempt.score <= b.score => {}
            _ => best = Some(attempt),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use brandcast_shared::{Recommendation, RubricScores};

    fn request() -> CampaignRequest {
        CampaignRequest {
            brand_info: "Acme".into(),
            industry: "energy".into(),
            target_audience: "homeowners".into(),
            topic: "solar".into(),
            brand_tone: "warm".into(),
        }
    }

    fn state() -> PipelineState {
        PipelineState::new(
            request(),
            ResearchReport {
                report: "r".into(),
                source_count: 7,
            },
            Strategy { text: "s".into() },
        )
    }

    fn verdict(channel: Channel, score: f64, approved: bool) -> QualityVerdict {
        QualityVerdict {
            channel,
            rubric: RubricScores::default(),
            overall_score: score,
            recommendation: if approved {
                Recommendation::Approve
            } else {
                Recommendation::Revise
            },
            feedback: format!("{channel} feedback"),
            approved,
            evaluation: String::new(),
            fallback: false,
        }
    }

    fn all_verdicts(score: f64, approved: bool) -> Vec<QualityVerdict> {
        Channel::ALL.iter().map(|&c| verdict(c, score, approved)).collect()
    }

    fn attempt(pass: u32, score: f64) -> Attempt {
        Attempt {
            pass,
            content: format!("pass {pass}"),
            score,
        }
    }

    #[test]
    fn select_best_is_stable_max() {
        let attempts = vec![attempt(1, 6.0), attempt(2, 8.0), attempt(3, 8.0)];
        assert_eq!(select_best(&attempts).map(|a| a.pass), Some(2));

        let flat = vec![attempt(1, 5.0), attempt(2, 5.0)];
        assert_eq!(select_best(&flat).map(|a| a.pass), Some(1));

        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn quality_pass_appends_one_attempt_per_channel() {
        let mut s = state();
        s.set_draft(Channel::Twitter, "tweet".into());
        s.record_quality_pass(all_verdicts(6.0, false)).unwrap();
        s.record_quality_pass(all_verdicts(7.0, false)).unwrap();

        assert_eq!(s.quality_passes(), 2);
        for channel in Channel::ALL {
            assert_eq!(s.slot(channel).attempts.len(), 2);
        }
        assert_eq!(s.slot(Channel::Twitter).attempts[0].content, "tweet");
        assert_eq!(s.slot(Channel::LinkedIn).attempts[1].pass, 2);
    }

    #[test]
    fn incomplete_quality_pass_is_rejected() {
        let mut s = state();
        let err = s
            .record_quality_pass(vec![verdict(Channel::Twitter, 9.0, true)])
            .unwrap_err();
        assert!(matches!(err, BrandcastError::Validation { .. }));
        assert_eq!(s.quality_passes(), 0);
    }

    #[test]
    fn next_stage_stops_when_all_approved() {
        let mut s = state();
        s.record_quality_pass(all_verdicts(9.0, true)).unwrap();
        assert!(s.all_approved());
        assert_eq!(next_stage(&s), Stage::Done);
    }

    #[test]
    fn next_stage_stops_at_retry_bound() {
        let mut s = state();
        s.record_quality_pass(all_verdicts(5.0, false)).unwrap();
        assert_eq!(next_stage(&s), Stage::Regenerate);

        for expected in 1..=MAX_REGENERATION_PASSES {
            s.begin_regeneration();
            assert_eq!(s.retry_count(), expected);
            s.record_quality_pass(all_verdicts(5.0, false)).unwrap();
        }
        assert_eq!(next_stage(&s), Stage::Done);
        assert!(!s.all_approved());
    }

    #[test]
    fn regeneration_targets_unapproved_channels() {
        let mut s = state();
        let mut verdicts = all_verdicts(9.0, true);
        verdicts[2] = verdict(Channel::Instagram, 6.0, false);
        s.record_quality_pass(verdicts).unwrap();

        let todo = s.begin_regeneration();
        assert_eq!(todo, vec![(Channel::Instagram, "Instagram feedback".to_string())]);
    }

    #[test]
    fn finish_selects_best_attempts() {
        let mut s = state();
        s.set_draft(Channel::Newsletter, "first".into());
        s.record_quality_pass(all_verdicts(6.0, false)).unwrap();
        s.begin_regeneration();
        s.set_draft(Channel::Newsletter, "second".into());
        s.record_quality_pass(all_verdicts(5.0, false)).unwrap();

        let result = s.finish(RunId::new()).unwrap();
        let newsletter = result.channel(Channel::Newsletter).unwrap();
        assert_eq!(newsletter.content, "first");
        assert_eq!(newsletter.selected_pass, Some(1));
        assert_eq!(newsletter.verdict.overall_score, 5.0);
        assert_eq!(result.research_sources, 7);
        assert_eq!(result.retry_count, 1);
    }

    #[test]
    fn finish_requires_a_quality_pass() {
        assert!(state().finish(RunId::new()).is_err());
    }
}
