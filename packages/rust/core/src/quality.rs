//! Quality evaluation: score a draft against the strategy and brand tone.
//!
//! Evaluation fails open. If the evaluator call errors, or its reply lacks
//! a parseable overall score or recommendation, the draft is approved with
//! [`FALLBACK_SCORE`] so a broken scoring pass can never stall a run.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{instrument, warn};

use brandcast_llm::{GenerationRequest, TextGenerator};
use brandcast_shared::{Channel, QualityVerdict, Recommendation, RubricScores, Strategy};

use crate::prompts;

/// Minimum overall score for approval (inclusive).
pub const APPROVAL_THRESHOLD: f64 = 7.5;

/// Score assigned when evaluation fails.
pub const FALLBACK_SCORE: f64 = 8.0;

const FALLBACK_FEEDBACK: &str = "Evaluation could not be completed due to an error.";

const SCORE_MARKER: &str = "OVERALL SCORE:";
const RECOMMENDATION_MARKER: &str = "RECOMMENDATION:";
const FEEDBACK_MARKER: &str = "FEEDBACK:";

/// `Label: n/10` rubric lines, tolerating list markers and markdown emphasis.
static RUBRIC_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[\s>*\-\d.]*(brand alignment|strategy adherence|engagement potential|clarity|call[- ]to[- ]action|platform optimization)\**\s*:\s*\**\s*\[?\s*(\d+(?:\.\d+)?)\s*\]?\s*/\s*10",
    )
    .expect("valid regex")
});

/// Whether a verdict clears the approval bar.
pub fn is_approved(recommendation: &Recommendation, overall_score: f64) -> bool {
    *recommendation == Recommendation::Approve && overall_score >= APPROVAL_THRESHOLD
}

pub struct QualityEvaluator {
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
}

impl QualityEvaluator {
    pub fn new(generator: Arc<dyn TextGenerator>, temperature: f32) -> Self {
        Self {
            generator,
            temperature,
        }
    }

    /// Score `content`. Never fails; see the module docs for the fallback.
    #[instrument(skip_all, fields(channel = %channel))]
    pub async fn evaluate(
        &self,
        channel: Channel,
        content: &str,
        strategy: &Strategy,
        brand_tone: &str,
    ) -> QualityVerdict {
        let prompt = prompts::evaluation(channel, content, &strategy.text, brand_tone);

        match self
            .generator
            .generate(&GenerationRequest::new(prompt, self.temperature))
            .await
        {
            Ok(evaluation) => verdict_from_text(channel, evaluation),
            Err(e) => {
                warn!(error = %e, "evaluation call failed, approving by default");
                fallback_verdict(channel, format!("Evaluation error: {e}"), RubricScores::default())
            }
        }
    }
}

/// Build a verdict from raw evaluator output.
pub fn verdict_from_text(channel: Channel, evaluation: String) -> QualityVerdict {
    let rubric = parse_rubric(&evaluation);

    let (Some(overall_score), Some(recommendation)) = (
        parse_overall_score(&evaluation),
        parse_recommendation(&evaluation),
    ) else {
        warn!(%channel, "evaluation missing score or recommendation, approving by default");
        return fallback_verdict(channel, evaluation, rubric);
    };

    QualityVerdict {
        channel,
        rubric,
        overall_score,
        approved: is_approved(&recommendation, overall_score),
        recommendation,
        feedback: parse_feedback(&evaluation),
        evaluation,
        fallback: false,
    }
}

fn fallback_verdict(channel: Channel, evaluation: String, rubric: RubricScores) -> QualityVerdict {
    QualityVerdict {
        channel,
        rubric,
        overall_score: FALLBACK_SCORE,
        recommendation: Recommendation::Approve,
        feedback: FALLBACK_FEEDBACK.to_string(),
        approved: true,
        evaluation,
        fallback: true,
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn strip_emphasis(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '[' | ']' | '_'))
}

/// Overall score from the first `OVERALL SCORE:` line, if it is a finite number.
///
/// Out-of-scale values are kept as-is; [`is_approved`] decides what they mean.
pub fn parse_overall_score(text: &str) -> Option<f64> {
    let line = text.lines().find(|l| l.contains(SCORE_MARKER))?;
    let segment = line.split(':').nth(1)?;
    let number = segment.split('/').next()?;
    let score: f64 = strip_emphasis(number).parse().ok()?;
    score.is_finite().then_some(score)
}

/// First token after `RECOMMENDATION:`, upper-cased.
pub fn parse_recommendation(text: &str) -> Option<Recommendation> {
    let line = text.lines().find(|l| l.contains(RECOMMENDATION_MARKER))?;
    let segment = line.split(':').nth(1)?;
    segment
        .split_whitespace()
        .map(|token| strip_emphasis(token).trim_end_matches(['.', '!']))
        .find(|token| !token.is_empty())
        .map(|token| Recommendation::from(token.to_string()))
}

/// Text between `FEEDBACK:` and `RECOMMENDATION:`, trimmed. Empty when absent.
pub fn parse_feedback(text: &str) -> String {
    let Some((_, after)) = text.split_once(FEEDBACK_MARKER) else {
        return String::new();
    };
    let body = after
        .split_once(RECOMMENDATION_MARKER)
        .map_or(after, |(before, _)| before);
    strip_emphasis(body).to_string()
}

/// Rubric sub-scores; lines that are missing or out of range stay `None`.
pub fn parse_rubric(text: &str) -> RubricScores {
    let mut rubric = RubricScores::default();

    for caps in RUBRIC_LINE_RE.captures_iter(text) {
        let label = caps[1].to_lowercase().replace('-', " ");
        let Some(score) = caps[2].parse::<f64>().ok().filter(|s| (0.0..=10.0).contains(s)) else {
            continue;
        };

        let slot = match label.as_str() {
            "brand alignment" => &mut rubric.brand_alignment,
            "strategy adherence" => &mut rubric.strategy_adherence,
            "engagement potential" => &mut rubric.engagement_potential,
            "clarity" => &mut rubric.clarity,
            "call to action" => &mut rubric.call_to_action,
            "platform optimization" => &mut rubric.platform_optimization,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(score);
        }
    }

    rubric
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedGenerator;
    use brandcast_shared::BrandcastError;

    const SAMPLE: &str = "\
SCORES:
Brand Alignment: 8/10
Strategy Adherence: 7/10
Engagement Potential: 9/10
Clarity: 8/10
Call-to-Action: 6/10
Platform Optimization: 8/10

OVERALL SCORE: 7.7/10

FEEDBACK:
Strong hook. The call to action is vague; name the next step.

RECOMMENDATION: APPROVE";

    fn evaluation(score: &str, rec: &str) -> String {
        format!("OVERALL SCORE: {score}/10\n\nFEEDBACK:\nfine\n\nRECOMMENDATION: {rec}")
    }

    #[test]
    fn parses_well_formed_evaluation() {
        let v = verdict_from_text(Channel::LinkedIn, SAMPLE.to_string());
        assert_eq!(v.overall_score, 7.7);
        assert_eq!(v.recommendation, Recommendation::Approve);
        assert!(v.approved);
        assert!(!v.fallback);
        assert_eq!(
            v.feedback,
            "Strong hook. The call to action is vague; name the next step."
        );
        assert_eq!(v.rubric.call_to_action, Some(6.0));
        assert_eq!(v.rubric.engagement_potential, Some(9.0));
    }

    #[test]
    fn approval_boundary() {
        let at = verdict_from_text(Channel::Twitter, evaluation("7.5", "APPROVE"));
        assert!(at.approved);

        let below = verdict_from_text(Channel::Twitter, evaluation("7.49", "APPROVE"));
        assert!(!below.approved);
        assert!(!below.fallback);

        let revise = verdict_from_text(Channel::Twitter, evaluation("9", "REVISE"));
        assert!(!revise.approved);
    }

    #[test]
    fn missing_score_fails_open() {
        let v = verdict_from_text(
            Channel::Instagram,
            "FEEDBACK:\nmeh\n\nRECOMMENDATION: REVISE".to_string(),
        );
        assert_eq!(v.overall_score, 8.0);
        assert_eq!(v.recommendation, Recommendation::Approve);
        assert!(v.approved);
        assert!(v.fallback);
        assert_eq!(v.feedback, FALLBACK_FEEDBACK);
    }

    #[test]
    fn missing_recommendation_fails_open() {
        let v = verdict_from_text(Channel::Instagram, "OVERALL SCORE: 3/10".to_string());
        assert!(v.fallback);
        assert!(v.approved);
    }

    #[test]
    fn score_tolerates_markdown() {
        assert_eq!(parse_overall_score("**OVERALL SCORE:** 8.5/10"), Some(8.5));
        assert_eq!(parse_overall_score("OVERALL SCORE: [6]/10"), Some(6.0));
        assert_eq!(parse_overall_score("OVERALL SCORE: 7"), Some(7.0));
    }

    #[test]
    fn score_rejects_garbage() {
        assert_eq!(parse_overall_score("OVERALL SCORE: high/10"), None);
        assert_eq!(parse_overall_score("OVERALL SCORE: NaN/10"), None);
        assert_eq!(parse_overall_score("no marker here"), None);
    }

    #[test]
    fn out_of_scale_score_keeps_revise() {
        let v = verdict_from_text(
            Channel::Twitter,
            "OVERALL SCORE: 42/60\n\nFEEDBACK:\nWeak hook, no CTA.\n\nRECOMMENDATION: REVISE"
                .to_string(),
        );
        assert_eq!(v.overall_score, 42.0);
        assert_eq!(v.recommendation, Recommendation::Revise);
        assert!(!v.approved);
        assert!(!v.fallback);
        assert_eq!(v.feedback, "Weak hook, no CTA.");
        assert_eq!(parse_overall_score("OVERALL SCORE: 85/100"), Some(85.0));
    }

    #[test]
    fn recommendation_is_case_normalized() {
        assert_eq!(
            parse_recommendation("RECOMMENDATION: revise"),
            Some(Recommendation::Revise)
        );
        assert_eq!(
            parse_recommendation("**RECOMMENDATION:** APPROVE."),
            Some(Recommendation::Approve)
        );
        assert_eq!(
            parse_recommendation("RECOMMENDATION: [Approve or Revise]"),
            Some(Recommendation::Approve)
        );
        assert_eq!(
            parse_recommendation("RECOMMENDATION: hold"),
            Some(Recommendation::Other("HOLD".into()))
        );
        assert_eq!(parse_recommendation("RECOMMENDATION:   "), None);
    }

    #[test]
    fn unknown_recommendation_is_not_approved() {
        let v = verdict_from_text(Channel::Twitter, evaluation("9", "MAYBE"));
        assert!(!v.approved);
        assert!(!v.fallback);
    }

    #[test]
    fn feedback_without_marker_is_empty() {
        assert_eq!(parse_feedback("OVERALL SCORE: 8/10"), "");
    }

    #[test]
    fn rubric_lines_are_optional() {
        let rubric = parse_rubric("- **Clarity**: 7/10\n3. Brand Alignment: [9]/10\n");
        assert_eq!(rubric.clarity, Some(7.0));
        assert_eq!(rubric.brand_alignment, Some(9.0));
        assert_eq!(rubric.platform_optimization, None);
    }

    #[tokio::test]
    async fn failed_call_fails_open() {
        let generator =
            ScriptedGenerator::new(|_| Err(BrandcastError::Generation("503".into())));
        let evaluator = QualityEvaluator::new(generator, 0.2);
        let strategy = Strategy { text: "plan".into() };

        let v = evaluator
            .evaluate(Channel::Newsletter, "draft", &strategy, "warm")
            .await;
        assert!(v.approved);
        assert!(v.fallback);
        assert_eq!(v.overall_score, FALLBACK_SCORE);
        assert!(v.evaluation.contains("503"));
    }

    #[tokio::test]
    async fn evaluate_sends_draft_and_strategy() {
        let generator = ScriptedGenerator::new(|_| Ok(SAMPLE.to_string()));
        let evaluator = QualityEvaluator::new(generator.clone(), 0.2);
        let strategy = Strategy { text: "THE PLAN".into() };

        let v = evaluator
            .evaluate(Channel::Twitter, "THE DRAFT", &strategy, "warm")
            .await;
        assert_eq!(v.channel, Channel::Twitter);
        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("THE DRAFT"));
        assert!(prompt.contains("THE PLAN"));
        assert!(prompt.contains("PLATFORM: Twitter"));
    }
}
