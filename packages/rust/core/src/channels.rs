//! Channel writers: one draft per call, tuned per channel.

use std::sync::Arc;

use tracing::{debug, instrument};

use brandcast_llm::{GenerationRequest, TextGenerator};
use brandcast_shared::{Channel, ResearchReport, Result, Strategy};

use crate::prompts::{self, DraftContext};

pub struct ChannelWriter {
    channel: Channel,
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
}

impl ChannelWriter {
    pub fn new(channel: Channel, generator: Arc<dyn TextGenerator>, temperature: f32) -> Self {
        Self {
            channel,
            generator,
            temperature,
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Write one draft. Non-empty `feedback` is added to the prompt as revision notes.
    #[instrument(skip_all, fields(channel = %self.channel, revision = !feedback.is_empty()))]
    pub async fn generate(
        &self,
        research: &ResearchReport,
        strategy: &Strategy,
        brand_info: &str,
        topic: &str,
        brand_tone: &str,
        feedback: &str,
    ) -> Result<String> {
        let prompt = prompts::channel_draft(
            self.channel,
            &DraftContext {
                research: &research.report,
                strategy: &strategy.text,
                brand_info,
                topic,
                brand_tone,
                feedback,
            },
        );

        let draft = self
            .generator
            .generate(&GenerationRequest::new(prompt, self.temperature))
            .await?;

        debug!(chars = draft.len(), "draft written");
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedGenerator;
    use brandcast_shared::BrandcastError;

    fn inputs() -> (ResearchReport, Strategy) {
        (
            ResearchReport {
                report: "RESEARCH".into(),
                source_count: 1,
            },
            Strategy {
                text: "STRATEGY".into(),
            },
        )
    }

    #[tokio::test]
    async fn writes_with_channel_temperature() {
        let generator = ScriptedGenerator::new(|_| Ok("thread".into()));
        let writer = ChannelWriter::new(Channel::Twitter, generator.clone(), 0.7);
        let (research, strategy) = inputs();

        let draft = writer
            .generate(&research, &strategy, "Acme", "solar", "warm", "")
            .await
            .unwrap();

        assert_eq!(draft, "thread");
        assert_eq!(generator.temperatures(), vec![0.7]);
        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("CHANNEL: Twitter"));
        assert!(prompt.contains("RESEARCH"));
        assert!(prompt.contains("STRATEGY"));
    }

    #[tokio::test]
    async fn feedback_reaches_the_prompt() {
        let generator = ScriptedGenerator::new(|_| Ok("post".into()));
        let writer = ChannelWriter::new(Channel::LinkedIn, generator.clone(), 0.6);
        let (research, strategy) = inputs();

        writer
            .generate(&research, &strategy, "Acme", "solar", "warm", "Lead with the statistic.")
            .await
            .unwrap();

        assert!(generator.prompts()[0].contains("Lead with the statistic."));
    }

    #[tokio::test]
    async fn failure_is_returned() {
        let generator =
            ScriptedGenerator::new(|_| Err(BrandcastError::Generation("rate limited".into())));
        let writer = ChannelWriter::new(Channel::Newsletter, generator, 0.6);
        let (research, strategy) = inputs();

        assert!(
            writer
                .generate(&research, &strategy, "Acme", "solar", "warm", "")
                .await
                .is_err()
        );
    }
}
