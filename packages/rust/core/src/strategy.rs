//! Strategy stage: research report to campaign plan.

use std::sync::Arc;

use tracing::{info, instrument};

use brandcast_llm::{GenerationRequest, TextGenerator};
use brandcast_shared::{BrandcastError, ResearchReport, Result, Strategy};

use crate::prompts::{self, BriefContext};

pub struct Strategist {
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
}

impl Strategist {
    pub fn new(generator: Arc<dyn TextGenerator>, temperature: f32) -> Self {
        Self {
            generator,
            temperature,
        }
    }

    /// Produce the campaign strategy. Any failure is a [`BrandcastError::Strategy`].
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn create_strategy(
        &self,
        research: &ResearchReport,
        brand_info: &str,
        topic: &str,
        target_audience: &str,
        brand_tone: &str,
    ) -> Result<Strategy> {
        let prompt = prompts::strategy(
            &BriefContext {
                brand_info,
                topic,
                target_audience,
            },
            brand_tone,
            &research.report,
        );

        let text = self
            .generator
            .generate(&GenerationRequest::new(prompt, self.temperature))
            .await
            .map_err(|e| BrandcastError::Strategy(e.to_string()))?;

        info!(chars = text.len(), "strategy created");
        Ok(Strategy { text })
    }
}
