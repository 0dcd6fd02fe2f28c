//! Cross-district synthesis stage.

use super::prompts::{self, DISTRICT_SEPARATOR};
use crate::error::GenerationError;
use crate::llm::{GenerationParams, TextGenerator};
use crate::models::{AnalysisResult, FinalReport};
use tracing::{debug, info, warn};

/// Join district analyses with the district separator, in order.
pub fn combine_analyses(results: &[AnalysisResult]) -> String {
    results
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join(DISTRICT_SEPARATOR)
}

/// Issues the single synthesis call over all district analyses.
pub struct ReportSynthesizer<'g> {
    generator: &'g dyn TextGenerator,
    params: GenerationParams,
}

impl<'g> ReportSynthesizer<'g> {
    pub fn new(generator: &'g dyn TextGenerator, params: GenerationParams) -> Self {
        Self { generator, params }
    }

    /// Produce the final report. Any generation failure is returned as is;
    /// there is no partial report.
    pub async fn synthesize(
        &self,
        results: &[AnalysisResult],
    ) -> Result<FinalReport, GenerationError> {
        if results.is_empty() {
            warn!("No district analyses succeeded; synthesizing from an empty set");
        }

        for result in results {
            debug!("Including analysis for {} ({} chars)", result.district, result.text.len());
        }

        let combined = combine_analyses(results);
        let prompt = prompts::synthesis_prompt(&combined);

        info!("Synthesizing report from {} district analyses", results.len());
        let text = self.generator.generate(&prompt, &self.params).await?;

        Ok(FinalReport { text })
    }
}
