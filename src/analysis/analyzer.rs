//! Per-district analysis stage.
//!
//! Districts are analyzed one at a time. A district whose batch cannot be
//! serialized or whose generation call fails is logged and skipped; the
//! remaining districts are still processed.

use super::prompts;
use crate::error::AnalysisError;
use crate::llm::{GenerationParams, TextGenerator};
use crate::models::{AnalysisResult, DistrictBatch, DistrictFailure};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

/// Outcome of analyzing every district batch.
#[derive(Debug, Default)]
pub struct AnalysisRun {
    /// Successful analyses in processing order.
    pub results: Vec<AnalysisResult>,
    /// Districts that were skipped.
    pub failures: Vec<DistrictFailure>,
}

/// Runs the per-district generation calls.
pub struct DistrictAnalyzer<'g> {
    generator: &'g dyn TextGenerator,
    params: GenerationParams,
    show_progress: bool,
}

impl<'g> DistrictAnalyzer<'g> {
    pub fn new(generator: &'g dyn TextGenerator, params: GenerationParams) -> Self {
        Self {
            generator,
            params,
            show_progress: false,
        }
    }

    /// Draw a progress bar on stderr while analyzing.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Analyze a single batch.
    pub async fn analyze(&self, batch: &DistrictBatch) -> Result<AnalysisResult, AnalysisError> {
        let document = batch
            .to_document()
            .map_err(|source| AnalysisError::Serialization {
                district: batch.district_name.clone(),
                source,
            })?;

        let prompt = prompts::district_prompt(&document);
        let text = self
            .generator
            .generate(&prompt, &self.params)
            .await
            .map_err(|source| AnalysisError::Generation {
                district: batch.district_name.clone(),
                source,
            })?;

        Ok(AnalysisResult {
            district: batch.district_name.clone(),
            text,
        })
    }

    /// Analyze every batch in order, skipping failures.
    ///
    /// `on_start` is called with the 1-based index before each call.
    pub async fn analyze_all<F>(&self, batches: &[DistrictBatch], mut on_start: F) -> AnalysisRun
    where
        F: FnMut(usize, usize),
    {
        let total = batches.len();
        let progress = self.progress_bar(total);
        let mut run = AnalysisRun::default();

        for (i, batch) in batches.iter().enumerate() {
            let current = i + 1;
            on_start(current, total);
            info!(
                "[{}/{}] Analyzing district: {} ({} action steps)",
                current,
                total,
                batch.district_name,
                batch.action_steps.len()
            );
            progress.set_message(batch.district_name.clone());

            match self.analyze(batch).await {
                Ok(result) => {
                    info!("[{}/{}] ✅ {}", current, total, batch.district_name);
                    run.results.push(result);
                }
                Err(e) => {
                    error!("[{}/{}] ❌ {}", current, total, e);
                    run.failures.push(DistrictFailure {
                        district: batch.district_name.clone(),
                        error: e.to_string(),
                    });
                }
            }

            progress.inc(1);
        }

        progress.finish_and_clear();
        info!(
            "District analysis finished: {} succeeded, {} skipped",
            run.results.len(),
            run.failures.len()
        );

        run
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(total as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar
    }
}
