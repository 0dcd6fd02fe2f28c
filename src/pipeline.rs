//! End-to-end district analysis pipeline.
//!
//! Stages run strictly in sequence:
//! load → partition → batch → analyze each district → synthesize → publish.
//! A district whose analysis fails is skipped. A failed synthesis stops the
//! run without writing anything. A failed publish still returns the report.

use crate::analysis::{build_batches, partition_by_district, DistrictAnalyzer, ReportSynthesizer};
use crate::error::{PipelineError, PublishError};
use crate::llm::{GenerationParams, TextGenerator};
use crate::models::{DistrictOrder, FinalReport, RunSummary};
use crate::report::ReportPublisher;
use crate::source::RecordStore;
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

/// Observable states of a pipeline run. No state is entered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Loaded { records: usize },
    Partitioned { districts: usize },
    Batched { batches: usize },
    Analyzing { current: usize, total: usize },
    Synthesizing,
    Published,
    SynthesisFailed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Loaded { records } => write!(f, "Loaded({records})"),
            PipelineStage::Partitioned { districts } => write!(f, "Partitioned({districts})"),
            PipelineStage::Batched { batches } => write!(f, "Batched({batches})"),
            PipelineStage::Analyzing { current, total } => {
                write!(f, "Analyzing({current}/{total})")
            }
            PipelineStage::Synthesizing => write!(f, "Synthesizing"),
            PipelineStage::Published => write!(f, "Published"),
            PipelineStage::SynthesisFailed => write!(f, "SynthesisFailed"),
        }
    }
}

/// Settings that shape a pipeline run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub district_order: DistrictOrder,
    pub params: GenerationParams,
    pub show_progress: bool,
}

/// Result of a run that reached a synthesized report.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub report: FinalReport,
    pub summary: RunSummary,
    /// Set when the report could not be written to disk.
    pub publish_error: Option<PublishError>,
}

impl PipelineOutcome {
    pub fn published(&self) -> bool {
        self.publish_error.is_none()
    }
}

/// Drives one run of the district analysis.
pub struct Pipeline<'g> {
    generator: &'g dyn TextGenerator,
    publisher: ReportPublisher,
    options: PipelineOptions,
    stages: Vec<PipelineStage>,
}

impl<'g> Pipeline<'g> {
    pub fn new(
        generator: &'g dyn TextGenerator,
        publisher: ReportPublisher,
        options: PipelineOptions,
    ) -> Self {
        Self {
            generator,
            publisher,
            options,
            stages: Vec::new(),
        }
    }

    /// States entered so far, in order.
    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// Load the table at `source` and run every stage over it.
    pub async fn run(&mut self, source: &Path) -> Result<PipelineOutcome, PipelineError> {
        let store = RecordStore::load(source)?;
        self.run_store(&store).await
    }

    /// Run every stage over already loaded records.
    pub async fn run_store(
        &mut self,
        store: &RecordStore,
    ) -> Result<PipelineOutcome, PipelineError> {
        let started = Instant::now();
        let mut summary = RunSummary::new(
            store.source().to_path_buf(),
            self.generator.model_name().to_string(),
        );
        summary.records_loaded = store.len();
        enter(&mut self.stages, PipelineStage::Loaded { records: store.len() });

        let groups = partition_by_district(store.records(), self.options.district_order);
        summary.districts_total = groups.len();
        enter(
            &mut self.stages,
            PipelineStage::Partitioned {
                districts: groups.len(),
            },
        );

        let batches = build_batches(&groups);
        enter(
            &mut self.stages,
            PipelineStage::Batched {
                batches: batches.len(),
            },
        );

        let analyzer = DistrictAnalyzer::new(self.generator, self.options.params)
            .with_progress(self.options.show_progress);
        let stages = &mut self.stages;
        let run = analyzer
            .analyze_all(&batches, |current, total| {
                enter(stages, PipelineStage::Analyzing { current, total })
            })
            .await;
        summary.districts_analyzed = run.results.len();
        summary.failed_districts = run.failures;

        enter(&mut self.stages, PipelineStage::Synthesizing);
        let synthesizer = ReportSynthesizer::new(self.generator, self.options.params);
        let report = match synthesizer.synthesize(&run.results).await {
            Ok(report) => report,
            Err(e) => {
                error!("Synthesis failed, no report written: {}", e);
                enter(&mut self.stages, PipelineStage::SynthesisFailed);
                return Err(PipelineError::Synthesis(e));
            }
        };

        let publish_error = match self.publisher.publish(&report) {
            Ok(()) => {
                summary.output_path = Some(self.publisher.path().to_path_buf());
                enter(&mut self.stages, PipelineStage::Published);
                None
            }
            Err(e) => {
                error!("{}", e);
                Some(e)
            }
        };

        summary.duration_seconds = started.elapsed().as_secs_f64();
        info!(
            "Run complete: {}/{} districts analyzed in {:.1}s",
            summary.districts_analyzed, summary.districts_total, summary.duration_seconds
        );

        Ok(PipelineOutcome {
            report,
            summary,
            publish_error,
        })
    }
}

fn enter(stages: &mut Vec<PipelineStage>, stage: PipelineStage) {
    debug!("Pipeline stage: {}", stage);
    stages.push(stage);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::prompts::{self, DISTRICT_SEPARATOR};
    use crate::error::GenerationError;
    use crate::llm::testing::ScriptedGenerator;
    use crate::source::reader::read_action_steps_from;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const HEADER: &str = "UIP: District Name,Improvement Action Step,Description of Action Step,Start Date,Target Date,Major Improvement Strategy,Resources\n";

    fn store(csv: &str) -> RecordStore {
        let origin = Path::new("inline.csv");
        let records = read_action_steps_from(csv.as_bytes(), origin).unwrap();
        RecordStore::from_records(origin.to_path_buf(), records)
    }

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
    }

    #[tokio::test]
    async fn test_header_only_input_synthesizes_empty_set() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("report.txt");
        let generator = ScriptedGenerator::new().reply("No district data was available.");
        let mut pipeline = Pipeline::new(
            &generator,
            ReportPublisher::new(&output),
            PipelineOptions::default(),
        );

        let outcome = pipeline.run_store(&store(HEADER)).await.unwrap();

        assert_eq!(generator.calls(), 1);
        assert_eq!(generator.prompts()[0], prompts::synthesis_prompt(""));
        assert_eq!(outcome.summary.districts_total, 0);
        assert!(outcome.published());
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "No district data was available."
        );
        assert_eq!(
            pipeline.stages(),
            &[
                PipelineStage::Loaded { records: 0 },
                PipelineStage::Partitioned { districts: 0 },
                PipelineStage::Batched { batches: 0 },
                PipelineStage::Synthesizing,
                PipelineStage::Published,
            ]
        );
    }

    #[tokio::test]
    async fn test_single_district_run() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("report.txt");
        let csv = format!(
            "{HEADER}Jeffco,s1,d1,2023,2024,lit,a\nJeffco,s2,d2,2023,2024,lit,b\nJeffco,s3,d3,2023,2024,math,c\n"
        );
        let generator = ScriptedGenerator::new()
            .reply("Jeffco focuses on literacy.")
            .reply("One district, one story.");
        let mut pipeline = Pipeline::new(
            &generator,
            ReportPublisher::new(&output),
            PipelineOptions::default(),
        );

        let outcome = pipeline.run_store(&store(&csv)).await.unwrap();

        assert_eq!(generator.calls(), 2);
        let prompts_sent = generator.prompts();
        assert!(prompts_sent[0].contains("\"district_name\": \"Jeffco\""));
        assert!(prompts_sent[0].contains("\"step\": \"s3\""));
        assert!(prompts_sent[1].ends_with("analyses: Jeffco focuses on literacy."));
        assert_eq!(outcome.report.text, "One district, one story.");
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "One district, one story.");
        assert_eq!(outcome.summary.records_loaded, 3);
        assert_eq!(outcome.summary.districts_analyzed, 1);
        assert_eq!(outcome.summary.output_path.as_deref(), Some(output.as_path()));
        assert!(generator.params().iter().all(|p| p.temperature == 0.0));
    }

    #[tokio::test]
    async fn test_first_district_failure_is_isolated() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("report.txt");
        let csv = format!("{HEADER}Aurora,a1,,,,,\nBoulder,b1,,,,,\n");
        let generator = ScriptedGenerator::new()
            .fail(GenerationError::Timeout { seconds: 30 })
            .reply("Boulder analysis")
            .reply("Synthesized");
        let mut pipeline = Pipeline::new(
            &generator,
            ReportPublisher::new(&output),
            PipelineOptions::default(),
        );

        let outcome = pipeline.run_store(&store(&csv)).await.unwrap();

        assert_eq!(generator.calls(), 3);
        let synthesis_prompt = &generator.prompts()[2];
        assert!(synthesis_prompt.ends_with("analyses: Boulder analysis"));
        assert!(!synthesis_prompt.contains(DISTRICT_SEPARATOR));
        assert_eq!(outcome.summary.districts_analyzed, 1);
        assert_eq!(outcome.summary.failed_districts[0].district, "Aurora");
        assert!(outcome.published());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "Synthesized");
        assert!(pipeline
            .stages()
            .contains(&PipelineStage::Analyzing { current: 2, total: 2 }));
    }

    #[tokio::test]
    async fn test_missing_header_aborts_before_generation() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("report.txt");
        let generator = ScriptedGenerator::new();
        let mut pipeline = Pipeline::new(
            &generator,
            ReportPublisher::new(&output),
            PipelineOptions::default(),
        );

        let err = pipeline.run(&fixture("missing_header.csv")).await.unwrap_err();

        assert!(matches!(err, PipelineError::SourceLoad(_)));
        assert_eq!(generator.calls(), 0);
        assert!(pipeline.stages().is_empty());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_synthesis_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("report.txt");
        std::fs::write(&output, "previous run").unwrap();
        let generator = ScriptedGenerator::new()
            .reply("Aurora analysis")
            .fail(GenerationError::Api {
                status: 503,
                body: "busy".to_string(),
            });
        let mut pipeline = Pipeline::new(
            &generator,
            ReportPublisher::new(&output),
            PipelineOptions::default(),
        );

        let err = pipeline
            .run_store(&store(&format!("{HEADER}Aurora,a1,,,,,\n")))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Synthesis(_)));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous run");
        assert_eq!(pipeline.stages().last(), Some(&PipelineStage::SynthesisFailed));
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_report() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("no-such-dir").join("report.txt");
        let generator = ScriptedGenerator::new().reply("Aurora").reply("Final prose");
        let mut pipeline = Pipeline::new(
            &generator,
            ReportPublisher::new(&output),
            PipelineOptions::default(),
        );

        let outcome = pipeline
            .run_store(&store(&format!("{HEADER}Aurora,a1,,,,,\n")))
            .await
            .unwrap();

        assert!(!outcome.published());
        assert_eq!(outcome.report.text, "Final prose");
        assert!(outcome.summary.output_path.is_none());
        assert_ne!(pipeline.stages().last(), Some(&PipelineStage::Published));
    }

    #[tokio::test]
    async fn test_fixture_run_in_alphabetical_order() {
        let dir = TempDir::new().unwrap();
        let generator = ScriptedGenerator::new();
        let options = PipelineOptions {
            district_order: DistrictOrder::Alphabetical,
            ..PipelineOptions::default()
        };
        let mut pipeline = Pipeline::new(
            &generator,
            ReportPublisher::new(dir.path().join("report.txt")),
            options,
        );

        let outcome = pipeline.run(&fixture("action_steps.csv")).await.unwrap();

        assert_eq!(outcome.summary.districts_total, 2);
        assert_eq!(generator.calls(), 3);
        let prompts_sent = generator.prompts();
        assert!(prompts_sent[0].contains("Adams 12 Five Star Schools"));
        assert!(prompts_sent[1].contains("Denver Public Schools"));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(
            PipelineStage::Analyzing { current: 2, total: 5 }.to_string(),
            "Analyzing(2/5)"
        );
        assert_eq!(PipelineStage::Published.to_string(), "Published");
    }

    #[test]
    fn test_run_with_block_on() {
        let dir = TempDir::new().unwrap();
        let generator = ScriptedGenerator::new();
        let mut pipeline = Pipeline::new(
            &generator,
            ReportPublisher::new(dir.path().join("r.txt")),
            PipelineOptions::default(),
        );
        let outcome = tokio_test::block_on(pipeline.run_store(&store(HEADER))).unwrap();
        assert_eq!(outcome.report.text, "scripted reply");
    }
}
