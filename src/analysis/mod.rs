//! Analysis stages.
//!
//! Records are partitioned by district, projected into batches, analyzed one
//! district at a time, and finally synthesized into a single report.

pub mod analyzer;
pub mod batch;
pub mod partitioner;
pub mod prompts;
pub mod synthesizer;

pub use analyzer::DistrictAnalyzer;
pub use batch::build_batches;
pub use partitioner::partition_by_district;
pub use synthesizer::ReportSynthesizer;
