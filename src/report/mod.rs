//! Report output: the synthesized report file and the run summary.

pub mod publisher;
pub mod summary;

pub use publisher::ReportPublisher;
pub use summary::{generate_summary_text, write_summary_json};
