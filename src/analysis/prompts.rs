//! Prompt templates for the two generation stages.

/// Separator placed between district analyses in the synthesis prompt.
pub const DISTRICT_SEPARATOR: &str = "\n\n---DISTRICT SEPARATOR---\n\n";

const DISTRICT_PROMPT_PREFIX: &str =
    "Analyze this school district data and identify patterns: ";

const SYNTHESIS_PROMPT_PREFIX: &str = "Write a single cohesive essay that synthesizes \
the findings below into one report. Do not use bullet points or lists. Write in \
paragraphs, about one page long when single-spaced. Base the essay on these district \
pattern analyses: ";

/// Prompt for a single district, given its serialized batch document.
pub fn district_prompt(batch_document: &str) -> String {
    format!("{DISTRICT_PROMPT_PREFIX}{batch_document}")
}

/// Prompt for the cross-district synthesis, given the joined analyses.
pub fn synthesis_prompt(combined_analyses: &str) -> String {
    format!("{SYNTHESIS_PROMPT_PREFIX}{combined_analyses}")
}
