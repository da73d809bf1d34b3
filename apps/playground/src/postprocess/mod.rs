//! Post-processing of model output.
//!
//! Four independently toggleable transforms run in a fixed order, whatever
//! order the caller lists them in: code extraction, markdown removal, emoji
//! removal, whitespace normalization. Each later stage expects the shape the
//! earlier ones produce. Every stage is a pure `&str -> String` function and
//! tolerates empty input.
//!
//! Code extraction runs once. The three cleanup stages never lengthen the
//! text, so they are repeated in order until a round changes nothing;
//! one stage can expose work for an earlier one (an emoji between `#` and the
//! heading text, say) and the repeat keeps the pipeline stable on its own
//! output.

pub mod code_blocks;
pub mod emoji;
pub mod handlers;
pub mod json_extract;
pub mod markdown;
pub mod whitespace;

use serde::{Deserialize, Serialize};

pub use code_blocks::extract_code_blocks;
pub use emoji::remove_emojis;
pub use json_extract::{extract_json, ParseOutcome};
pub use markdown::remove_markdown;
pub use whitespace::remove_extra_spaces;

/// Which transforms are enabled. Read fresh on every invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub extract_code: bool,
    pub remove_markdown: bool,
    pub remove_emojis: bool,
    pub remove_extra_spaces: bool,
}

#[cfg(test)]
impl PipelineConfig {
    pub fn all() -> Self {
        Self {
            extract_code: true,
            remove_markdown: true,
            remove_emojis: true,
            remove_extra_spaces: true,
        }
    }
}

type Stage = fn(&str) -> String;

/// Applies the enabled transforms in pipeline order.
pub fn apply(text: &str, config: &PipelineConfig) -> String {
    let extracted = if config.extract_code {
        extract_code_blocks(text)
    } else {
        text.to_string()
    };

    let cleanup: Vec<Stage> = [
        (config.remove_markdown, remove_markdown as Stage),
        (config.remove_emojis, remove_emojis),
        (config.remove_extra_spaces, remove_extra_spaces),
    ]
    .into_iter()
    .filter_map(|(enabled, stage)| enabled.then_some(stage))
    .collect();

    let mut current = extracted;
    loop {
        let next = cleanup.iter().fold(current.clone(), |acc, stage| stage(&acc));
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Display text and structured parse of one raw model response.
///
/// The extractor always sees the raw text, never the pipeline output.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedResponse {
    pub processed_text: String,
    pub parse: ParseOutcome,
}

pub fn process_response(raw: &str, config: &PipelineConfig) -> ProcessedResponse {
    ProcessedResponse {
        processed_text: apply(raw, config),
        parse: extract_json(raw),
    }
}
