//! Prompt assembly: orders system, data, directive and user fragments.
//!
//! Assembly order:
//! 0. a non-empty data fragment is attached to the system fragment
//! 1. the structured-output directive is appended to the system fragment
//! 2. system and user are joined with a blank line, system first
//!
//! The directive lands on the system side before the join, so a directive
//! with no system fragment still precedes the user fragment.

use crate::llm_client::prompts::{DATA_FRAGMENT_SEPARATOR, JSON_DIRECTIVE};

const FRAGMENT_SEPARATOR: &str = "\n\n";

/// Inputs to one assembly. Fragments are expected to be substituted already.
#[derive(Debug, Clone, Default)]
pub struct PromptParts<'a> {
    pub system: &'a str,
    /// Output of a conversion template rendered against a data tree.
    pub data: Option<&'a str>,
    pub user: &'a str,
    pub json_directive: bool,
    /// Replaces the stock directive sentence when non-empty.
    pub directive_override: Option<&'a str>,
}

/// Attaches a data-derived fragment after the system fragment.
pub fn attach_data_fragment(system: &str, data: &str) -> String {
    match (system.is_empty(), data.is_empty()) {
        (_, true) => system.to_string(),
        (true, false) => data.to_string(),
        (false, false) => format!("{system}{DATA_FRAGMENT_SEPARATOR}{data}"),
    }
}

/// Builds the final prompt string.
pub fn assemble(parts: &PromptParts<'_>) -> String {
    let mut system = attach_data_fragment(parts.system, parts.data.unwrap_or_default());

    if parts.json_directive {
        let directive = parts
            .directive_override
            .filter(|d| !d.is_empty())
            .unwrap_or(JSON_DIRECTIVE);
        if !system.is_empty() {
            system.push_str(FRAGMENT_SEPARATOR);
        }
        system.push_str(directive);
    }

    match (system.is_empty(), parts.user.is_empty()) {
        (false, false) => format!("{system}{FRAGMENT_SEPARATOR}{}", parts.user),
        (false, true) => system,
        (true, _) => parts.user.to_string(),
    }
}
