// Shared prompt fragments.

/// Directive appended to the system fragment when structured output is requested.
pub const JSON_DIRECTIVE: &str =
    "You must respond in JSON format only. Do not include any other text.";

/// Separator placed between the system fragment and a data-derived fragment.
pub const DATA_FRAGMENT_SEPARATOR: &str = "\n\n---\n\n";

