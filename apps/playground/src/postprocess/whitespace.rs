//! Whitespace normalization.

use once_cell::sync::Lazy;
use regex::Regex;

static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("valid pattern"));
// CRLF mode: `$` also matches before `\r\n`
static LINE_EDGE_SPACES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mR)^ +| +$").expect("valid pattern"));
static NEWLINE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\r?\n){3,}").expect("valid pattern"));

/// Collapses space runs, trims each line, then caps blank runs at one empty line.
///
/// Lines are trimmed before newlines are collapsed: a line holding only spaces
/// becomes empty and may join a newline run, which the final step then caps.
/// This ordering keeps the transform idempotent.
pub fn remove_extra_spaces(text: &str) -> String {
    let collapsed = SPACE_RUN.replace_all(text, " ");
    let trimmed = LINE_EDGE_SPACES.replace_all(&collapsed, "");
    NEWLINE_RUN.replace_all(&trimmed, "${1}${1}").into_owned()
}
