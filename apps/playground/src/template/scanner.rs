//! Placeholder scanning: finds `${name}` or `{path.to.value}` tokens.
//!
//! The two grammars are never mixed in one scan. Output is the list of distinct
//! names in first-occurrence order, so a caller rendering one input per name
//! gets a deterministic layout.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static FLAT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{(\w+)\}").expect("flat token pattern is valid"));

static PATH_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([\p{L}_]\w*(?:\.[\p{L}_]\w*)*)\}").expect("path token pattern is valid")
});

/// Which placeholder syntax a scan or substitution uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grammar {
    /// `${name}` with word characters only, resolved against the variable store.
    #[default]
    Flat,
    /// `{a.b.c}` with dotted identifiers, resolved against a data tree.
    Path,
}

/// A placeholder occurrence: byte range of the whole token plus the inner name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub span: Range<usize>,
    pub name: &'a str,
}

/// Every token occurrence in `text`, in document order, duplicates included.
pub fn tokens(text: &str, grammar: Grammar) -> Vec<Token<'_>> {
    match grammar {
        Grammar::Flat => FLAT_TOKEN
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.get(1)?;
                Some(Token {
                    span: whole.range(),
                    name: name.as_str(),
                })
            })
            .collect(),
        Grammar::Path => PATH_TOKEN
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                // `${x}` belongs to the flat grammar
                if text[..whole.start()].ends_with('$') {
                    return None;
                }
                let name = caps.get(1)?;
                Some(Token {
                    span: whole.range(),
                    name: name.as_str(),
                })
            })
            .collect(),
    }
}

/// Distinct placeholder names in first-occurrence order.
pub fn scan(text: &str, grammar: Grammar) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for token in tokens(text, grammar) {
        if !names.iter().any(|n| n == token.name) {
            names.push(token.name.to_string());
        }
    }
    names
}
