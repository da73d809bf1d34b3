//! Markdown removal: regex passes that reduce common markdown to plain text.
//!
//! Fenced blocks must go before inline code is unwrapped, otherwise the fence
//! backticks would be read as inline spans and the block body would leak out.
//! Blockquote markers go before heading and bullet prefixes so `> - item`
//! loses both in one pass. Images are unwrapped before links so `![alt](src)`
//! leaves `alt` rather than `!alt`.
//!
//! Every rule only deletes characters, so the passes are repeated until the
//! text stops changing. The result is stable under a second removal.

use once_cell::sync::Lazy;
use regex::Regex;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rule {
    Rule {
        pattern: Regex::new(pattern).expect("markdown pattern is valid"),
        replacement,
    }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        // fenced code blocks
        rule(r"(?s)```.*?```", ""),
        // inline code
        rule(r"`([^`]+)`", "${1}"),
        // bold
        rule(r"\*\*(.*?)\*\*", "${1}"),
        rule(r"__(.*?)__", "${1}"),
        // italic
        rule(r"\*(.*?)\*", "${1}"),
        rule(r"_(.*?)_", "${1}"),
        // blockquotes, nested ones included
        rule(r"(?mR)^[ \t]*(?:>\s+)+", ""),
        // headings
        rule(r"(?mR)^[ \t]*#{1,6}\s+", ""),
        // list bullets
        rule(r"(?mR)^\s*[-*+]\s+", ""),
        // images, then links
        rule(r"!\[([^\]]*)\]\([^)]+\)", "${1}"),
        rule(r"\[([^\]]+)\]\([^)]+\)", "${1}"),
        // horizontal rules
        rule(r"(?mR)^[ \t]*[-*_]{3,}[ \t]*$", ""),
    ]
});

fn remove_once(text: &str) -> String {
    RULES.iter().fold(text.to_string(), |acc, rule| {
        rule.pattern
            .replace_all(&acc, rule.replacement)
            .into_owned()
    })
}

pub fn remove_markdown(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = remove_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}
