//! Code block extraction.
//!
//! When any fenced block or inline code span is present the whole text is
//! replaced by the code bodies alone, joined by a horizontal rule. Prose
//! around the code is dropped on purpose: the output is meant to be pasted
//! straight into an editor.
//!
//! The output is stable under a second extraction unless a body itself holds
//! a backtick pair (a JS template literal inside a fence, say). Extracting
//! again would then cut the body down to that inner span, so nothing here
//! re-runs extraction; with markdown removal also enabled the pair is
//! unwrapped and the pipeline settles.

use once_cell::sync::Lazy;
use regex::Regex;

static CODE_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```|`[^`]+`").expect("code span pattern is valid"));

/// Separator placed between extracted bodies.
pub const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

pub fn extract_code_blocks(text: &str) -> String {
    let blocks: Vec<&str> = CODE_SPAN
        .find_iter(text)
        .map(|m| strip_delimiters(m.as_str()).trim())
        .collect();

    if blocks.is_empty() {
        text.to_string()
    } else {
        blocks.join(BLOCK_SEPARATOR)
    }
}

/// Removes the fence (with its language tag) or the inline backticks.
fn strip_delimiters(span: &str) -> &str {
    let mut body = span;
    if let Some(rest) = body.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let rest = &rest[tag_len..];
        let rest = rest.strip_prefix('\n').unwrap_or(rest);
        body = rest.strip_suffix("```").unwrap_or(rest);
    }
    let body = body.strip_prefix('`').unwrap_or(body);
    body.strip_suffix('`').unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_code_passes_through() {
        let text = "Just prose.\n\nNothing to extract here.";
        assert_eq!(extract_code_blocks(text), text);
    }

    #[test]
    fn test_fenced_block_with_language_tag() {
        let text = "Here you go:\n```rust\nfn main() {}\n```\nEnjoy!";
        assert_eq!(extract_code_blocks(text), "fn main() {}");
    }

    #[test]
    fn test_untagged_fence() {
        let text = "```\n  ls -la  \n```";
        assert_eq!(extract_code_blocks(text), "ls -la");
    }

    #[test]
    fn test_multiple_blocks_and_inline_spans_are_joined() {
        let text = "Run `cargo build` then:\n```sh\n./target/app\n```";
        assert_eq!(
            extract_code_blocks(text),
            "cargo build\n\n---\n\n./target/app"
        );
    }

    #[test]
    fn test_single_line_fence() {
        assert_eq!(extract_code_blocks("```json{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_output_without_backticks_is_stable() {
        let text = "Try `npm ci`, then:\n```bash\nnpm test\n```";
        let once = extract_code_blocks(text);
        assert_eq!(once, "npm ci\n\n---\n\nnpm test");
        assert_eq!(extract_code_blocks(&once), once);
    }

    #[test]
    fn test_fence_body_keeps_inner_backticks() {
        let text = "```js\nconst s = `hi ${name}`;\n```";
        assert_eq!(extract_code_blocks(text), "const s = `hi ${name}`;");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_code_blocks(""), "");
    }
}
