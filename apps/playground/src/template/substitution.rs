//! Template Substitution Engine.
//!
//! Flat grammar: each variable with a non-empty key replaces every literal
//! `${key}` in store order. When two variables share a key the first one in
//! store order consumes every occurrence, so later duplicates never apply.
//!
//! Path grammar: every `{path}` that resolves in the data tree is replaced in
//! a single left-to-right pass; unresolvable tokens stay as written.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::template::path_resolver;
use crate::template::scanner::{tokens, Grammar};
use crate::template::variables::VariableStore;

#[derive(Debug, Error)]
pub enum TemplateError {
    /// The data tree did not parse. Nothing was substituted.
    #[error("data object is not valid JSON: {0}")]
    InvalidData(#[from] serde_json::Error),
}

/// Replaces `${key}` tokens using the variable store.
///
/// Keys are matched literally. Variables with an empty key are skipped.
pub fn substitute_with_variables(text: &str, variables: &VariableStore) -> String {
    let mut result = text.to_string();
    for variable in variables.iter().filter(|v| !v.key.is_empty()) {
        let token = format!("${{{}}}", variable.key);
        if result.contains(&token) {
            result = result.replace(&token, &variable.value);
        }
    }
    result
}

/// Replaces `{path}` tokens that resolve against `data`.
pub fn substitute_with_tree(text: &str, data: &Value) -> String {
    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut replaced = 0usize;

    for token in tokens(text, Grammar::Path) {
        let Some(value) = path_resolver::lookup(data, token.name) else {
            continue;
        };
        result.push_str(&text[cursor..token.span.start]);
        result.push_str(&path_resolver::render(value));
        cursor = token.span.end;
        replaced += 1;
    }
    result.push_str(&text[cursor..]);

    debug!("Path substitution replaced {replaced} token(s)");
    result
}

/// Parses `data_json` and substitutes path tokens.
///
/// A malformed data tree aborts the whole step; callers keep their previous
/// output instead of showing a half-substituted template.
pub fn substitute_with_data(text: &str, data_json: &str) -> Result<String, TemplateError> {
    let data: Value = serde_json::from_str(data_json)?;
    Ok(substitute_with_tree(text, &data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::variables::Variable;
    use serde_json::json;

    fn store(vars: &[(u64, &str, &str)]) -> VariableStore {
        VariableStore::from_variables(
            vars.iter()
                .map(|(id, key, value)| Variable {
                    id: *id,
                    key: key.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_flat_basic_replacement() {
        let vars = store(&[(0, "name", "Min")]);
        assert_eq!(substitute_with_variables("Hello ${name}", &vars), "Hello Min");
    }

    #[test]
    fn test_flat_replaces_all_occurrences() {
        let vars = store(&[(0, "x", "1")]);
        assert_eq!(substitute_with_variables("${x}+${x}=${y}", &vars), "1+1=${y}");
    }

    #[test]
    fn test_flat_key_collision_first_wins() {
        let vars = store(&[(0, "x", "A"), (1, "x", "B")]);
        assert_eq!(substitute_with_variables("${x}", &vars), "A");
    }

    #[test]
    fn test_flat_empty_key_is_skipped() {
        let vars = store(&[(0, "", "oops")]);
        assert_eq!(substitute_with_variables("${} stays", &vars), "${} stays");
    }

    #[test]
    fn test_flat_no_tokens_is_noop() {
        let vars = VariableStore::with_defaults();
        let text = "No placeholders here, just {braces} and $dollars.";
        assert_eq!(substitute_with_variables(text, &vars), text);
    }

    #[test]
    fn test_flat_value_is_inserted_literally() {
        let vars = store(&[(0, "price", "$1 and $& ${0}")]);
        assert_eq!(
            substitute_with_variables("cost: ${price}", &vars),
            "cost: $1 and $& ${0}"
        );
    }

    #[test]
    fn test_flat_store_order_applies_to_produced_tokens() {
        // The first variable's value introduces a token the second one fills.
        let vars = store(&[(0, "greeting", "Hi ${name}"), (1, "name", "Jun")]);
        assert_eq!(substitute_with_variables("${greeting}", &vars), "Hi Jun");
    }

    #[test]
    fn test_path_replaces_resolved_and_keeps_unresolved() {
        let data = json!({"profile": {"name": "Min", "interests": ["trains", "blocks"]}});
        let text = "{profile.name} likes {profile.interests}. {profile.missing} {other}";
        assert_eq!(
            substitute_with_tree(text, &data),
            "Min likes trains, blocks. {profile.missing} {other}"
        );
    }

    #[test]
    fn test_path_does_not_touch_flat_tokens() {
        let data = json!({"name": "Min"});
        assert_eq!(substitute_with_tree("${name} {name}", &data), "${name} Min");
    }

    #[test]
    fn test_path_values_are_not_rescanned() {
        let data = json!({"a": "{b}", "b": "nope"});
        assert_eq!(substitute_with_tree("{a}", &data), "{b}");
    }

    #[test]
    fn test_path_no_tokens_is_noop() {
        let data = json!({"a": 1});
        let text = "plain ${a} text";
        assert_eq!(substitute_with_tree(text, &data), text);
    }

    #[test]
    fn test_invalid_data_aborts() {
        let err = substitute_with_data("{a}", "{ not json").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidData(_)));
    }

    #[test]
    fn test_valid_data_substitutes() {
        let out = substitute_with_data("Age: {p.age}", r#"{"p": {"age": 6}}"#).unwrap();
        assert_eq!(out, "Age: 6");
    }
}
