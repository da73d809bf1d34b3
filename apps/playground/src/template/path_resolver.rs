//! Resolves dotted attribute paths against a JSON data tree.

use serde_json::Value;

/// Separator used when a resolved leaf is an array.
const LIST_SEPARATOR: &str = ", ";

/// Descends one segment at a time through nested objects.
///
/// Returns `None` when a segment is missing or an intermediate value is not
/// an object. Arrays are leaves only: `a.0` does not index into `a`.
pub fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(data, |node, segment| node.as_object()?.get(segment))
}

/// Renders a resolved value as prompt text.
///
/// Strings are unquoted, arrays are joined with `", "`, `null` is empty and
/// objects fall back to compact JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(render)
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        _ => render_scalar(value),
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Resolves `path` to display text. Never fails: an absent path and an empty
/// array both render as `""`.
pub fn resolve(data: &Value, path: &str) -> String {
    lookup(data, path).map(render).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile() -> Value {
        json!({
            "profile": {
                "name": "김민준",
                "age": 6,
                "interests": ["공룡", "기차", "블록 쌓기"],
                "verified": false,
                "nickname": null,
                "sensory": { "visual": "bright colors" }
            },
            "tags": []
        })
    }

    #[test]
    fn test_array_leaf_is_joined() {
        let data = json!({"a": {"b": ["p", "q"]}});
        assert_eq!(resolve(&data, "a.b"), "p, q");
    }

    #[test]
    fn test_absent_path_is_empty() {
        let data = json!({"a": {"b": ["p", "q"]}});
        assert_eq!(resolve(&data, "a.c"), "");
        assert_eq!(resolve(&data, "x.y.z"), "");
    }

    #[test]
    fn test_empty_array_and_absent_are_indistinguishable() {
        let data = profile();
        assert_eq!(resolve(&data, "tags"), resolve(&data, "missing"));
        assert!(lookup(&data, "tags").is_some());
        assert!(lookup(&data, "missing").is_none());
    }

    #[test]
    fn test_scalars_render_naturally() {
        let data = profile();
        assert_eq!(resolve(&data, "profile.name"), "김민준");
        assert_eq!(resolve(&data, "profile.age"), "6");
        assert_eq!(resolve(&data, "profile.verified"), "false");
        assert_eq!(resolve(&data, "profile.nickname"), "");
    }

    #[test]
    fn test_non_object_intermediate_yields_empty() {
        let data = profile();
        assert_eq!(resolve(&data, "profile.name.first"), "");
        assert_eq!(resolve(&data, "profile.interests.0"), "");
    }

    #[test]
    fn test_object_leaf_renders_as_json() {
        let data = profile();
        assert_eq!(
            resolve(&data, "profile.sensory"),
            r#"{"visual":"bright colors"}"#
        );
    }

    #[test]
    fn test_scalar_root_has_no_paths() {
        assert_eq!(resolve(&json!(42), "a"), "");
    }
}
