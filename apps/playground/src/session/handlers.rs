//! Axum route handlers for the persisted session (variables and settings).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::session::{self, SessionSettings};
use crate::state::AppState;
use crate::template::{Variable, VariableStore};

#[derive(Debug, Serialize, Deserialize)]
pub struct VariablesBody {
    pub variables: Vec<Variable>,
}

impl From<&VariableStore> for VariablesBody {
    fn from(store: &VariableStore) -> Self {
        Self {
            variables: store.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewVariable {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VariablePatch {
    pub key: Option<String>,
    pub value: Option<String>,
}

/// GET /api/v1/session/variables
pub async fn handle_get_variables(
    State(state): State<AppState>,
) -> Result<Json<VariablesBody>, AppError> {
    let variables = session::load_variables(state.store.as_ref())?;
    Ok(Json(VariablesBody::from(&variables)))
}

/// PUT /api/v1/session/variables
///
/// Replaces the whole store. Ids in the body are kept as given.
pub async fn handle_put_variables(
    State(state): State<AppState>,
    Json(body): Json<VariablesBody>,
) -> Result<Json<VariablesBody>, AppError> {
    let _guard = state.session_lock.lock().await;
    let mut seen = std::collections::HashSet::new();
    if let Some(dup) = body.variables.iter().find(|v| !seen.insert(v.id)) {
        return Err(AppError::Validation(format!(
            "duplicate variable id {}",
            dup.id
        )));
    }
    let variables = VariableStore::from_variables(body.variables)?;
    session::save_variables(state.store.as_ref(), &variables)?;
    Ok(Json(VariablesBody::from(&variables)))
}

/// POST /api/v1/session/variables
pub async fn handle_add_variable(
    State(state): State<AppState>,
    Json(body): Json<NewVariable>,
) -> Result<(StatusCode, Json<Variable>), AppError> {
    let _guard = state.session_lock.lock().await;
    let mut variables = session::load_variables(state.store.as_ref())?;
    let id = variables.add(body.key, body.value)?;
    session::save_variables(state.store.as_ref(), &variables)?;
    let created = variables
        .get(id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("variable {id} vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/v1/session/variables/:id
pub async fn handle_update_variable(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(patch): Json<VariablePatch>,
) -> Result<Json<Variable>, AppError> {
    let _guard = state.session_lock.lock().await;
    let mut variables = session::load_variables(state.store.as_ref())?;
    if variables.get(id).is_none() {
        return Err(AppError::NotFound(format!("Variable {id} not found")));
    }
    if let Some(key) = patch.key {
        variables.set_key(id, key);
    }
    if let Some(value) = patch.value {
        variables.set_value(id, value);
    }
    session::save_variables(state.store.as_ref(), &variables)?;
    let updated = variables
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Variable {id} not found")))?;
    Ok(Json(updated))
}

/// DELETE /api/v1/session/variables/:id
pub async fn handle_remove_variable(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    let _guard = state.session_lock.lock().await;
    let mut variables = session::load_variables(state.store.as_ref())?;
    if !variables.remove(id) {
        return Err(AppError::NotFound(format!("Variable {id} not found")));
    }
    session::save_variables(state.store.as_ref(), &variables)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/session/settings
pub async fn handle_get_settings(
    State(state): State<AppState>,
) -> Result<Json<SessionSettings>, AppError> {
    Ok(Json(session::load_settings(state.store.as_ref())?))
}

/// PUT /api/v1/session/settings
pub async fn handle_put_settings(
    State(state): State<AppState>,
    Json(settings): Json<SessionSettings>,
) -> Result<Json<SessionSettings>, AppError> {
    let _guard = state.session_lock.lock().await;
    let saved = session::save_settings(state.store.as_ref(), settings)?;
    Ok(Json(saved))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::routes::build_router;
    use crate::state::test_support::{test_state, MockLlm};

    async fn send(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let response = build_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_fresh_session_has_sample_variables() {
        let state = test_state(Arc::new(MockLlm::replying("")));
        let (status, body) = send(&state, "GET", "/api/v1/session/variables", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["variables"].as_array().unwrap().len(), 3);
        assert_eq!(body["variables"][0]["key"], "childName");
    }

    #[tokio::test]
    async fn test_variable_lifecycle() {
        let state = test_state(Arc::new(MockLlm::replying("")));

        let (status, created) = send(
            &state,
            "POST",
            "/api/v1/session/variables",
            Some(json!({"key": "grade", "value": "2"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 3);

        let (status, updated) = send(
            &state,
            "PATCH",
            "/api/v1/session/variables/3",
            Some(json!({"value": "3"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["key"], "grade");
        assert_eq!(updated["value"], "3");

        let (status, _) = send(&state, "DELETE", "/api/v1/session/variables/0", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, created) = send(
            &state,
            "POST",
            "/api/v1/session/variables",
            Some(json!({"key": "next"})),
        )
        .await;
        assert_eq!(created["id"], 4);

        let (_, listed) = send(&state, "GET", "/api/v1/session/variables", None).await;
        let ids: Vec<u64> = listed["variables"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_unknown_variable_is_not_found() {
        let state = test_state(Arc::new(MockLlm::replying("")));
        let (status, _) = send(&state, "DELETE", "/api/v1/session/variables/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(
            &state,
            "PATCH",
            "/api/v1/session/variables/99",
            Some(json!({"key": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_put_variables_rejects_max_id() {
        let state = test_state(Arc::new(MockLlm::replying("")));
        let (status, body) = send(
            &state,
            "PUT",
            "/api/v1/session/variables",
            Some(json!({"variables": [{"id": u64::MAX, "key": "a", "value": "1"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        // the saved store is left untouched
        let (_, listed) = send(&state, "GET", "/api/v1/session/variables", None).await;
        assert_eq!(listed["variables"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_put_variables_rejects_duplicate_ids() {
        let state = test_state(Arc::new(MockLlm::replying("")));
        let (status, _) = send(
            &state,
            "PUT",
            "/api/v1/session/variables",
            Some(json!({"variables": [
                {"id": 1, "key": "a", "value": "1"},
                {"id": 1, "key": "b", "value": "2"}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_put_variables_replaces_store() {
        let state = test_state(Arc::new(MockLlm::replying("")));
        let (status, _) = send(
            &state,
            "PUT",
            "/api/v1/session/variables",
            Some(json!({"variables": [{"id": 5, "key": "x", "value": "A"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, created) = send(
            &state,
            "POST",
            "/api/v1/session/variables",
            Some(json!({"key": "y", "value": "B"})),
        )
        .await;
        assert_eq!(created["id"], 6);
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let state = test_state(Arc::new(MockLlm::replying("")));
        let (status, saved) = send(
            &state,
            "PUT",
            "/api/v1/session/settings",
            Some(json!({
                "generation": {"provider": "openai", "model": "gpt-4o", "temperature": 0.2},
                "pipeline": {"remove_markdown": true}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(saved["saved_at"].is_string());

        let (_, loaded) = send(&state, "GET", "/api/v1/session/settings", None).await;
        assert_eq!(loaded["generation"]["provider"], "openai");
        assert_eq!(loaded["pipeline"]["remove_markdown"], true);
        assert_eq!(loaded, saved);
    }
}
