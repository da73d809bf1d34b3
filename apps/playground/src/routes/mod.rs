pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::postprocess::handlers as response_handlers;
use crate::prompt::handlers as prompt_handlers;
use crate::session::handlers as session_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/models", get(prompt_handlers::handle_list_models))
        // Template engine
        .route("/api/v1/templates/scan", post(prompt_handlers::handle_scan))
        .route(
            "/api/v1/templates/render",
            post(prompt_handlers::handle_render),
        )
        // Prompt assembly and generation
        .route(
            "/api/v1/prompts/preview",
            post(prompt_handlers::handle_preview),
        )
        .route(
            "/api/v1/prompts/generate",
            post(prompt_handlers::handle_generate),
        )
        // Post-processing
        .route(
            "/api/v1/responses/process",
            post(response_handlers::handle_process),
        )
        // Session persistence
        .route(
            "/api/v1/session/variables",
            get(session_handlers::handle_get_variables)
                .put(session_handlers::handle_put_variables)
                .post(session_handlers::handle_add_variable),
        )
        .route(
            "/api/v1/session/variables/:id",
            patch(session_handlers::handle_update_variable)
                .delete(session_handlers::handle_remove_variable),
        )
        .route(
            "/api/v1/session/settings",
            get(session_handlers::handle_get_settings).put(session_handlers::handle_put_settings),
        )
        .with_state(state)
}
