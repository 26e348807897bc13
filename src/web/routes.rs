use crate::state::AppState;
use crate::web::handlers::{health, hello, models, relay, workstation};
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // Pages and fragments
        .route("/", get(workstation::index))
        .route("/ui/panels/{slot}", get(workstation::panel_fragment))
        .route("/ui/sidebar", get(workstation::sidebar_fragment))

        // Relay and provider passthrough
        .route("/api/chat/gemini", post(relay::chat_gemini))
        .route("/api/models", get(models::list_models))
        .route("/api/hello", get(hello::hello))

        // Workstation API
        .route("/api/tools", get(workstation::list_tools))
        .route(
            "/api/sessions",
            get(workstation::list_sessions).post(workstation::create_session),
        )
        .route("/api/sessions/{id}", axum::routing::delete(workstation::delete_session))
        .route("/api/sessions/{id}/select", post(workstation::select_session))
        .route("/api/sessions/{id}/title", put(workstation::rename_session))
        .route(
            "/api/sessions/{id}/tools/{tool}",
            get(workstation::tool_history).delete(workstation::clear_history),
        )
        .route(
            "/api/sessions/{id}/tools/{tool}/messages",
            post(workstation::send_message),
        )
        .route(
            "/api/layout",
            get(workstation::get_layout).put(workstation::set_layout),
        )
        .route("/api/panels/{slot}", put(workstation::switch_panel_tool))
        .route("/api/events", get(crate::web::sse::stream_events))

        // Health check
        .route("/health", get(health::health_check))

        .with_state(state)
}
