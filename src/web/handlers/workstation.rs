//! Workstation page, fragments and session/panel API

use crate::services::template::{PanelView, WorkstationView};
use crate::state::AppState;
use crate::types::{
    tools, AppError, LayoutMode, Message, PanelLayout, SendReceipt, SendRequest, SessionSummary,
    Tool, ToolId,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Json},
};
use serde::{Deserialize, Serialize};

fn parse_tool(raw: &str) -> Result<ToolId, AppError> {
    raw.parse().map_err(AppError::BadInput)
}

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let sessions = state.sessions.read().await;
    let view = WorkstationView::capture(&sessions)?;
    Ok(Html(state.templates.render_page(&view)?))
}

pub async fn panel_fragment(
    State(state): State<AppState>,
    Path(slot): Path<usize>,
) -> Result<Html<String>, AppError> {
    let sessions = state.sessions.read().await;
    let panel = PanelView::capture(&sessions, slot)?;
    Ok(Html(state.templates.render_panel(&panel)?))
}

pub async fn sidebar_fragment(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let sessions = state.sessions.read().await;
    let view = WorkstationView::capture(&sessions)?;
    Ok(Html(state.templates.render_sidebar(&view)?))
}

pub async fn list_tools() -> Json<&'static [Tool]> {
    Json(tools())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionList {
    pub current_id: String,
    pub sessions: Vec<SessionSummary>,
}

pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionList> {
    let sessions = state.sessions.read().await;
    Json(SessionList {
        current_id: sessions.current_id().to_string(),
        sessions: sessions.list(),
    })
}

pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSummary>) {
    let session = state.sessions.write().await.create();
    (StatusCode::CREATED, Json(session.summary()))
}

pub async fn select_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSummary>, AppError> {
    let session = state.sessions.write().await.select(&id)?;
    Ok(Json(session.summary()))
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub title: String,
}

pub async fn rename_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RenameRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    let session = state.sessions.write().await.rename(&id, &request.title)?;
    Ok(Json(session.summary()))
}

#[derive(Debug, Serialize)]
pub struct DeleteOutcome {
    pub deleted: bool,
    pub remaining: usize,
}

/// The last remaining session is kept; `deleted` reports which happened
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, AppError> {
    let mut sessions = state.sessions.write().await;
    let deleted = sessions.delete(&id)?;
    Ok(Json(DeleteOutcome {
        deleted,
        remaining: sessions.count(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ToolHistory {
    pub tool: &'static Tool,
    pub generating: bool,
    pub messages: Vec<Message>,
}

pub async fn tool_history(
    State(state): State<AppState>,
    Path((id, tool)): Path<(String, String)>,
) -> Result<Json<ToolHistory>, AppError> {
    let tool = parse_tool(&tool)?;
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id)?;
    Ok(Json(ToolHistory {
        tool: tool.descriptor(),
        generating: sessions.is_generating(&id, tool),
        messages: session.history(tool).to_vec(),
    }))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path((id, tool)): Path<(String, String)>,
    Json(request): Json<SendRequest>,
) -> Result<(StatusCode, Json<SendReceipt>), AppError> {
    let tool = parse_tool(&tool)?;
    let receipt = state.conversation.send(&id, tool, request).await?;
    Ok((StatusCode::ACCEPTED, Json(receipt)))
}

pub async fn clear_history(
    State(state): State<AppState>,
    Path((id, tool)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let tool = parse_tool(&tool)?;
    state.sessions.write().await.clear_history(&id, tool)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_layout(State(state): State<AppState>) -> Json<PanelLayout> {
    Json(state.sessions.read().await.layout().clone())
}

#[derive(Debug, Deserialize)]
pub struct LayoutRequest {
    pub mode: LayoutMode,
}

pub async fn set_layout(
    State(state): State<AppState>,
    Json(request): Json<LayoutRequest>,
) -> Json<PanelLayout> {
    let mut sessions = state.sessions.write().await;
    Json(sessions.set_layout(request.mode).clone())
}

#[derive(Debug, Deserialize)]
pub struct PanelToolRequest {
    pub tool: ToolId,
}

pub async fn switch_panel_tool(
    State(state): State<AppState>,
    Path(slot): Path<usize>,
    Json(request): Json<PanelToolRequest>,
) -> Result<Json<PanelLayout>, AppError> {
    let mut sessions = state.sessions.write().await;
    Ok(Json(sessions.switch_panel_tool(slot, request.tool)?.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::provider::mock::MockProvider;
    use axum::response::IntoResponse;
    use std::sync::Arc;
    use std::time::Duration;

    fn state(chunks: &[&str]) -> AppState {
        let config = Config {
            api_key: Some("key".into()),
            ..Config::default()
        };
        AppState::with_provider(config, Arc::new(MockProvider::chunks(chunks))).unwrap()
    }

    async fn current_id(state: &AppState) -> String {
        state.sessions.read().await.current_id().to_string()
    }

    #[tokio::test]
    async fn test_index_renders_page() {
        let state = state(&[]);
        let Html(html) = index(State(state)).await.unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("New topic"));
    }

    #[tokio::test]
    async fn test_panel_fragment_bounds() {
        let state = state(&[]);
        assert!(panel_fragment(State(state.clone()), Path(0)).await.is_ok());
        let response = panel_fragment(State(state), Path(7)).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let state = state(&[]);
        let first = current_id(&state).await;

        let (status, Json(created)) = create_session(State(state.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.title, "New chat");

        let Json(list) = list_sessions(State(state.clone())).await;
        assert_eq!(list.sessions.len(), 2);
        assert_eq!(list.current_id, created.id);

        let Json(renamed) = rename_session(
            State(state.clone()),
            Path(first.clone()),
            Json(RenameRequest { title: "Lifetimes".into() }),
        )
        .await
        .unwrap();
        assert_eq!(renamed.title, "Lifetimes");

        let Json(outcome) = delete_session(State(state.clone()), Path(created.id))
            .await
            .unwrap();
        assert!(outcome.deleted);
        let Json(outcome) = delete_session(State(state.clone()), Path(first.clone()))
            .await
            .unwrap();
        assert!(!outcome.deleted);
        assert_eq!(outcome.remaining, 1);
    }

    #[tokio::test]
    async fn test_unknown_session_and_tool() {
        let state = state(&[]);
        let response = select_session(State(state.clone()), Path("missing".into()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let id = current_id(&state).await;
        let response = tool_history(State(state), Path((id, "spreadsheet".into())))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_send_then_read_history() {
        let state = state(&["| a | b |\n|---|--:|\n| x | 1 |\n/// More? | Chart?"]);
        let id = current_id(&state).await;

        let (status, Json(receipt)) = send_message(
            State(state.clone()),
            Path((id.clone(), "data".into())),
            Json(SendRequest {
                text: "tabulate".into(),
                files: vec![],
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);

        let mut history = None;
        for _ in 0..200 {
            let Json(h) = tool_history(State(state.clone()), Path((id.clone(), "data".into())))
                .await
                .unwrap();
            if !h.generating {
                history = Some(h);
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let history = history.expect("generation finished");
        assert_eq!(history.messages.len(), 2);
        assert_eq!(history.messages[1].id, receipt.message_id);
        assert_eq!(history.messages[1].suggestions, vec!["More?", "Chart?"]);

        let status = clear_history(State(state.clone()), Path((id.clone(), "data".into())))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        let Json(h) = tool_history(State(state), Path((id, "data".into())))
            .await
            .unwrap();
        assert!(h.messages.is_empty());
    }

    #[tokio::test]
    async fn test_layout_endpoints() {
        let state = state(&[]);
        let Json(layout) = set_layout(
            State(state.clone()),
            Json(LayoutRequest { mode: LayoutMode::Split }),
        )
        .await;
        assert_eq!(layout.mode, LayoutMode::Split);

        let Json(layout) = switch_panel_tool(
            State(state.clone()),
            Path(1),
            Json(PanelToolRequest { tool: ToolId::Notebook }),
        )
        .await
        .unwrap();
        assert_eq!(layout.slots[1], ToolId::Notebook);

        let Json(layout) = get_layout(State(state)).await;
        assert_eq!(layout.active_slots(), &[ToolId::Chat, ToolId::Notebook]);
    }

    #[tokio::test]
    async fn test_tools_listing() {
        let Json(listed) = list_tools().await;
        assert_eq!(listed.len(), 6);
        assert_eq!(listed[0].id, ToolId::Chat);
    }
}
