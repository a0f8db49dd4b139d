use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{ChatRequest, ChatSnapshot, Notice, SearchQuery, SettingsUpdate};
use crate::service::chat_service::{ChatService, SubmitOutcome};

// ── Response bodies ──────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum OutcomeView {
    Ignored,
    Replied { conversation_id: i64, title_pending: bool },
    Failed { conversation_id: i64, error: String },
}

impl From<SubmitOutcome> for OutcomeView {
    fn from(outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Ignored => OutcomeView::Ignored,
            SubmitOutcome::Replied { conversation_id, title_task } => OutcomeView::Replied {
                conversation_id,
                title_pending: title_task.is_some(),
            },
            SubmitOutcome::Failed { conversation_id, error } => {
                OutcomeView::Failed { conversation_id, error }
            }
        }
    }
}

#[derive(Serialize)]
struct SubmitResponse {
    outcome: OutcomeView,
    state: ChatSnapshot,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET `/api/state` — conversations, current index and sending flag
pub async fn state_handler(State(svc): State<ChatService>) -> Json<ChatSnapshot> {
    Json(svc.snapshot().await)
}

/// POST `/api/conversations` — start a new conversation and make it current
pub async fn new_conversation_handler(State(svc): State<ChatService>) -> Response {
    match svc.new_conversation().await {
        Ok(_) => Json(svc.snapshot().await).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST `/api/conversations/{index}/select` — switch the current conversation
pub async fn select_conversation_handler(
    Path(index): Path<usize>,
    State(svc): State<ChatService>,
) -> Response {
    match svc.switch_conversation(index).await {
        Ok(()) => Json(svc.snapshot().await).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET `/api/conversations/search?q=` — title search with original indices
pub async fn search_handler(
    Query(query): Query<SearchQuery>,
    State(svc): State<ChatService>,
) -> impl IntoResponse {
    Json(svc.search(&query.q).await)
}

/// POST `/api/chat` — submit a message to the current conversation
pub async fn chat_handler(
    State(svc): State<ChatService>,
    Json(request): Json<ChatRequest>,
) -> Response {
    match svc.submit(&request.message).await {
        Ok(outcome) => Json(SubmitResponse {
            outcome: outcome.into(),
            state: svc.snapshot().await,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET `/api/settings`
pub async fn get_settings_handler(State(svc): State<ChatService>) -> impl IntoResponse {
    Json(svc.settings().await)
}

/// PUT `/api/settings` — update the API key and/or system instruction
pub async fn put_settings_handler(
    State(svc): State<ChatService>,
    Json(update): Json<SettingsUpdate>,
) -> Response {
    match svc.update_settings(update).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response(&e),
    }
}

// ── Helper ───────────────────────────────────────────────────────────────────

fn error_response(err: &AppError) -> Response {
    if err.is_configuration() {
        let notice = Notice {
            title: "API Key Missing".to_string(),
            description: err.to_string(),
        };
        return (StatusCode::BAD_REQUEST, Json(notice)).into_response();
    }

    let status = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, err.to_string()).into_response()
}
