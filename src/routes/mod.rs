pub mod api_routes;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::service::chat_service::ChatService;

use self::api_routes::{
    chat_handler, get_settings_handler, new_conversation_handler, put_settings_handler,
    search_handler, select_conversation_handler, state_handler,
};

/// JSON surface the browser front end drives.
pub fn router(svc: ChatService) -> Router {
    Router::new()
        .route("/api/state", get(state_handler))
        .route("/api/conversations", post(new_conversation_handler))
        .route("/api/conversations/search", get(search_handler))
        .route("/api/conversations/{index}/select", post(select_conversation_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/settings", get(get_settings_handler).put(put_settings_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(svc)
}
