use std::sync::Arc;

use tracing::info;

use gemini_chat::agent::GeminiClient;
use gemini_chat::config::AppConfig;
use gemini_chat::db::SqliteStore;
use gemini_chat::routes::router;
use gemini_chat::service::chat_service::ChatService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_chat=debug,tower_http=debug".into()),
        )
        .init();

    let config = AppConfig::from_env();

    // ── Storage ───────────────────────────────────────────────────────────────
    let store = SqliteStore::connect(&config.database_url).await?;

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let client = GeminiClient::new(&config.gemini_base_url, &config.gemini_model);
    let chat_service = ChatService::load(Arc::new(store), Arc::new(client)).await?;

    if let Some(key) = &config.initial_api_key {
        if !chat_service.settings().await.has_api_key {
            chat_service.set_api_key(key).await?;
            info!("Stored API key from GEMINI_API_KEY");
        }
    }

    let app = router(chat_service);

    // ── Listen ────────────────────────────────────────────────────────────────
    let addr = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/ (model {})", config.gemini_model);

    axum::serve(listener, app).await?;
    Ok(())
}
