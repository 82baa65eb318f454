mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use emora_api::{AppStateInner, router};
use emora_core::Emora;
use emora_core::gateway::GeminiGateway;
use emora_db::Database;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emora=debug,emora_api=debug,emora_core=debug,emora_db=info,tower_http=debug".into()),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {e}");
            eprintln!("       Set it in your .env file and restart.");
            std::process::exit(1);
        }
    };

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);

    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; assistant replies will fail until it is configured");
    }
    let gateway = GeminiGateway::new(config.gemini_api_key.clone(), config.gateway_timeout)?
        .with_model(config.gemini_model.clone())
        .with_base_url(config.gemini_base_url.clone());

    let emora = Emora::new(db, Arc::new(gateway)).with_session_ttl(config.session_ttl);
    let state = Arc::new(AppStateInner {
        emora,
        jwt_secret: config.jwt_secret.clone(),
    });

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Emora server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
