//! Relay server binary: Gemini-backed chat endpoints over HTTP.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_relay::{router, AppState, GeminiProvider, GenerationService, RelayConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_relay=info,relay_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RelayConfig::from_env()?;
    let provider = Arc::new(GeminiProvider::new(config.api_key.clone())?);
    let service = Arc::new(GenerationService::new(provider, config.retry.clone()));
    let app = router(AppState {
        service,
        default_model: config.default_model.clone(),
    });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("relay listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
