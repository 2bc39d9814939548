use std::env;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use metagen::{config::LogFormat, create_router, AppError, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let log_format = LogFormat::from_env();
    let fmt_layer = match log_format {
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
        LogFormat::Pretty => fmt::layer().with_target(false).boxed(),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metagen=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(fmt_layer)
        .init();

    let config = Config::from_env().map_err(|e| AppError::config(format!("{:#}", e)))?;

    tracing::info!(log_format = ?log_format, "Starting Metagen document metadata service");
    tracing::info!("Max file size: {}MB", config.max_file_size_mb);
    tracing::info!("Max concurrent requests: {}", config.max_concurrent_requests);
    tracing::info!("NER model directory: {}", config.ner_model_dir.display());

    // Railway-style platforms inject PORT
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.server_port);
    let addr = format!("{}:{}", config.server_host, port);

    let state = AppState::from_config(config);
    if !state.pipeline.recognizer().is_ready() {
        tracing::warn!("NER model files not found, entity extraction will fail until provided");
    }

    let app = create_router(state);

    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
