use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use tracing::info;

use crate::error::AppResult;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    info!("Health check requested");

    let pipeline = &state.pipeline;
    let ocr_service = pipeline.reader().ocr_available();
    let ner_ready = pipeline.recognizer().is_ready();
    let admission = state.admission.metrics();

    let status = if ner_ready { "healthy" } else { "degraded" };

    let response = json!({
        "status": status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "pdf_reader": true,
            "docx_reader": true,
            "ocr_service": ocr_service,
            "ner_model": ner_ready
        },
        "config": {
            "max_file_size_mb": state.config.max_file_size_mb,
            "ner_model_dir": state.config.ner_model_dir.display().to_string(),
            "ocr_dpi": state.config.ocr_dpi,
            "ocr_language": state.config.ocr_language
        },
        "admission": {
            "total_requests": admission.total_requests,
            "waiting_requests": admission.waiting_requests,
            "available_permits": admission.available_permits,
            "max_concurrent_requests": admission.capacity
        },
        "uptime_seconds": state.started_at.elapsed().as_secs()
    });

    info!(
        status = status,
        ocr_available = ocr_service,
        ner_ready = ner_ready,
        "Health check completed"
    );

    Ok(Json(response))
}

/// Readiness check endpoint. Ready once the entity model can be loaded.
pub async fn ready_handler(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    if state.pipeline.recognizer().is_ready() {
        info!("Readiness check passed");
        Ok(StatusCode::OK)
    } else {
        info!("Readiness check failed - NER model unavailable");
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
