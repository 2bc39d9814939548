use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{MetadataData, MetadataResponse, UploadedDocument};
use crate::services::exporter::{self, CSV_FILENAME, CSV_MIME, JSON_FILENAME, JSON_MIME};
use crate::services::PipelineOutput;
use crate::state::AppState;

const PREVIEW_CHARS: usize = 1000;

/// Full interactive result: preview, keywords, entities, summary and both
/// downloads inlined as data URIs.
pub async fn metadata_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<MetadataResponse>> {
    let start = Instant::now();
    let request_id = short_request_id();

    info!(request_id = %request_id, "Starting metadata extraction request");

    let (file_name, output) = process_upload(&state, &mut multipart, &request_id).await?;

    let downloads = exporter::download_links(&output.report)?;
    let extracted = &output.extracted;
    let data = MetadataData::from_report(file_name, extracted.format, output.report, downloads)
        .with_text_facts(extracted.text.chars().count(), extracted.preview(PREVIEW_CHARS))
        .with_pages(extracted.pages)
        .with_ocr(extracted.ocr_used);

    let total_time = start.elapsed().as_millis() as u64;
    info!(
        request_id = %request_id,
        pipeline_time_ms = output.processing_time_ms,
        total_time_ms = total_time,
        "Request completed successfully"
    );

    Ok(Json(MetadataResponse::new(data, total_time)))
}

/// `metadata.json` as an attachment.
pub async fn metadata_json_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let request_id = short_request_id();
    info!(request_id = %request_id, "Starting JSON export request");

    let (_, output) = process_upload(&state, &mut multipart, &request_id).await?;
    let body = exporter::to_json(&output.report)?;

    Ok(attachment(JSON_MIME, JSON_FILENAME, body))
}

/// `entities.csv` as an attachment.
pub async fn metadata_csv_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let request_id = short_request_id();
    info!(request_id = %request_id, "Starting CSV export request");

    let (_, output) = process_upload(&state, &mut multipart, &request_id).await?;
    let body = exporter::to_csv(&output.report.entities)?;

    Ok(attachment(CSV_MIME, CSV_FILENAME, body))
}

fn attachment(mime_type: &str, filename: &str, body: String) -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format!("{}; charset=utf-8", mime_type)),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
}

fn short_request_id() -> String {
    uuid::Uuid::new_v4().to_string()[..8].to_string()
}

/// Reads the `file` field, checks its size, waits for a pipeline slot and runs
/// the pipeline off the async runtime.
async fn process_upload(
    state: &AppState,
    multipart: &mut Multipart,
    request_id: &str,
) -> AppResult<(String, PipelineOutput)> {
    let limit_mb = state.config.max_file_size_mb;

    let document = match extract_file_from_multipart(multipart, limit_mb).await {
        Ok(document) => {
            info!(
                request_id = %request_id,
                file_name = %document.name,
                file_size = document.size,
                mime_type = ?document.mime_type,
                "File extracted from multipart form"
            );
            document
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Failed to extract file from multipart");
            return Err(e);
        }
    };

    let max_size_bytes = state.config.max_file_size_bytes();
    if document.size > max_size_bytes {
        warn!(
            request_id = %request_id,
            file_size = document.size,
            max_size = max_size_bytes,
            "File size exceeds limit"
        );
        return Err(AppError::FileTooLarge {
            size: document.size / (1024 * 1024),
            limit: limit_mb,
        });
    }

    let permit = state.admission.acquire().await?;
    debug!(request_id = %request_id, "Pipeline slot granted");

    let pipeline = state.pipeline.clone();
    let file_name = document.name.clone();
    // the slot stays taken until the pipeline returns, even if the client leaves
    let result = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        pipeline.process(&document)
    })
    .await?;

    match result {
        Ok(output) => {
            info!(
                request_id = %request_id,
                text_length = output.extracted.text.len(),
                pages = ?output.extracted.pages,
                ocr_used = output.extracted.ocr_used,
                processing_time_ms = output.processing_time_ms,
                "Document processing completed successfully"
            );
            Ok((file_name, output))
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Document processing failed");
            Err(e)
        }
    }
}

async fn extract_file_from_multipart(
    multipart: &mut Multipart,
    limit_mb: usize,
) -> AppResult<UploadedDocument> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit_mb, "Failed to read multipart field"))?
    {
        if field.name().unwrap_or("") != "file" {
            continue;
        }

        let Some(file_name) = field.file_name().map(str::to_string) else {
            return Err(AppError::validation("Field `file` must be a file upload"));
        };
        let content_type = field.content_type().map(|ct| ct.to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, limit_mb, "Failed to read file data"))?;

        let mut document = UploadedDocument::new(file_name, data);
        if let Some(mime_type) = content_type {
            document = document.with_mime_type(mime_type);
        }

        debug!(
            "Extracted file: {} ({} bytes, type: {:?})",
            document.name, document.size, document.mime_type
        );

        return Ok(document);
    }

    Err(AppError::MissingFile)
}

/// The body limit surfaces as a multipart read error; keep it a 413.
fn multipart_error(e: MultipartError, limit_mb: usize, context: &str) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::FileTooLarge {
            size: limit_mb,
            limit: limit_mb,
        };
    }
    AppError::InvalidFile {
        message: format!("{}: {}", context, e),
    }
}
