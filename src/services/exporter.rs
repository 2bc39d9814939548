use base64::{engine::general_purpose, Engine as _};

use crate::error::{AppError, AppResult};
use crate::models::{DownloadLink, Downloads, Entity, MetadataReport};

pub const JSON_FILENAME: &str = "metadata.json";
pub const JSON_MIME: &str = "application/json";
pub const CSV_FILENAME: &str = "entities.csv";
pub const CSV_MIME: &str = "text/csv";

/// `metadata.json`: the whole report, pretty-printed with two-space indent.
pub fn to_json(report: &MetadataReport) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// `entities.csv`: a `text,label` header and one row per entity. The header is
/// written even when there are no entities.
pub fn to_csv(entities: &[Entity]) -> AppResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(["text", "label"])?;
    for entity in entities {
        writer.write_record([entity.text.as_str(), entity.label.as_str()])?;
    }

    let bytes = writer.into_inner().map_err(|e| AppError::ExportError {
        message: format!("CSV flush failed: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| AppError::ExportError {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}

/// Inlines an artifact as `data:<mime>;base64,<payload>`.
pub fn data_uri(mime_type: &str, payload: &str) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(payload.as_bytes())
    )
}

/// Both artifacts, ready to be offered as downloads.
pub fn download_links(report: &MetadataReport) -> AppResult<Downloads> {
    let json = to_json(report)?;
    let csv = to_csv(&report.entities)?;

    Ok(Downloads {
        json: DownloadLink {
            filename: JSON_FILENAME.to_string(),
            mime_type: JSON_MIME.to_string(),
            data_uri: data_uri(JSON_MIME, &json),
        },
        csv: DownloadLink {
            filename: CSV_FILENAME.to_string(),
            mime_type: CSV_MIME.to_string(),
            data_uri: data_uri(CSV_MIME, &csv),
        },
    })
}
