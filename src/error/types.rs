use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unsupported file type: {mime_type}")]
    UnsupportedFormat { mime_type: String },

    #[error("Could not decode document text: {message}")]
    DecodeError { message: String },

    #[error("File too large: {size}MB exceeds limit of {limit}MB")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Invalid file: {message}")]
    InvalidFile { message: String },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Document processing failed: {message}")]
    ProcessingError { message: String },

    #[error("OCR processing failed: {message}")]
    OcrError { message: String },

    #[error("Entity model failed: {message}")]
    ModelError { message: String },

    #[error("Metadata export failed: {message}")]
    ExportError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Service unavailable: {service}")]
    ServiceUnavailable { service: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            AppError::DecodeError { .. } => "DECODE_ERROR",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::InvalidFile { .. } => "INVALID_FILE",
            AppError::MissingFile => "MISSING_FILE",
            AppError::ProcessingError { .. } => "PROCESSING_ERROR",
            AppError::OcrError { .. } => "OCR_ERROR",
            AppError::ModelError { .. } => "MODEL_ERROR",
            AppError::ExportError { .. } => "EXPORT_ERROR",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
            AppError::ConfigError { .. } => "CONFIG_ERROR",
            AppError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::DecodeError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InvalidFile { .. } => StatusCode::BAD_REQUEST,
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::ProcessingError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::OcrError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ModelError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExportError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::ConfigError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();
        let request_id = Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().to_rfc3339();

        tracing::error!(
            error_code = error_code,
            status_code = %status,
            request_id = %request_id,
            error_message = %message,
            "API error occurred"
        );

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
                "request_id": request_id,
                "timestamp": timestamp
            },
            "data": null
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal {
            message: format!("{:#}", err),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<std::string::FromUtf8Error> for AppError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        AppError::DecodeError {
            message: err.to_string(),
        }
    }
}

impl From<std::str::Utf8Error> for AppError {
    fn from(err: std::str::Utf8Error) -> Self {
        AppError::DecodeError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ExportError {
            message: format!("JSON serialization error: {}", err),
        }
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::ExportError {
            message: format!("CSV serialization error: {}", err),
        }
    }
}

impl From<candle_core::Error> for AppError {
    fn from(err: candle_core::Error) -> Self {
        AppError::ModelError {
            message: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::ProcessingError {
            message: format!("Pipeline task failed: {}", err),
        }
    }
}

// Helper methods for creating specific errors
impl AppError {
    pub fn unsupported(mime_type: impl Into<String>) -> Self {
        AppError::UnsupportedFormat {
            mime_type: mime_type.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::ConfigError {
            message: message.into(),
        }
    }

    pub fn service_unavailable(service: impl Into<String>) -> Self {
        AppError::ServiceUnavailable {
            service: service.into(),
        }
    }

    pub fn ocr(message: impl Into<String>) -> Self {
        AppError::OcrError {
            message: message.into(),
        }
    }

    pub fn model(message: impl Into<String>) -> Self {
        AppError::ModelError {
            message: message.into(),
        }
    }
}
