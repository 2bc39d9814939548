use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AppError, AppResult};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";

/// The document formats the reader knows how to turn into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    #[serde(rename = "text")]
    PlainText,
}

impl DocumentFormat {
    /// Maps a declared MIME type to a format. Parameters such as
    /// `; charset=utf-8` are ignored.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            MIME_PDF => Some(DocumentFormat::Pdf),
            MIME_DOCX => Some(DocumentFormat::Docx),
            MIME_TEXT => Some(DocumentFormat::PlainText),
            _ => None,
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        let extension = name.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            "txt" => Some(DocumentFormat::PlainText),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => MIME_PDF,
            DocumentFormat::Docx => MIME_DOCX,
            DocumentFormat::PlainText => MIME_TEXT,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::PlainText => "text",
        };
        f.write_str(name)
    }
}

/// A single upload, alive for one request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub size: usize,
    pub content: Bytes,
    pub mime_type: Option<String>,
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len(),
            content,
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Resolves the format from the declared MIME type. Uploads that declare
    /// nothing useful (absent or `application/octet-stream`) fall back to the
    /// file extension.
    pub fn format(&self) -> AppResult<DocumentFormat> {
        match self.mime_type.as_deref().map(str::trim) {
            Some(mime) if !mime.is_empty() && !is_generic_mime(mime) => {
                DocumentFormat::from_mime(mime).ok_or_else(|| AppError::unsupported(mime))
            }
            declared => DocumentFormat::from_file_name(&self.name).ok_or_else(|| {
                AppError::unsupported(declared.filter(|m| !m.is_empty()).unwrap_or(self.name.as_str()))
            }),
        }
    }
}

fn is_generic_mime(mime: &str) -> bool {
    mime.eq_ignore_ascii_case("application/octet-stream")
}
