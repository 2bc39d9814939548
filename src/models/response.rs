use serde::{Deserialize, Serialize};

use super::metadata::{Entity, MetadataReport};
use super::request::DocumentFormat;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub success: bool,
    pub data: MetadataData,
    pub processing_time_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetadataData {
    pub file_name: String,
    pub format: DocumentFormat,
    pub pages: Option<usize>,
    pub ocr_used: bool,
    pub text_length: usize,
    pub preview: String,
    pub keywords: Vec<String>,
    pub entities: Vec<Entity>,
    pub summary: String,
    pub downloads: Downloads,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Downloads {
    pub json: DownloadLink,
    pub csv: DownloadLink,
}

/// A downloadable artifact inlined as a base64 data URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadLink {
    pub filename: String,
    pub mime_type: String,
    pub data_uri: String,
}

impl MetadataResponse {
    pub fn new(data: MetadataData, processing_time_ms: u64) -> Self {
        Self {
            success: true,
            data,
            processing_time_ms,
        }
    }
}

impl MetadataData {
    pub fn from_report(
        file_name: String,
        format: DocumentFormat,
        report: MetadataReport,
        downloads: Downloads,
    ) -> Self {
        Self {
            file_name,
            format,
            pages: None,
            ocr_used: false,
            text_length: 0,
            preview: String::new(),
            keywords: report.keywords,
            entities: report.entities,
            summary: report.summary,
            downloads,
        }
    }

    pub fn with_text_facts(mut self, text_length: usize, preview: String) -> Self {
        self.text_length = text_length;
        self.preview = preview;
        self
    }

    pub fn with_pages(mut self, pages: Option<usize>) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_ocr(mut self, ocr_used: bool) -> Self {
        self.ocr_used = ocr_used;
        self
    }
}
