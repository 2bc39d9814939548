use serde::{Deserialize, Serialize};

use super::request::DocumentFormat;

/// A named entity mention and its category label (`PERSON`, `ORG`, `GPE`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Plain text pulled out of one upload, pages and paragraphs concatenated in
/// source order.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub format: DocumentFormat,
    pub pages: Option<usize>,
    pub ocr_used: bool,
}

impl ExtractedText {
    pub fn new(text: String, format: DocumentFormat) -> Self {
        Self {
            text,
            format,
            pages: None,
            ocr_used: false,
        }
    }

    pub fn with_pages(mut self, pages: usize) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn with_ocr(mut self) -> Self {
        self.ocr_used = true;
        self
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// First `limit` characters, with `...` appended when the text is longer.
    pub fn preview(&self, limit: usize) -> String {
        let mut chars = self.text.char_indices();
        match chars.nth(limit) {
            Some((cut, _)) => format!("{}...", &self.text[..cut]),
            None => self.text.clone(),
        }
    }
}

/// The exported artifact: everything derived from a single [`ExtractedText`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataReport {
    pub keywords: Vec<String>,
    pub entities: Vec<Entity>,
    pub summary: String,
}
