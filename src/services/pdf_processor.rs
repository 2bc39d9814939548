use std::sync::Arc;
use std::time::Instant;
use lopdf::Document;

use crate::error::AppResult;
use crate::models::{DocumentFormat, ExtractedText};
use crate::services::ocr_service::OcrEngine;

/// Two-tier PDF reader: the embedded text layer first, OCR over rendered
/// pages only when the text layer comes back empty.
pub struct PdfProcessor {
    ocr: Arc<dyn OcrEngine>,
}

impl PdfProcessor {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }

    pub fn extract_text(&self, pdf_data: &[u8]) -> AppResult<ExtractedText> {
        let start = Instant::now();
        tracing::info!("Starting PDF text extraction ({} bytes)", pdf_data.len());

        let pages = self.count_pages(pdf_data);

        // pdf-extract panics on some malformed fonts and encodings
        let text_layer = match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(pdf_data)) {
            Ok(Ok(text)) => {
                tracing::debug!("PDF text layer extraction returned {} characters", text.len());
                text
            }
            Ok(Err(e)) => {
                tracing::warn!("PDF text layer extraction failed: {}, treating text layer as empty", e);
                String::new()
            }
            Err(_) => {
                tracing::warn!("PDF text layer extraction panicked, treating text layer as empty");
                String::new()
            }
        };

        if !text_layer.trim().is_empty() {
            tracing::info!(
                "PDF processing completed in {}ms from text layer, {} characters",
                start.elapsed().as_millis(),
                text_layer.len()
            );
            return Ok(ExtractedText::new(text_layer, DocumentFormat::Pdf).with_pages(pages));
        }

        tracing::warn!("No text layer found in PDF, falling back to OCR");
        let page_texts = self.ocr.recognize_pdf(pdf_data)?;
        let text = page_texts.join("\n");

        tracing::info!(
            "PDF processing completed in {}ms via OCR, {} pages, {} characters",
            start.elapsed().as_millis(),
            page_texts.len(),
            text.len()
        );

        Ok(ExtractedText::new(text, DocumentFormat::Pdf)
            .with_pages(pages.max(page_texts.len()))
            .with_ocr())
    }

    fn count_pages(&self, pdf_content: &[u8]) -> usize {
        match Document::load_mem(pdf_content) {
            Ok(doc) => doc.get_pages().len(),
            Err(e) => {
                tracing::warn!("PDF structure could not be parsed for page count: {}", e);
                0
            }
        }
    }

    pub fn ocr_available(&self) -> bool {
        self.ocr.is_available()
    }
}
