use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::{DocumentFormat, ExtractedText, UploadedDocument};
use crate::services::docx_reader::read_docx;
use crate::services::ocr_service::OcrEngine;
use crate::services::pdf_processor::PdfProcessor;

/// Dispatches an upload to the reader for its declared format.
pub struct DocumentReader {
    pdf: PdfProcessor,
}

impl DocumentReader {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            pdf: PdfProcessor::new(ocr),
        }
    }

    pub fn read(&self, document: &UploadedDocument) -> AppResult<ExtractedText> {
        let format = document.format()?;
        info!(
            file_name = %document.name,
            file_size = document.size,
            format = %format,
            "Reading uploaded document"
        );

        // an empty text file is just empty text; an empty container is broken
        if document.content.is_empty() && format != DocumentFormat::PlainText {
            return Err(AppError::InvalidFile {
                message: "File is empty".to_string(),
            });
        }

        let extracted = match format {
            DocumentFormat::Pdf => self.pdf.extract_text(&document.content)?,
            DocumentFormat::Docx => {
                ExtractedText::new(read_docx(&document.content)?, DocumentFormat::Docx)
            }
            DocumentFormat::PlainText => {
                ExtractedText::new(read_plain_text(&document.content)?, DocumentFormat::PlainText)
            }
        };

        debug!(
            chars = extracted.text.chars().count(),
            ocr_used = extracted.ocr_used,
            "Document text extracted"
        );
        Ok(extracted)
    }

    pub fn ocr_available(&self) -> bool {
        self.pdf.ocr_available()
    }
}

/// Strict UTF-8; invalid input is a decode error rather than lossy text.
pub fn read_plain_text(data: &[u8]) -> AppResult<String> {
    Ok(std::str::from_utf8(data)?.to_string())
}
