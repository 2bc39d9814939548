use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::{ExtractedText, MetadataReport, UploadedDocument};
use crate::services::document_reader::DocumentReader;
use crate::services::entities::{extract_entities, EntityRecognizer};
use crate::services::keywords::extract_keywords;
use crate::services::summary::extract_summary;

/// Everything one upload produces.
#[derive(Debug)]
pub struct PipelineOutput {
    pub extracted: ExtractedText,
    pub report: MetadataReport,
    pub processing_time_ms: u64,
}

/// Reader, then keywords, entities and summary over the same text.
pub struct MetadataPipeline {
    reader: DocumentReader,
    recognizer: Arc<dyn EntityRecognizer>,
}

impl MetadataPipeline {
    pub fn new(reader: DocumentReader, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self { reader, recognizer }
    }

    /// Runs the whole pipeline synchronously. Any failure aborts the run and
    /// no partial report is produced.
    pub fn process(&self, document: &UploadedDocument) -> AppResult<PipelineOutput> {
        let start = Instant::now();

        let extracted = self.reader.read(document)?;
        if extracted.is_blank() {
            warn!(file_name = %document.name, "Document produced no text, report will be empty");
        }

        let report = self.analyze(&extracted)?;
        let processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            file_name = %document.name,
            keywords = report.keywords.len(),
            entities = report.entities.len(),
            summary_chars = report.summary.len(),
            processing_time_ms,
            "Metadata extraction completed"
        );

        Ok(PipelineOutput {
            extracted,
            report,
            processing_time_ms,
        })
    }

    /// Derives a report from one extracted text.
    pub fn analyze(&self, extracted: &ExtractedText) -> AppResult<MetadataReport> {
        let text = extracted.text.as_str();
        Ok(MetadataReport {
            keywords: extract_keywords(text),
            entities: extract_entities(self.recognizer.as_ref(), text)?,
            summary: extract_summary(text),
        })
    }

    pub fn recognizer(&self) -> &dyn EntityRecognizer {
        self.recognizer.as_ref()
    }

    pub fn reader(&self) -> &DocumentReader {
        &self.reader
    }
}
