use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::middleware::admission::Admission;
use crate::services::{
    DocumentReader, EntityRecognizer, MetadataPipeline, ModelEntityRecognizer, OcrEngine,
    TesseractOcr,
};

/// Shared by every handler. The pipeline (and the model it lazily loads) lives
/// for the whole process.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<MetadataPipeline>,
    pub admission: Arc<Admission>,
    pub started_at: Instant,
}

impl AppState {
    /// Production wiring: Tesseract OCR and the BERT recognizer from
    /// `NER_MODEL_DIR`.
    pub fn from_config(config: Config) -> Self {
        let ocr: Arc<dyn OcrEngine> =
            Arc::new(TesseractOcr::new(config.ocr_dpi, config.ocr_language.clone()));
        let recognizer: Arc<dyn EntityRecognizer> =
            Arc::new(ModelEntityRecognizer::new(config.ner_model_dir.clone()));
        Self::with_components(config, ocr, recognizer)
    }

    pub fn with_components(
        config: Config,
        ocr: Arc<dyn OcrEngine>,
        recognizer: Arc<dyn EntityRecognizer>,
    ) -> Self {
        let pipeline = MetadataPipeline::new(DocumentReader::new(ocr), recognizer);
        Self {
            admission: Arc::new(Admission::new(config.max_concurrent_requests)),
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            started_at: Instant::now(),
        }
    }
}
