pub mod document_reader;
pub mod docx_reader;
pub mod entities;
pub mod exporter;
pub mod keywords;
pub mod ner_model;
pub mod ocr_service;
pub mod pdf_processor;
pub mod pipeline;
pub mod sentences;
pub mod summary;

pub use document_reader::{read_plain_text, DocumentReader};
pub use docx_reader::read_docx;
pub use entities::{extract_entities, EntityRecognizer, ModelEntityRecognizer};
pub use keywords::extract_keywords;
pub use ocr_service::{OcrEngine, TesseractOcr};
pub use pdf_processor::PdfProcessor;
pub use pipeline::{MetadataPipeline, PipelineOutput};
pub use summary::extract_summary;
