//! Fixtures shared by the test binaries: recognizer and OCR doubles plus
//! in-memory PDF and DOCX builders.
#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use metagen::error::AppResult;
use metagen::models::Entity;
use metagen::services::{EntityRecognizer, OcrEngine};
use metagen::{AppState, Config};

/// Finds a fixed set of mentions wherever they occur, in document order.
pub struct StaticRecognizer {
    known: Vec<(String, String)>,
    ready: bool,
}

impl StaticRecognizer {
    pub fn new(known: &[(&str, &str)]) -> Self {
        Self {
            known: known
                .iter()
                .map(|(text, label)| (text.to_string(), label.to_string()))
                .collect(),
            ready: true,
        }
    }

    pub fn not_ready() -> Self {
        Self {
            known: Vec::new(),
            ready: false,
        }
    }
}

impl EntityRecognizer for StaticRecognizer {
    fn recognize(&self, text: &str) -> AppResult<Vec<Entity>> {
        let mut found: Vec<(usize, Entity)> = Vec::new();
        for (mention, label) in &self.known {
            for (offset, _) in text.match_indices(mention.as_str()) {
                found.push((offset, Entity::new(mention.as_str(), label.as_str())));
            }
        }
        found.sort_by_key(|(offset, _)| *offset);
        Ok(found.into_iter().map(|(_, entity)| entity).collect())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Returns canned page texts and counts how often it was asked.
pub struct FakeOcr {
    pages: Vec<String>,
    calls: AtomicUsize,
}

impl FakeOcr {
    pub fn new(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for FakeOcr {
    fn recognize_pdf(&self, _pdf_data: &[u8]) -> AppResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pages.clone())
    }

    fn is_available(&self) -> bool {
        true
    }
}

pub fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 8080,
        max_file_size_mb: 1,
        ..Config::default()
    }
}

pub fn test_state(recognizer: StaticRecognizer) -> AppState {
    AppState::with_components(
        test_config(),
        Arc::new(FakeOcr::new(&["Scanned page text."])),
        Arc::new(recognizer),
    )
}

/// One page per entry; an empty string produces a page with no text layer.
pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("serialize pdf");
    buffer
}

/// Minimal `.docx` with the given `w:body` inner XML.
pub fn build_docx(body_xml: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body_xml
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    writer
        .start_file("[Content_Types].xml", options)
        .expect("start content types");
    writer
        .write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
        .expect("write content types");
    writer
        .start_file("word/document.xml", options)
        .expect("start document part");
    writer
        .write_all(document.as_bytes())
        .expect("write document part");
    writer.finish().expect("finish docx").into_inner()
}

pub fn paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", text)
}
