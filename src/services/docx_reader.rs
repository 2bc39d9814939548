use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::error::{AppError, AppResult};

const DOCUMENT_PART: &str = "word/document.xml";

/// Reads the body paragraphs of a `.docx` file, joined with newlines.
///
/// Tables, headers, footers, and text boxes are not read.
pub fn read_docx(data: &[u8]) -> AppResult<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).map_err(|e| AppError::InvalidFile {
        message: format!("Not a valid DOCX container: {}", e),
    })?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| AppError::InvalidFile {
            message: format!("DOCX is missing {}: {}", DOCUMENT_PART, e),
        })?
        .read_to_string(&mut xml)
        .map_err(|e| AppError::DecodeError {
            message: format!("{} is not valid UTF-8: {}", DOCUMENT_PART, e),
        })?;

    let paragraphs = body_paragraphs(&xml)?;
    debug!("DOCX contained {} body paragraphs", paragraphs.len());
    Ok(paragraphs.join("\n"))
}

/// Walks `document.xml` and collects the text of top-level paragraphs.
pub(crate) fn body_paragraphs(xml: &str) -> AppResult<Vec<String>> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut table_depth = 0usize;
    let mut paragraph_depth = 0usize;
    // runs nest when a text box sits inside one
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        let collecting = table_depth == 0 && paragraph_depth == 1;

        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:p" => {
                    paragraph_depth += 1;
                    if table_depth == 0 && paragraph_depth == 1 {
                        current.clear();
                    }
                }
                b"w:r" => run_depth += 1,
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:p" if table_depth == 0 && paragraph_depth == 0 => paragraphs.push(String::new()),
                b"w:tab" if collecting && run_depth > 0 => current.push('\t'),
                b"w:br" | b"w:cr" if collecting && run_depth > 0 => current.push('\n'),
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:p" => {
                    if collecting {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                }
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                _ => {}
            },
            Ok(Event::Text(t)) if in_text && collecting => {
                let text = t.unescape().map_err(|e| AppError::InvalidFile {
                    message: format!("Malformed text in {}: {}", DOCUMENT_PART, e),
                })?;
                current.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AppError::InvalidFile {
                    message: format!(
                        "Malformed XML in {} at byte {}: {}",
                        DOCUMENT_PART,
                        reader.buffer_position(),
                        e
                    ),
                })
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        )
    }

    #[test]
    fn tab_stop_definitions_are_not_text() {
        let xml = wrap(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r></w:p>"#,
        );
        assert_eq!(body_paragraphs(&xml).unwrap(), vec!["a\tb".to_string()]);
    }

    #[test]
    fn text_box_paragraphs_are_skipped() {
        let xml = wrap(
            r#"<w:p><w:r><w:t>outer</w:t></w:r><w:r><w:txbxContent><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:txbxContent></w:r></w:p>"#,
        );
        assert_eq!(body_paragraphs(&xml).unwrap(), vec!["outer".to_string()]);
    }

    #[test]
    fn breaks_after_a_nested_text_box_are_kept() {
        let xml = wrap(
            r#"<w:p><w:r><w:t>before</w:t><w:pict><w:txbxContent><w:p><w:r><w:t>boxed</w:t></w:r></w:p></w:txbxContent></w:pict><w:br/><w:t>after</w:t><w:tab/><w:t>end</w:t></w:r></w:p>"#,
        );
        assert_eq!(body_paragraphs(&xml).unwrap(), vec!["before\nafter\tend".to_string()]);
    }

    #[test]
    fn entities_are_unescaped() {
        let xml = wrap(r#"<w:p><w:r><w:t>Smith &amp; Sons</w:t></w:r></w:p>"#);
        assert_eq!(body_paragraphs(&xml).unwrap(), vec!["Smith & Sons".to_string()]);
    }
}
