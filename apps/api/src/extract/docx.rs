//! Word `.docx` text extraction.
//!
//! A `.docx` is a zip archive; body text lives in `word/document.xml`. Text runs
//! (`w:t`) inside one paragraph (`w:p`) are concatenated, tabs and breaks become
//! spaces, and paragraphs are joined with a single space.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::extract::ExtractError;

pub fn extract_docx(data: &[u8]) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| ExtractError::Parse(format!("not a valid .docx archive: {e}")))?;

    let xml = {
        let mut document_xml = archive
            .by_name("word/document.xml")
            .map_err(|e| ExtractError::Parse(format!("Missing word/document.xml: {e}")))?;
        let mut content = String::new();
        document_xml
            .read_to_string(&mut content)
            .map_err(|e| ExtractError::Parse(format!("unreadable word/document.xml: {e}")))?;
        content
    };

    paragraphs_text(&xml)
}

fn paragraphs_text(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:t" => in_text = true,
                b"w:p" => current.clear(),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if matches!(e.name().as_ref(), b"w:tab" | b"w:br") {
                    current.push(' ');
                }
            }
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|err| ExtractError::Parse(format!("bad text run: {err}")))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    let paragraph = current.trim();
                    if !paragraph.is_empty() {
                        paragraphs.push(paragraph.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::Parse(format!(
                    "malformed XML at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(paragraphs.join(" "))
}
