use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

use crate::domain::{ports::TextExtractor, ContentType, DocumentContent, DomainError};

const DOCX_BODY: &str = "word/document.xml";

/// Extracts plain text from PDF, DOCX and text files. Unknown types are decoded
/// as lossy UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor;

impl TextExtractor for DocumentExtractor {
    fn extract(&self, content: &DocumentContent) -> Result<String, DomainError> {
        match content.content_type {
            ContentType::Pdf => extract_pdf(&content.bytes),
            ContentType::Docx => extract_docx(&content.bytes),
            ContentType::PlainText => Ok(String::from_utf8_lossy(&content.bytes).into_owned()),
            ContentType::Other => {
                debug!(bytes = content.bytes.len(), "unknown content type, decoding as text");
                Ok(String::from_utf8_lossy(&content.bytes).into_owned())
            }
        }
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, DomainError> {
    // pdf-extract panics on some malformed files
    panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)))
        .map_err(|_| DomainError::extraction("pdf parser panicked"))?
        .map_err(|e| DomainError::extraction(format!("pdf: {e}")))
}

fn extract_docx(bytes: &[u8]) -> Result<String, DomainError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DomainError::extraction(format!("docx archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| DomainError::extraction(format!("docx body: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| DomainError::extraction(format!("docx body: {e}")))?;

    Ok(docx_body_text(&xml))
}

/// Collects `w:t` runs, with a newline per paragraph.
fn docx_body_text(xml: &str) -> String {
    let mut out = String::new();
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        let Some(len) = rest[open..].find('>') else {
            break;
        };
        let tag = &rest[open + 1..open + len];
        let after = &rest[open + len + 1..];
        let name = tag
            .trim_end_matches('/')
            .split_whitespace()
            .next()
            .unwrap_or_default();

        match name {
            "w:t" if !tag.ends_with('/') => {
                let close = after.find("</w:t>").unwrap_or(after.len());
                out.push_str(&unescape(&after[..close]));
                rest = &after[close..];
                continue;
            }
            "/w:p" | "w:br" | "w:cr" => out.push('\n'),
            "w:tab" => out.push('\t'),
            _ => {}
        }
        rest = after;
    }

    out.trim_end().to_string()
}

/// Decodes the predefined XML entities and numeric character references.
/// Anything unrecognised is kept verbatim.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .and_then(|end| entity(&tail[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "amp" => Some('&'),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}
