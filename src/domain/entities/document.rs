use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// A file entry in the remote document library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub name: String,
    pub web_url: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Pdf,
    Docx,
    PlainText,
    Other,
}

impl ContentType {
    const DOCX_MIME: &'static str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

    /// Resolves a declared MIME type, falling back to the file extension.
    pub fn detect(mime_type: Option<&str>, file_name: &str) -> Self {
        let mime = mime_type
            .and_then(|m| m.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase());

        match mime.as_deref() {
            Some("application/pdf") => return Self::Pdf,
            Some(m) if m == Self::DOCX_MIME => return Self::Docx,
            Some(m) if m.starts_with("text/") => return Self::PlainText,
            _ => {}
        }

        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => Self::Pdf,
            Some("docx") => Self::Docx,
            Some("txt" | "md" | "csv" | "json" | "html" | "htm") => Self::PlainText,
            _ => Self::Other,
        }
    }
}

/// Raw bytes downloaded for one document.
#[derive(Debug, Clone)]
pub struct DocumentContent {
    pub bytes: Vec<u8>,
    pub content_type: ContentType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: Uuid,
    pub content: String,
    pub chunk_index: usize,
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    pub fn new(content: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            chunk_index,
            metadata: ChunkMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ChunkMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: Option<String>,
    pub document_name: Option<String>,
}

impl ChunkMetadata {
    pub fn from_ref(doc: &DocumentRef) -> Self {
        Self {
            source: doc.web_url.clone(),
            document_name: Some(doc.name.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Splits text into overlapping character windows.
///
/// Each window holds at most `window_size` characters. When the window does not
/// reach the end of the text, its end moves back to the last whitespace in the
/// second half of the window, if any. The next window starts `overlap`
/// characters before the previous end.
pub fn split_into_chunks(
    text: &str,
    window_size: usize,
    overlap: usize,
) -> Result<Vec<String>, DomainError> {
    if window_size == 0 {
        return Err(DomainError::validation("window size must be positive"));
    }
    if overlap >= window_size {
        return Err(DomainError::validation(format!(
            "overlap ({overlap}) must be smaller than window size ({window_size})"
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < len {
        let mut end = (start + window_size).min(len);

        if end < len {
            let floor = start + window_size / 2;
            if let Some(ws) = (floor..end).rev().find(|&i| chars[i].is_whitespace()) {
                end = ws;
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        if end >= len {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_single_chunk() {
        let chunks = split_into_chunks("Hello world.\n\nThis is a test.", 100, 10).unwrap();

        assert_eq!(chunks, vec!["Hello world.\n\nThis is a test.".to_string()]);
    }

    #[test]
    fn test_split_overlapping_windows() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = split_into_chunks(text, 20, 6).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20, "chunk too long: {chunk:?}");
        }
        // neighbours share text
        for pair in chunks.windows(2) {
            let first_tail: Vec<&str> = pair[0].split_whitespace().collect();
            let last_word = first_tail.last().unwrap();
            assert!(
                pair[1].contains(last_word),
                "{:?} does not overlap {:?}",
                pair[1],
                pair[0]
            );
        }
        assert!(chunks.last().unwrap().ends_with("kappa"));
    }

    #[test]
    fn test_split_without_whitespace_hard_cuts() {
        let text = "a".repeat(25);
        let chunks = split_into_chunks(&text, 10, 2).unwrap();

        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[1].len(), 10);
        assert_eq!(chunks.concat().len(), 25 + 2 * (chunks.len() - 1));
    }

    #[test]
    fn test_split_multibyte_text() {
        let text = "héllo wörld ünïcode tëxt ".repeat(4);
        let chunks = split_into_chunks(&text, 12, 3).unwrap();
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_split_empty() {
        assert!(split_into_chunks("", 100, 10).unwrap().is_empty());
        assert!(split_into_chunks("   \n\n  ", 100, 10).unwrap().is_empty());
    }

    #[test]
    fn test_split_rejects_bad_overlap() {
        assert!(matches!(
            split_into_chunks("text", 10, 10),
            Err(DomainError::Validation(_))
        ));
        assert!(split_into_chunks("text", 0, 0).is_err());
    }

    #[test]
    fn test_detect_content_type() {
        assert_eq!(ContentType::detect(Some("application/pdf"), "x"), ContentType::Pdf);
        assert_eq!(
            ContentType::detect(Some("text/plain; charset=utf-8"), "x"),
            ContentType::PlainText
        );
        assert_eq!(ContentType::detect(None, "Policy.DOCX"), ContentType::Docx);
        assert_eq!(
            ContentType::detect(Some("application/octet-stream"), "report.pdf"),
            ContentType::Pdf
        );
        assert_eq!(ContentType::detect(None, "image.png"), ContentType::Other);
    }
}
