//! Embedded text layer extraction for digital PDFs.

use super::types::{ExtractedText, ExtractionError};
use crate::processing::cleaning::clean;
use lopdf::Document;

/// Minimum number of cleaned characters for a PDF to count as having a text layer.
pub const MIN_TEXT_LAYER_CHARS: usize = 50;

/// Pull the per-page text layer out of `bytes`, concatenated in page order.
///
/// Parsing is CPU bound and the parser may panic on hostile input, so it runs on the
/// blocking pool and a panic surfaces as an unreadable source. The parser never writes to
/// stdout, which carries protocol frames for the MCP server and results for the CLI.
pub async fn extract_text_layer(bytes: Vec<u8>) -> Result<String, ExtractionError> {
    let pages = tokio::task::spawn_blocking(move || read_pages(&bytes))
        .await
        .map_err(|join| ExtractionError::unreadable(format!("PDF parser aborted: {join}")))??;

    tracing::debug!(pages = pages.len(), "Parsed PDF text layer");
    Ok(pages
        .iter()
        .map(|page| page.trim_end())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n"))
}

fn read_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
    let document = Document::load_mem(bytes)
        .map_err(|error| ExtractionError::unreadable(format!("PDF parsing failed: {error}")))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().into_keys() {
        match document.extract_text(&[page_number]) {
            Ok(text) => pages.push(text),
            Err(error) => {
                // One undecodable page should not hide the rest of the report.
                tracing::warn!(page_number, %error, "Skipping page without decodable text");
            }
        }
    }
    Ok(pages)
}

/// Extract and clean a PDF, rejecting documents whose text layer is too thin to use.
pub async fn extract_pdf(bytes: Vec<u8>, min_chars: usize) -> Result<ExtractedText, ExtractionError> {
    let raw = extract_text_layer(bytes).await?;
    let cleaned = clean(&raw);
    let extracted_chars = cleaned.chars().count();
    if extracted_chars < min_chars {
        tracing::info!(extracted_chars, min_chars, "PDF has no usable text layer");
        return Err(ExtractionError::ScannedNoTextLayer { extracted_chars });
    }
    Ok(ExtractedText { raw, cleaned })
}
