use async_trait::async_trait;

use crate::error::{Error, Result};

/// Turns a stored CV payload into plain text for prompting.
#[async_trait]
pub trait CvTextExtractor: Send + Sync {
    async fn extract_text(&self, data: Vec<u8>) -> Result<String>;
}

/// Text layer extraction with `lopdf`. Scanned CVs without a text layer yield an error.
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor;

#[async_trait]
impl CvTextExtractor for PdfTextExtractor {
    async fn extract_text(&self, data: Vec<u8>) -> Result<String> {
        let text = tokio::task::spawn_blocking(move || extract_pdf_text(&data))
            .await
            .map_err(|e| Error::Internal(format!("PDF extraction task failed: {}", e)))??;

        if text.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "The CV has no extractable text".to_string(),
            ));
        }
        Ok(text)
    }
}

fn extract_pdf_text(data: &[u8]) -> Result<String> {
    let doc = lopdf::Document::load_mem(data)
        .map_err(|e| Error::InvalidArgument(format!("Unreadable PDF: {}", e)))?;

    let mut text = String::new();
    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => tracing::debug!(page = page_num, error = %e, "skipping unreadable page"),
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn garbage_bytes_are_an_extraction_error() {
        let result = PdfTextExtractor
            .extract_text(b"this is not a pdf at all".to_vec())
            .await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
