use super::{ExtractionError, TextParser};

/// PDF text via `pdf-extract`, page by page. A page that yields nothing
/// contributes an empty string rather than failing the document.
pub(super) struct PdfParser;

impl TextParser for PdfParser {
    fn parse(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

        tracing::debug!(page_count = pages.len(), "PDF pages extracted");

        Ok(pages.concat())
    }
}
