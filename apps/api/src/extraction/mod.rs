//! Text Extractor: turns an uploaded resume into plain text.
//!
//! Dispatch is by a closed [`DocumentFormat`] tag. Each supported format has
//! a [`TextParser`] in the handler table returned by [`parser_for`].
//! [`extract`] never fails: every parse fault, including a parser panic on a
//! hostile file, collapses into an empty [`ExtractedText`] plus a log line.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

mod docx;
mod pdf;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Declared format of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
    Unsupported,
}

impl DocumentFormat {
    /// Selects the format from the declared content type. Generic or absent
    /// content types fall back to the file extension.
    pub fn from_declared(content_type: Option<&str>, filename: &str) -> Self {
        let mime = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase());

        match mime.as_deref() {
            Some(PDF_MIME) => DocumentFormat::Pdf,
            Some(DOCX_MIME) => DocumentFormat::Docx,
            Some("text/plain") => DocumentFormat::PlainText,
            None | Some("") | Some("application/octet-stream") => Self::from_extension(filename),
            Some(_) => DocumentFormat::Unsupported,
        }
    }

    pub fn from_extension(filename: &str) -> Self {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("pdf") => DocumentFormat::Pdf,
            Some("docx") => DocumentFormat::Docx,
            Some("txt") => DocumentFormat::PlainText,
            _ => DocumentFormat::Unsupported,
        }
    }
}

/// Opaque document bytes plus their declared format. Lives only until
/// extraction has run.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub filename: String,
    pub format: DocumentFormat,
    pub bytes: Bytes,
}

impl RawDocument {
    pub fn new(filename: impl Into<String>, format: DocumentFormat, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            format,
            bytes: bytes.into(),
        }
    }
}

/// Trimmed extraction output. Empty means extraction failed, never that the
/// document was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn new(text: &str) -> Self {
        Self(text.trim().to_string())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF parse error: {0}")]
    Pdf(String),

    #[error("DOCX archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("DOCX XML error: {0}")]
    Xml(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Text is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// A format-specific text parser. Implementations may fail or even panic;
/// [`extract`] contains both.
pub trait TextParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

struct PlainTextParser;

impl TextParser for PlainTextParser {
    fn parse(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let text = String::from_utf8(bytes.to_vec())?;
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }
}

static PDF_PARSER: pdf::PdfParser = pdf::PdfParser;
static DOCX_PARSER: docx::DocxParser = docx::DocxParser;
static PLAIN_TEXT_PARSER: PlainTextParser = PlainTextParser;

/// Handler table keyed on the format tag.
pub fn parser_for(format: DocumentFormat) -> Option<&'static dyn TextParser> {
    match format {
        DocumentFormat::Pdf => Some(&PDF_PARSER),
        DocumentFormat::Docx => Some(&DOCX_PARSER),
        DocumentFormat::PlainText => Some(&PLAIN_TEXT_PARSER),
        DocumentFormat::Unsupported => None,
    }
}

/// Extracts plain text from a document. Never fails; see module docs.
pub fn extract(document: &RawDocument) -> ExtractedText {
    let Some(parser) = parser_for(document.format) else {
        warn!(
            filename = %document.filename,
            "Unsupported document format, no text extracted"
        );
        return ExtractedText::empty();
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| parser.parse(&document.bytes)));

    let text = match outcome {
        Ok(Ok(text)) => ExtractedText::new(&text),
        Ok(Err(e)) => {
            warn!(
                filename = %document.filename,
                format = ?document.format,
                "Error reading file: {e}"
            );
            ExtractedText::empty()
        }
        Err(_) => {
            error!(
                filename = %document.filename,
                format = ?document.format,
                "Parser panicked while reading file"
            );
            ExtractedText::empty()
        }
    };

    debug!(
        filename = %document.filename,
        chars = text.as_str().len(),
        "Text extraction finished"
    );
    text
}
