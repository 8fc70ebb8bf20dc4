//! Document references, extraction output and the extraction error taxonomy.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use thiserror::Error;

/// Media kind declared by the storage collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Portable Document Format.
    Pdf,
    /// Raster image (photo or scan) that needs OCR.
    Image,
    /// Absent or generic declaration; the location decides.
    #[default]
    Unknown,
}

impl MediaKind {
    /// Interpret a free-form declared type (`pdf`, `application/pdf`, `image/png`, `jpg`, ...).
    ///
    /// Anything unrecognised is treated as generic.
    pub fn from_declared(declared: Option<&str>) -> Self {
        let Some(value) = declared.map(|value| value.trim().to_lowercase()) else {
            return Self::Unknown;
        };
        match value.as_str() {
            "pdf" | "application/pdf" => Self::Pdf,
            "image" | "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "webp" | "gif" => {
                Self::Image
            }
            other if other.starts_with("image/") => Self::Image,
            _ => Self::Unknown,
        }
    }
}

/// Fetchable location of a patient document plus its declared kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    /// Time-limited URL (or `file://` / filesystem path for local use).
    pub location: String,
    /// Declared media kind.
    #[serde(default)]
    pub kind: MediaKind,
}

impl DocumentReference {
    /// Reference with an explicit media kind.
    pub fn new(location: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            location: location.into(),
            kind,
        }
    }

    /// Whether the PDF branch applies: declared PDF, or a generic declaration whose trailing
    /// path segment ends in `.pdf` (query string and fragment ignored, case-insensitive).
    pub fn is_pdf(&self) -> bool {
        match self.kind {
            MediaKind::Pdf => true,
            MediaKind::Image => false,
            MediaKind::Unknown => location_has_pdf_suffix(&self.location),
        }
    }
}

fn location_has_pdf_suffix(location: &str) -> bool {
    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or(location);
    let segment = path.rsplit(['/', '\\']).next().unwrap_or(path);
    segment.to_lowercase().ends_with(".pdf")
}

/// Text recovered from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Text exactly as the PDF parser or OCR engine produced it.
    pub raw: String,
    /// Output of the text cleaner; what the rest of the pipeline consumes.
    pub cleaned: String,
}

impl ExtractedText {
    /// Number of characters in the cleaned text.
    pub fn cleaned_chars(&self) -> usize {
        self.cleaned.chars().count()
    }
}

/// Coarse classification of extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionErrorKind {
    /// The document could not be fetched or parsed.
    UnreadableSource,
    /// A syntactically valid PDF without an embedded text layer.
    ScannedNoTextLayer,
    /// The document type cannot be processed by this build.
    Unsupported,
}

type BoxedCause = Box<dyn StdError + Send + Sync>;

/// Errors returned by the document extractor.
///
/// Display strings are single actionable sentences meant for the end user; the underlying
/// cause stays reachable through [`std::error::Error::source`] for logging.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Fetching or parsing failed.
    #[error("Could not read the document. Please check that the file is available and try again.")]
    UnreadableSource {
        /// Lower-level failure.
        #[source]
        source: BoxedCause,
    },
    /// The PDF has no usable text layer.
    #[error(
        "Scanned PDF detected (no selectable text). Please upload an image or paste text manually."
    )]
    ScannedNoTextLayer {
        /// Characters that survived cleaning.
        extracted_chars: usize,
    },
    /// The document cannot be handled by this build.
    #[error("This document type is not supported: {reason}")]
    Unsupported {
        /// Why the document was rejected.
        reason: String,
    },
}

impl ExtractionError {
    /// Wrap a lower-level failure.
    pub fn unreadable(source: impl Into<BoxedCause>) -> Self {
        Self::UnreadableSource {
            source: source.into(),
        }
    }

    /// Classification for callers that branch on the failure class.
    pub fn kind(&self) -> ExtractionErrorKind {
        match self {
            Self::UnreadableSource { .. } => ExtractionErrorKind::UnreadableSource,
            Self::ScannedNoTextLayer { .. } => ExtractionErrorKind::ScannedNoTextLayer,
            Self::Unsupported { .. } => ExtractionErrorKind::Unsupported,
        }
    }
}
