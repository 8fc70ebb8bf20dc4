//! Optical character recognition for photographed or scanned documents.

use super::types::ExtractionError;
use thiserror::Error;

/// Failures raised by an OCR engine.
#[derive(Debug, Error)]
pub enum OcrError {
    /// This build carries no OCR engine.
    #[error("OCR is not available in this build (enable the `ocr` feature)")]
    Unavailable,
    /// The engine could not load its language data.
    #[error("OCR engine initialisation failed: {0}")]
    Init(String),
    /// The image could not be decoded or recognised.
    #[error("OCR recognition failed: {0}")]
    Recognition(String),
}

impl From<OcrError> for ExtractionError {
    fn from(error: OcrError) -> Self {
        match error {
            OcrError::Unavailable => ExtractionError::Unsupported {
                reason: "image documents need OCR, which this build does not include".into(),
            },
            other => ExtractionError::unreadable(other),
        }
    }
}

/// Synchronous OCR backend. Callers run it on the blocking pool.
pub trait OcrEngine: Send + Sync {
    /// Recognise the text in an encoded image (PNG, JPEG, TIFF, ...).
    fn recognize(&self, image: &[u8], language: &str) -> Result<String, OcrError>;
}

/// Engine used when OCR support is compiled out.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableOcr;

impl OcrEngine for UnavailableOcr {
    fn recognize(&self, _image: &[u8], _language: &str) -> Result<String, OcrError> {
        Err(OcrError::Unavailable)
    }
}

/// Tesseract-backed engine.
#[cfg(feature = "ocr")]
#[derive(Debug, Default, Clone)]
pub struct TesseractOcr {
    tessdata_dir: Option<std::path::PathBuf>,
}

#[cfg(feature = "ocr")]
impl TesseractOcr {
    /// Use `tessdata_dir` for language data, or the system default when `None`.
    pub fn new(tessdata_dir: Option<std::path::PathBuf>) -> Self {
        Self { tessdata_dir }
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &[u8], language: &str) -> Result<String, OcrError> {
        let datapath = match &self.tessdata_dir {
            Some(dir) => Some(
                dir.to_str()
                    .ok_or_else(|| OcrError::Init("tessdata path is not valid UTF-8".into()))?,
            ),
            None => None,
        };

        let tess = tesseract::Tesseract::new(datapath, Some(language))
            .map_err(|error| OcrError::Init(format!("{error:?}")))?;
        let mut tess = tess
            .set_image_from_mem(image)
            .map_err(|error| OcrError::Recognition(format!("{error:?}")))?;
        tess.get_text()
            .map_err(|error| OcrError::Recognition(format!("{error:?}")))
    }
}

/// Engine selected for this build: Tesseract when compiled with `ocr`, otherwise unavailable.
pub fn default_engine(tessdata_dir: Option<std::path::PathBuf>) -> std::sync::Arc<dyn OcrEngine> {
    #[cfg(feature = "ocr")]
    {
        std::sync::Arc::new(TesseractOcr::new(tessdata_dir))
    }
    #[cfg(not(feature = "ocr"))]
    {
        let _ = tessdata_dir;
        std::sync::Arc::new(UnavailableOcr)
    }
}
