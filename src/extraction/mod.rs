//! Document text recovery: fetch, then parse the PDF text layer or OCR the image.

mod fetch;
mod ocr;
mod pdf;
mod types;

pub use fetch::{DocumentFetcher, FetchError, HttpFetcher};
#[cfg(feature = "ocr")]
pub use ocr::TesseractOcr;
pub use ocr::{OcrEngine, OcrError, UnavailableOcr, default_engine};
pub use pdf::MIN_TEXT_LAYER_CHARS;
pub use types::{
    DocumentReference, ExtractedText, ExtractionError, ExtractionErrorKind, MediaKind,
};

use crate::config::PipelineSettings;
use crate::processing::cleaning::clean;
use std::error::Error as _;
use std::sync::Arc;

/// Resolves a [`DocumentReference`] into cleaned text.
#[derive(Clone)]
pub struct DocumentExtractor {
    fetcher: Arc<dyn DocumentFetcher>,
    ocr: Arc<dyn OcrEngine>,
    ocr_language: String,
    min_text_chars: usize,
}

impl DocumentExtractor {
    /// Build an extractor from explicit collaborators.
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        ocr: Arc<dyn OcrEngine>,
        ocr_language: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            ocr,
            ocr_language: ocr_language.into(),
            min_text_chars: MIN_TEXT_LAYER_CHARS,
        }
    }

    /// HTTP/file fetching plus the OCR engine compiled into this build.
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self::new(
            Arc::new(HttpFetcher::new()),
            default_engine(settings.tessdata_dir.clone()),
            settings.ocr_language.clone(),
        )
    }

    /// Fetch and extract the document, returning raw and cleaned text.
    #[tracing::instrument(skip_all, fields(pdf = reference.is_pdf()))]
    pub async fn extract(
        &self,
        reference: &DocumentReference,
    ) -> Result<ExtractedText, ExtractionError> {
        let result = self.extract_inner(reference).await;
        match &result {
            Ok(text) => tracing::info!(cleaned_chars = text.cleaned_chars(), "Extraction complete"),
            Err(error) => {
                let cause = error.source().map(ToString::to_string);
                tracing::warn!(kind = ?error.kind(), cause = cause.as_deref(), "Extraction failed");
            }
        }
        result
    }

    async fn extract_inner(
        &self,
        reference: &DocumentReference,
    ) -> Result<ExtractedText, ExtractionError> {
        let bytes = self
            .fetcher
            .fetch(&reference.location)
            .await
            .map_err(ExtractionError::unreadable)?;

        if reference.is_pdf() {
            pdf::extract_pdf(bytes, self.min_text_chars).await
        } else {
            self.recognize(bytes).await
        }
    }

    async fn recognize(&self, image: Vec<u8>) -> Result<ExtractedText, ExtractionError> {
        let engine = Arc::clone(&self.ocr);
        let language = self.ocr_language.clone();
        let raw = tokio::task::spawn_blocking(move || engine.recognize(&image, &language))
            .await
            .map_err(|join| ExtractionError::unreadable(format!("OCR task aborted: {join}")))??;
        let cleaned = clean(&raw);
        Ok(ExtractedText { raw, cleaned })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ocr::tests::MockOcr;
    use crate::extraction::pdf::tests::make_test_pdf;
    use async_trait::async_trait;

    struct StaticFetcher(Result<Vec<u8>, u16>);

    #[async_trait]
    impl DocumentFetcher for StaticFetcher {
        async fn fetch(&self, _location: &str) -> Result<Vec<u8>, FetchError> {
            match &self.0 {
                Ok(bytes) => Ok(bytes.clone()),
                Err(code) => Err(FetchError::UnexpectedStatus {
                    status: reqwest::StatusCode::from_u16(*code).expect("status"),
                }),
            }
        }
    }

    fn extractor(bytes: Result<Vec<u8>, u16>, ocr: Arc<MockOcr>) -> DocumentExtractor {
        DocumentExtractor::new(Arc::new(StaticFetcher(bytes)), ocr, "eng")
    }

    #[tokio::test]
    async fn images_go_through_ocr_and_cleaning() {
        let ocr = Arc::new(MockOcr::returning(
            "|| Glucose 105 mg/dL ~~\nPage 1 of 2\nCall 555-123-4567",
        ));
        let reference = DocumentReference::new("https://store/scan.jpg?sig=1", MediaKind::Unknown);
        let text = extractor(Ok(b"jpeg".to_vec()), Arc::clone(&ocr))
            .extract(&reference)
            .await
            .expect("ocr text");

        assert_eq!(text.cleaned, "Glucose 105 mg/dL\nCall");
        assert_eq!(*ocr.languages.lock().expect("lock"), vec!["eng".to_string()]);
    }

    #[tokio::test]
    async fn pdf_branch_never_touches_ocr() {
        let ocr = Arc::new(MockOcr::returning("unused"));
        let pdf = make_test_pdf(&[
            "Lipid Panel",
            "LDL Cholesterol 162 mg/dL High reference below 100",
        ]);
        let reference = DocumentReference::new("https://store/report", MediaKind::Pdf);
        let text = extractor(Ok(pdf), Arc::clone(&ocr))
            .extract(&reference)
            .await
            .expect("pdf text");

        assert!(text.cleaned.contains("LDL"));
        assert!(ocr.languages.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn fetch_failures_are_wrapped_with_cause() {
        let ocr = Arc::new(MockOcr::returning("unused"));
        let reference = DocumentReference::new("https://store/expired.pdf", MediaKind::Unknown);
        let error = extractor(Err(403), ocr)
            .extract(&reference)
            .await
            .expect_err("expired link");

        assert_eq!(error.kind(), ExtractionErrorKind::UnreadableSource);
        let cause = error.source().expect("cause").to_string();
        assert!(cause.contains("403"));
    }

    #[tokio::test]
    async fn ocr_failures_are_unreadable() {
        let ocr = Arc::new(MockOcr::failing("corrupt image"));
        let reference = DocumentReference::new("https://store/scan.png", MediaKind::Image);
        let error = extractor(Ok(b"png".to_vec()), ocr)
            .extract(&reference)
            .await
            .expect_err("ocr failure");
        assert_eq!(error.kind(), ExtractionErrorKind::UnreadableSource);
    }
}
