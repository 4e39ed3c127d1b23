//! Redaction pipeline entry point
//!
//! Runs the detectors over the first page, asks the confidence gate for an
//! approved plan and only then lets the executor touch the document.

use tracing::{debug, info, warn};

use crate::anchor::find_name_anchor;
use crate::classifier::detect_personal_lines;
use crate::config::RedactionConfig;
use crate::engine::{DocumentEngine, DocumentGuard, PdfDocument};
use crate::error::RedactError;
use crate::executor::execute_plan;
use crate::gate::{self, ApprovedPlan, Provenance};
use crate::geometry::Page;
use crate::photo::detect_photo_regions;

/// The `%PDF-` marker must appear within this many leading bytes
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Output of a successful redaction
#[derive(Debug, Clone)]
pub struct Redacted {
    pub bytes: Vec<u8>,
    pub plan: ApprovedPlan,
}

pub struct Redactor<E: DocumentEngine> {
    engine: E,
    config: RedactionConfig,
}

impl<E: DocumentEngine> Redactor<E> {
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, RedactionConfig::default())
    }

    pub fn with_config(engine: E, config: RedactionConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &RedactionConfig {
        &self.config
    }

    /// Detect and gate redaction regions for a page without touching the document
    pub fn plan(&self, page: &Page) -> Result<ApprovedPlan, RedactError> {
        let anchor = find_name_anchor(page, &self.config);
        if anchor.is_none() {
            debug!("No name anchor found, using fallback search band");
        }

        let lines = detect_personal_lines(page, anchor.as_ref(), &self.config);
        let photos = detect_photo_regions(page, &self.config);
        debug!(
            "Detected {} personal lines ({} strong), {} photo regions",
            lines.lines.len(),
            lines.strong_count,
            photos.len()
        );

        gate::evaluate(&lines, &photos, page, &self.config)
    }

    /// Redact personal details from the first page of a PDF
    pub fn redact(&self, bytes: &[u8]) -> Result<Redacted, RedactError> {
        check_header(bytes)?;

        let mut doc = DocumentGuard::new(self.engine.open(bytes)?);
        if doc.page_count() == 0 {
            return Err(RedactError::InvalidInput("PDF has no pages".into()));
        }

        let page = doc.page(0)?;
        let plan = self.plan(&page).inspect_err(|e| {
            warn!("Refusing to redact: {}", e);
        })?;

        let bytes = execute_plan(&mut *doc, 0, &plan)?;
        info!(
            "Redacted {} personal lines and {} photos (coverage {:.4}), output {} bytes",
            plan.count(Provenance::PersonalLine),
            plan.count(Provenance::Photo),
            plan.coverage(),
            bytes.len()
        );

        Ok(Redacted { bytes, plan })
    }
}

fn check_header(bytes: &[u8]) -> Result<(), RedactError> {
    if bytes.is_empty() {
        return Err(RedactError::InvalidInput("Empty input".into()));
    }
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    if !window.windows(5).any(|w| w == b"%PDF-") {
        return Err(RedactError::InvalidInput(
            "Input is not a PDF (missing %PDF- header)".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, TextSpan, Word};
    use crate::lopdf_engine::LopdfEngine;

    fn redactor() -> Redactor<LopdfEngine> {
        Redactor::new(LopdfEngine)
    }

    #[test]
    fn test_empty_input_is_invalid() {
        let err = redactor().redact(&[]).unwrap_err();
        assert!(matches!(err, RedactError::InvalidInput(_)));
    }

    #[test]
    fn test_missing_header_is_invalid() {
        let err = redactor().redact(b"hello, not a pdf").unwrap_err();
        assert!(matches!(err, RedactError::InvalidInput(_)));
    }

    #[test]
    fn test_header_after_window_is_invalid() {
        let mut bytes = vec![b' '; HEADER_SEARCH_WINDOW];
        bytes.extend_from_slice(b"%PDF-1.7");
        assert!(matches!(
            check_header(&bytes),
            Err(RedactError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_header_with_leading_junk_passes_check() {
        assert!(check_header(b"\xEF\xBB\xBF%PDF-1.4\n").is_ok());
    }

    #[test]
    fn test_unparseable_pdf_is_processing_error() {
        let err = redactor().redact(b"%PDF-1.7\ngarbage").unwrap_err();
        assert!(matches!(err, RedactError::ProcessingError(_)));
    }

    #[test]
    fn test_plan_without_engine() {
        let mut page = Page::new(612.0, 792.0);
        page.spans.push(TextSpan {
            text: "Jane Doe".into(),
            bbox: Rect::new(72.0, 60.0, 180.0, 80.0),
            font_size: 20.0,
        });
        page.words.push(Word {
            text: "jane@example.com".into(),
            bbox: Rect::new(72.0, 90.0, 170.0, 100.0),
            block: 1,
            line: 0,
        });

        let plan = redactor().plan(&page).unwrap();
        assert_eq!(plan.count(Provenance::PersonalLine), 1);
        assert_eq!(plan.count(Provenance::Photo), 0);
    }
}
