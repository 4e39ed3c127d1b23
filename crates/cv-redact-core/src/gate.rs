//! Confidence gate
//!
//! Turns detector output into an [`ApprovedPlan`] or refuses. A plan can only
//! be built here, so anything holding an `ApprovedPlan` has passed both the
//! strong-evidence check and the coverage limit.

use serde::Serialize;
use tracing::debug;

use crate::classifier::PersonalLines;
use crate::config::RedactionConfig;
use crate::error::RedactError;
use crate::geometry::{ImageRegion, Page, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    PersonalLine,
    Photo,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlannedRedaction {
    pub rect: Rect,
    pub provenance: Provenance,
}

/// Non-empty set of regions cleared for redaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovedPlan {
    entries: Vec<PlannedRedaction>,
    coverage: f64,
}

impl ApprovedPlan {
    pub fn entries(&self) -> &[PlannedRedaction] {
        &self.entries
    }

    pub fn rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.entries.iter().map(|e| e.rect)
    }

    /// Sum of region areas over page area; overlaps are counted twice
    pub fn coverage(&self) -> f64 {
        self.coverage
    }

    pub fn count(&self, provenance: Provenance) -> usize {
        self.entries
            .iter()
            .filter(|e| e.provenance == provenance)
            .count()
    }
}

/// Decide whether the detected regions may be redacted
pub fn evaluate(
    lines: &PersonalLines,
    photos: &[ImageRegion],
    page: &Page,
    config: &RedactionConfig,
) -> Result<ApprovedPlan, RedactError> {
    if lines.is_empty() {
        return Err(RedactError::DetectionFailure(
            "no personal information lines detected".into(),
        ));
    }
    if lines.strong_count == 0 {
        return Err(RedactError::DetectionFailure(
            "only weak address matches found; need an email, phone or site line".into(),
        ));
    }

    let page_area = page.area();
    if page_area.is_nan() || page_area <= 0.0 {
        return Err(RedactError::InvalidInput(format!(
            "page has no area ({}x{})",
            page.width, page.height
        )));
    }

    let entries: Vec<PlannedRedaction> = lines
        .rects()
        .map(|rect| PlannedRedaction {
            rect,
            provenance: Provenance::PersonalLine,
        })
        .chain(photos.iter().map(|p| PlannedRedaction {
            rect: p.bbox,
            provenance: Provenance::Photo,
        }))
        .collect();

    let coverage = entries.iter().map(|e| e.rect.area()).sum::<f64>() / page_area;
    debug!(
        "Gate: {} regions, strong={}, coverage={:.4}",
        entries.len(),
        lines.strong_count,
        coverage
    );

    if coverage > config.max_coverage {
        return Err(RedactError::SafetyAbort {
            coverage,
            threshold: config.max_coverage,
        });
    }

    Ok(ApprovedPlan { entries, coverage })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{LineSignals, PersonalLine};

    fn line(rect: Rect, strong: bool) -> PersonalLine {
        PersonalLine {
            text: "line".into(),
            rect,
            signals: LineSignals {
                email: strong,
                address: !strong,
                ..LineSignals::default()
            },
        }
    }

    fn lines(items: Vec<PersonalLine>) -> PersonalLines {
        let strong_count = items.iter().filter(|l| l.strong()).count();
        PersonalLines {
            lines: items,
            strong_count,
        }
    }

    fn page() -> Page {
        Page::new(1000.0, 1000.0)
    }

    #[test]
    fn test_no_lines_is_detection_failure() {
        let err = evaluate(&lines(vec![]), &[], &page(), &RedactionConfig::default()).unwrap_err();
        assert!(matches!(err, RedactError::DetectionFailure(_)));
    }

    #[test]
    fn test_weak_only_is_detection_failure() {
        let input = lines(vec![line(Rect::new(0.0, 0.0, 100.0, 20.0), false)]);
        let err = evaluate(&input, &[], &page(), &RedactionConfig::default()).unwrap_err();
        assert!(matches!(err, RedactError::DetectionFailure(_)));
    }

    #[test]
    fn test_small_plan_is_approved_with_provenance() {
        let input = lines(vec![
            line(Rect::new(0.0, 0.0, 100.0, 20.0), true),
            line(Rect::new(0.0, 30.0, 100.0, 50.0), false),
        ]);
        let photo = ImageRegion {
            bbox: Rect::new(800.0, 50.0, 900.0, 150.0),
        };
        let plan = evaluate(&input, &[photo], &page(), &RedactionConfig::default()).unwrap();
        assert_eq!(plan.entries().len(), 3);
        assert_eq!(plan.count(Provenance::PersonalLine), 2);
        assert_eq!(plan.count(Provenance::Photo), 1);
        assert!((plan.coverage() - 0.014).abs() < 1e-9);
    }

    #[test]
    fn test_large_photo_triggers_safety_abort() {
        let input = lines(vec![line(Rect::new(0.0, 0.0, 100.0, 20.0), true)]);
        let photo = ImageRegion {
            bbox: Rect::new(600.0, 0.0, 1000.0, 500.0),
        };
        let err = evaluate(&input, &[photo], &page(), &RedactionConfig::default()).unwrap_err();
        match err {
            RedactError::SafetyAbort {
                coverage,
                threshold,
            } => {
                assert!(coverage > 0.2);
                assert_eq!(threshold, 0.08);
            }
            other => panic!("expected SafetyAbort, got {:?}", other),
        }
    }

    #[test]
    fn test_coverage_exactly_at_limit_is_allowed() {
        // 400 x 200 = 80_000 = 8% of 1_000_000
        let input = lines(vec![line(Rect::new(0.0, 0.0, 400.0, 200.0), true)]);
        assert!(evaluate(&input, &[], &page(), &RedactionConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_area_page_is_rejected() {
        let input = lines(vec![line(Rect::new(0.0, 0.0, 10.0, 10.0), true)]);
        let err = evaluate(&input, &[], &Page::new(0.0, 0.0), &RedactionConfig::default())
            .unwrap_err();
        assert!(matches!(err, RedactError::InvalidInput(_)));
    }
}
