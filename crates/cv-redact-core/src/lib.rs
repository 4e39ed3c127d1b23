//! CV first-page redaction
//!
//! This crate removes contact details and profile photos from the first page
//! of a CV before it is shared with reviewers.
//!
//! The pipeline is:
//! - `anchor`: find the candidate's name heading near the top of the page
//! - `classifier`: match email / phone / site / address lines below it
//! - `photo`: find profile-photo sized images in the top-right corner
//! - `gate`: refuse to act on weak evidence or oversized redactions
//! - `executor`: strip the approved regions through a [`PdfDocument`]
//!
//! Detectors work on a [`Page`] snapshot and never touch a PDF library
//! directly; [`lopdf_engine`] provides the production engine.

pub mod anchor;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod gate;
pub mod geometry;
pub mod lopdf_engine;
pub mod photo;
pub mod pipeline;

pub use config::RedactionConfig;
pub use engine::{DocumentEngine, DocumentGuard, PdfDocument, RedactOptions, Rgb, SaveOptions};
pub use error::RedactError;
pub use gate::{ApprovedPlan, PlannedRedaction, Provenance};
pub use geometry::{EmbeddedImage, ImageRegion, Page, Rect, TextSpan, Word};
pub use lopdf_engine::LopdfEngine;
pub use pipeline::{Redacted, Redactor};

/// Redact a CV with the lopdf engine and default thresholds
pub fn redact_cv_bytes(bytes: &[u8]) -> Result<Vec<u8>, RedactError> {
    Redactor::new(LopdfEngine).redact(bytes).map(|r| r.bytes)
}
