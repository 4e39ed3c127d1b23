//! Apply an approved plan through the document engine

use tracing::debug;

use crate::engine::{PdfDocument, RedactOptions, Rgb, SaveOptions};
use crate::error::RedactError;
use crate::gate::ApprovedPlan;

/// Redact every planned region on one page and serialize the document
///
/// The document is mutated in place; a failure part-way leaves it unusable.
pub fn execute_plan<D: PdfDocument + ?Sized>(
    doc: &mut D,
    page_index: usize,
    plan: &ApprovedPlan,
) -> Result<Vec<u8>, RedactError> {
    for entry in plan.entries() {
        debug!("Marking {:?} region {:?}", entry.provenance, entry.rect);
        doc.mark_for_redaction(page_index, entry.rect, Rgb::WHITE, RedactOptions::default())
            .map_err(into_processing)?;
    }

    doc.apply_redactions(page_index).map_err(into_processing)?;
    doc.serialize(SaveOptions::default()).map_err(into_processing)
}

fn into_processing(err: RedactError) -> RedactError {
    match err {
        RedactError::ProcessingError(_) => err,
        other => RedactError::ProcessingError(other.to_string()),
    }
}
