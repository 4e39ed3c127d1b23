//! Document engine backed by lopdf

mod cmap;
mod interpreter;
mod layout;
mod redact;
mod resources;

use std::collections::BTreeMap;

use lopdf::{Document, ObjectId};

use crate::engine::{DocumentEngine, PdfDocument, RedactOptions, Rgb, SaveOptions};
use crate::error::RedactError;
use crate::geometry::{Page, Rect};
use redact::Mark;

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl DocumentEngine for LopdfEngine {
    type Document = LopdfDocument;

    fn open(&self, bytes: &[u8]) -> Result<LopdfDocument, RedactError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| RedactError::ProcessingError(format!("Failed to parse PDF: {}", e)))?;
        Ok(LopdfDocument::new(doc))
    }
}

pub struct LopdfDocument {
    doc: Option<Document>,
    pages: Vec<ObjectId>,
    marks: BTreeMap<usize, Vec<Mark>>,
}

impl LopdfDocument {
    pub fn new(doc: Document) -> Self {
        let pages = doc.get_pages().into_values().collect();
        Self {
            doc: Some(doc),
            pages,
            marks: BTreeMap::new(),
        }
    }

    fn document(&self) -> Result<&Document, RedactError> {
        self.doc
            .as_ref()
            .ok_or_else(|| RedactError::ProcessingError("document is closed".into()))
    }

    fn document_mut(&mut self) -> Result<&mut Document, RedactError> {
        self.doc
            .as_mut()
            .ok_or_else(|| RedactError::ProcessingError("document is closed".into()))
    }

    fn page_id(&self, index: usize) -> Result<ObjectId, RedactError> {
        self.pages.get(index).copied().ok_or_else(|| {
            RedactError::ProcessingError(format!(
                "page {} out of range (document has {} pages)",
                index,
                self.pages.len()
            ))
        })
    }

    pub fn is_closed(&self) -> bool {
        self.doc.is_none()
    }
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<Page, RedactError> {
        layout::extract_page(self.document()?, self.page_id(index)?)
    }

    fn mark_for_redaction(
        &mut self,
        index: usize,
        rect: Rect,
        fill: Rgb,
        options: RedactOptions,
    ) -> Result<(), RedactError> {
        self.page_id(index)?;
        self.document()?;
        if options.strip_vector_art {
            return Err(RedactError::ProcessingError(
                "Removing vector art is not supported by the lopdf engine".into(),
            ));
        }
        self.marks
            .entry(index)
            .or_default()
            .push(Mark { rect, fill, options });
        Ok(())
    }

    fn apply_redactions(&mut self, index: usize) -> Result<(), RedactError> {
        let page_id = self.page_id(index)?;
        let marks = self.marks.remove(&index).unwrap_or_default();
        redact::apply_marks(self.document_mut()?, page_id, &marks)
    }

    fn serialize(&mut self, options: SaveOptions) -> Result<Vec<u8>, RedactError> {
        let doc = self.document_mut()?;
        if options.garbage_collect {
            doc.prune_objects();
        }
        if options.compress {
            doc.compress();
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| RedactError::ProcessingError(format!("Save failed: {}", e)))?;
        Ok(buffer)
    }

    fn close(&mut self) {
        self.marks.clear();
        self.doc = None;
    }
}
