//! Document engine capability interface
//!
//! The detectors never talk to a PDF library directly. They consume a
//! [`Page`] snapshot, and the executor drives redaction through
//! [`PdfDocument`]. This keeps the heuristics testable against in-memory
//! fakes.

use std::ops::{Deref, DerefMut};

use crate::error::RedactError;
use crate::geometry::{Page, Rect};

/// RGB color with components in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);
}

/// What a redaction removes underneath its fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedactOptions {
    pub strip_text: bool,
    pub strip_images: bool,
    pub strip_vector_art: bool,
}

impl Default for RedactOptions {
    fn default() -> Self {
        Self {
            strip_text: true,
            strip_images: true,
            strip_vector_art: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Drop objects no longer referenced after redaction
    pub garbage_collect: bool,
    /// Deflate content streams
    pub compress: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            garbage_collect: true,
            compress: true,
        }
    }
}

/// An opened document
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    /// Layout snapshot of a zero-based page
    fn page(&self, index: usize) -> Result<Page, RedactError>;

    /// Queue a region for redaction; nothing changes until [`apply_redactions`](Self::apply_redactions)
    fn mark_for_redaction(
        &mut self,
        index: usize,
        rect: Rect,
        fill: Rgb,
        options: RedactOptions,
    ) -> Result<(), RedactError>;

    /// Irreversibly remove marked content and paint the fills
    fn apply_redactions(&mut self, index: usize) -> Result<(), RedactError>;

    fn serialize(&mut self, options: SaveOptions) -> Result<Vec<u8>, RedactError>;

    /// Release the underlying handle. Called exactly once by [`DocumentGuard`].
    fn close(&mut self);
}

pub trait DocumentEngine {
    type Document: PdfDocument;

    fn open(&self, bytes: &[u8]) -> Result<Self::Document, RedactError>;
}

/// Owns an opened document and closes it when dropped
pub struct DocumentGuard<D: PdfDocument> {
    doc: D,
}

impl<D: PdfDocument> DocumentGuard<D> {
    pub fn new(doc: D) -> Self {
        Self { doc }
    }
}

impl<D: PdfDocument> Deref for DocumentGuard<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.doc
    }
}

impl<D: PdfDocument> DerefMut for DocumentGuard<D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut self.doc
    }
}

impl<D: PdfDocument> Drop for DocumentGuard<D> {
    fn drop(&mut self) {
        self.doc.close();
    }
}
