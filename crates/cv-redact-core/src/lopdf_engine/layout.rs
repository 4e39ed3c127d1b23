//! Layout extraction: spans, words and image placements for one page

use lopdf::content::Content;
use lopdf::{Document, ObjectId};

use super::interpreter::{Event, Interpreter, PageSpace, ShownText};
use super::resources::{media_box, PageResources};
use crate::error::RedactError;
use crate::geometry::{EmbeddedImage, Page, Rect, TextSpan, Word};

/// Baseline shift, as a fraction of font size, that starts a new visual line
const LINE_BREAK_RATIO: f64 = 0.2;
/// Horizontal gap, as a fraction of font size, that splits two words
const WORD_GAP_RATIO: f64 = 0.25;
/// Largest gap, as a fraction of font size, bridged when joining show operators into one span
const SPAN_JOIN_RATIO: f64 = 1.0;

pub(crate) fn extract_page(doc: &Document, page_id: ObjectId) -> Result<Page, RedactError> {
    let media = media_box(doc, page_id);
    let resources = PageResources::load(doc, page_id);
    let content = doc.get_page_content(page_id)?;
    let operations = Content::decode(&content)?.operations;

    let mut interpreter = Interpreter::new(&resources, PageSpace::new(media));
    let mut builder = LayoutBuilder::new(Page::new(media.width(), media.height()));
    for op in &operations {
        if let Some(event) = interpreter.step(op) {
            builder.push(event);
        }
    }
    Ok(builder.finish())
}

struct PendingWord {
    text: String,
    bbox: Rect,
}

/// Font and baseline of the span the next show operator may extend
struct OpenSpan {
    font_key: Vec<u8>,
    size: f64,
    baseline: f64,
}

struct LayoutBuilder {
    page: Page,
    block: Option<u32>,
    line: u32,
    last_baseline: Option<f64>,
    word: Option<PendingWord>,
    open_span: Option<OpenSpan>,
}

impl LayoutBuilder {
    fn new(page: Page) -> Self {
        Self {
            page,
            block: None,
            line: 0,
            last_baseline: None,
            word: None,
            open_span: None,
        }
    }

    fn push(&mut self, event: Event) {
        match event {
            Event::BeginText => {
                self.flush_word();
                self.block = Some(self.block.map_or(0, |b| b + 1));
                self.line = 0;
                self.last_baseline = None;
                self.open_span = None;
            }
            Event::EndText => {
                self.flush_word();
                self.last_baseline = None;
                self.open_span = None;
            }
            Event::Text(shown) => self.push_text(&shown),
            Event::Image { name, rect } => {
                let name = String::from_utf8_lossy(&name).into_owned();
                match self.page.images.iter_mut().find(|img| img.name == name) {
                    Some(image) => image.placements.push(rect),
                    None => self.page.images.push(EmbeddedImage {
                        name,
                        placements: vec![rect],
                    }),
                }
            }
        }
    }

    fn push_text(&mut self, shown: &ShownText) {
        let Some(bbox) = shown.glyphs.iter().map(|g| g.bbox).reduce(|a, b| a.union(&b)) else {
            return;
        };

        let tolerance = (shown.effective_size * LINE_BREAK_RATIO).max(1.0);
        if let Some(previous) = self.last_baseline {
            if (shown.baseline - previous).abs() > tolerance {
                self.flush_word();
                self.line += 1;
            }
        }
        self.last_baseline = Some(shown.baseline);

        let text: String = shown.glyphs.iter().map(|g| g.text.as_str()).collect();
        if self.continues_open_span(shown, &bbox) {
            if let Some(span) = self.page.spans.last_mut() {
                span.text.push_str(&text);
                span.bbox = span.bbox.union(&bbox);
            }
        } else {
            self.page.spans.push(TextSpan {
                text,
                bbox,
                font_size: shown.effective_size,
            });
            self.open_span = Some(OpenSpan {
                font_key: shown.font_key.clone(),
                size: shown.effective_size,
                baseline: shown.baseline,
            });
        }

        let gap = shown.effective_size * WORD_GAP_RATIO;
        for glyph in &shown.glyphs {
            if glyph.is_space() {
                self.flush_word();
                continue;
            }
            let split = self
                .word
                .as_ref()
                .is_some_and(|w| glyph.bbox.x0 - w.bbox.x1 > gap || glyph.bbox.x1 < w.bbox.x0);
            if split {
                self.flush_word();
            }
            match self.word.as_mut() {
                Some(word) => {
                    word.text.push_str(&glyph.text);
                    word.bbox = word.bbox.union(&glyph.bbox);
                }
                None => {
                    self.word = Some(PendingWord {
                        text: glyph.text.clone(),
                        bbox: glyph.bbox,
                    })
                }
            }
        }
    }

    /// Same text object, font, size and baseline, directly right of the last span
    fn continues_open_span(&self, shown: &ShownText, bbox: &Rect) -> bool {
        let (Some(open), Some(last)) = (&self.open_span, self.page.spans.last()) else {
            return false;
        };
        let tolerance = (shown.effective_size * LINE_BREAK_RATIO).max(1.0);
        let gap = bbox.x0 - last.bbox.x1;
        open.font_key == shown.font_key
            && (open.size - shown.effective_size).abs() < 1e-6
            && (open.baseline - shown.baseline).abs() <= tolerance
            && gap >= -tolerance
            && gap <= shown.effective_size * SPAN_JOIN_RATIO
    }

    fn flush_word(&mut self) {
        if let Some(word) = self.word.take() {
            self.page.words.push(Word {
                text: word.text,
                bbox: word.bbox,
                block: self.block.unwrap_or(0),
                line: self.line,
            });
        }
    }

    fn finish(mut self) -> Page {
        self.flush_word();
        self.page
    }
}
