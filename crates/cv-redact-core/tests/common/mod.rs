//! Shared fixtures: an in-memory document engine and a small PDF builder

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use cv_redact_core::{
    DocumentEngine, EmbeddedImage, Page, PdfDocument, RedactError, RedactOptions, Rect, Rgb,
    SaveOptions, TextSpan, Word,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

// ============================================================
// Fake engine
// ============================================================

/// Calls observed by a [`FakeDocument`]
#[derive(Debug, Default)]
pub struct CallLog {
    pub marks: Vec<(usize, Rect, Rgb, RedactOptions)>,
    pub applied: usize,
    pub serialized: usize,
    pub closed: usize,
}

#[derive(Clone)]
pub struct FakeEngine {
    pages: Vec<Page>,
    fail_apply: bool,
    pub log: Rc<RefCell<CallLog>>,
}

impl FakeEngine {
    pub fn new(page: Page) -> Self {
        Self::with_pages(vec![page])
    }

    pub fn with_pages(pages: Vec<Page>) -> Self {
        Self {
            pages,
            fail_apply: false,
            log: Rc::new(RefCell::new(CallLog::default())),
        }
    }

    pub fn failing_apply(mut self) -> Self {
        self.fail_apply = true;
        self
    }
}

impl DocumentEngine for FakeEngine {
    type Document = FakeDocument;

    fn open(&self, _bytes: &[u8]) -> Result<FakeDocument, RedactError> {
        Ok(FakeDocument {
            pages: self.pages.clone(),
            fail_apply: self.fail_apply,
            log: Rc::clone(&self.log),
        })
    }
}

pub struct FakeDocument {
    pages: Vec<Page>,
    fail_apply: bool,
    log: Rc<RefCell<CallLog>>,
}

impl PdfDocument for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<Page, RedactError> {
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| RedactError::ProcessingError("no such page".into()))
    }

    fn mark_for_redaction(
        &mut self,
        index: usize,
        rect: Rect,
        fill: Rgb,
        options: RedactOptions,
    ) -> Result<(), RedactError> {
        self.log.borrow_mut().marks.push((index, rect, fill, options));
        Ok(())
    }

    fn apply_redactions(&mut self, _index: usize) -> Result<(), RedactError> {
        if self.fail_apply {
            return Err(RedactError::ProcessingError("engine exploded".into()));
        }
        self.log.borrow_mut().applied += 1;
        Ok(())
    }

    fn serialize(&mut self, _options: SaveOptions) -> Result<Vec<u8>, RedactError> {
        self.log.borrow_mut().serialized += 1;
        Ok(b"%PDF-1.7 redacted".to_vec())
    }

    fn close(&mut self) {
        self.log.borrow_mut().closed += 1;
    }
}

/// Any bytes that pass the header check; the fake engine ignores them
pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n%fake\n";

// ============================================================
// Page fixtures
// ============================================================

pub fn span(text: &str, x0: f64, y0: f64, size: f64) -> TextSpan {
    TextSpan {
        text: text.to_string(),
        bbox: Rect::new(x0, y0, x0 + text.len() as f64 * size * 0.5, y0 + size),
        font_size: size,
    }
}

/// Split a line into words laid out left to right with a 6 unit advance per char
pub fn line_words(text: &str, x0: f64, y0: f64, block: u32, line: u32) -> Vec<Word> {
    let mut x = x0;
    text.split_whitespace()
        .map(|token| {
            let width = token.chars().count() as f64 * 6.0;
            let word = Word {
                text: token.to_string(),
                bbox: Rect::new(x, y0, x + width, y0 + 12.0),
                block,
                line,
            };
            x += width + 3.0;
            word
        })
        .collect()
}

pub fn image(name: &str, placements: Vec<Rect>) -> EmbeddedImage {
    EmbeddedImage {
        name: name.to_string(),
        placements,
    }
}

/// "Jane Doe" heading with one contact line below it on a Letter page
pub fn cv_page(contact: &str) -> Page {
    let mut page = Page::new(612.0, 792.0);
    page.spans.push(span("Jane Doe", 72.0, 56.0, 20.0));
    page.words.extend(line_words("Jane Doe", 72.0, 60.0, 0, 0));
    page.spans.push(span(contact, 72.0, 84.0, 12.0));
    page.words.extend(line_words(contact, 72.0, 84.0, 1, 0));
    page
}

// ============================================================
// Real PDFs
// ============================================================

/// `ToUnicode` for `F2`: code `c + 0x100` reads as `c`
const CID_TO_UNICODE: &[u8] = b"begincmap
1 begincodespacerange <0000> <FFFF> endcodespacerange
1 beginbfrange <0100> <01FF> <0000> endbfrange
endcmap";

pub struct PdfBuilder {
    operations: Vec<Operation>,
    photo: bool,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            photo: false,
        }
    }

    /// Show `text` in Helvetica with its baseline at user-space (x, y)
    pub fn text(mut self, x: i64, y: i64, size: i64, text: &str) -> Self {
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
        self
    }

    /// Show each piece with its own `Tj` inside one text object
    pub fn split_text(mut self, x: i64, y: i64, size: i64, pieces: &[&str]) -> Self {
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
        ]);
        for piece in pieces {
            self.operations
                .push(Operation::new("Tj", vec![Object::string_literal(*piece)]));
        }
        self.operations.push(Operation::new("ET", vec![]));
        self
    }

    /// Show `text` in the Identity-H font as two-byte codes
    pub fn cid_text(mut self, x: i64, y: i64, size: i64, text: &str) -> Self {
        let codes = text
            .chars()
            .flat_map(|c| (c as u16 + 0x100).to_be_bytes())
            .collect();
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F2".into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::String(codes, StringFormat::Hexadecimal)]),
            Operation::new("ET", vec![]),
        ]);
        self
    }

    /// Paint the photo image over the user-space rectangle
    pub fn photo(mut self, x: i64, y: i64, w: i64, h: i64) -> Self {
        self.photo = true;
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), x.into(), y.into()],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ]);
        self
    }

    /// Stroke a horizontal rule from x=72 to x=540
    pub fn rule(mut self, y: i64) -> Self {
        self.operations.extend([
            Operation::new("m", vec![72.into(), y.into()]),
            Operation::new("l", vec![540.into(), y.into()]),
            Operation::new("S", vec![]),
        ]);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let to_unicode_id =
            doc.add_object(Stream::new(Dictionary::new(), CID_TO_UNICODE.to_vec()));
        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "NotoSans",
            "Encoding" => "Identity-H",
            "ToUnicode" => to_unicode_id,
            "DescendantFonts" => vec![Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "CIDFontType2",
                "BaseFont" => "NotoSans",
                "DW" => 600,
            })],
        });

        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id, "F2" => cid_font_id },
        };
        if self.photo {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 1,
                    "Height" => 1,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                },
                vec![200, 150, 120],
            ));
            resources.set("XObject", dictionary! { "Im1" => image_id });
        }

        let content = Content {
            operations: self.operations,
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }
}

/// A PDF with a valid page tree but no pages
pub fn empty_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => Vec::<Object>::new(),
        "Count" => 0,
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
