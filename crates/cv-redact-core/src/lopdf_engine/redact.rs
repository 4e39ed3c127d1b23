//! Content stream rewriting for redaction
//!
//! Glyphs under a mark are replaced by an equal `TJ` displacement so text
//! after them keeps its position. Image `Do` operators touching a mark are
//! dropped. Path operators pass through untouched.

use std::collections::HashSet;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::interpreter::{Event, Interpreter, PageSpace, ShowItem, ShownText};
use super::resources::{inherited, media_box, resolve_dict, PageResources};
use crate::engine::{RedactOptions, Rgb};
use crate::error::RedactError;
use crate::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Mark {
    pub rect: Rect,
    pub fill: Rgb,
    pub options: RedactOptions,
}

impl Mark {
    /// A glyph is removed when its center falls inside the mark
    fn covers_glyph(&self, glyph: &Rect) -> bool {
        if !self.options.strip_text {
            return false;
        }
        let cx = (glyph.x0 + glyph.x1) / 2.0;
        let cy = (glyph.y0 + glyph.y1) / 2.0;
        cx >= self.rect.x0 && cx <= self.rect.x1 && cy >= self.rect.y0 && cy <= self.rect.y1
    }

    fn covers_image(&self, image: &Rect) -> bool {
        self.options.strip_images && self.rect.intersects(image)
    }
}

/// Rewrite the page content with every mark applied
pub(crate) fn apply_marks(
    doc: &mut Document,
    page_id: ObjectId,
    marks: &[Mark],
) -> Result<(), RedactError> {
    if marks.is_empty() {
        return Ok(());
    }

    let space = PageSpace::new(media_box(doc, page_id));
    let resources = PageResources::load(doc, page_id);
    let content = doc.get_page_content(page_id)?;
    let operations = Content::decode(&content)?.operations;

    let mut interpreter = Interpreter::new(&resources, space);
    let mut rewritten = Vec::with_capacity(operations.len() + 5 * marks.len() + 2);
    let mut used_images: HashSet<Vec<u8>> = HashSet::new();

    rewritten.push(Operation::new("q", vec![]));
    for op in operations {
        match interpreter.step(&op) {
            Some(Event::Text(shown)) => {
                let hit: Vec<bool> = shown
                    .glyphs
                    .iter()
                    .map(|g| marks.iter().any(|m| m.covers_glyph(&g.bbox)))
                    .collect();
                if hit.contains(&true) {
                    rewritten.extend(strip_glyphs(&op, &shown, &hit));
                } else {
                    rewritten.push(op);
                }
            }
            Some(Event::Image { name, rect }) => {
                if !marks.iter().any(|m| m.covers_image(&rect)) {
                    used_images.insert(name);
                    rewritten.push(op);
                }
            }
            _ => rewritten.push(op),
        }
    }
    rewritten.push(Operation::new("Q", vec![]));

    for mark in marks {
        let (x, y, w, h) = space.rect_to_user(&mark.rect);
        let Rgb(r, g, b) = mark.fill;
        rewritten.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
            Operation::new("re", vec![real(x), real(y), real(w), real(h)]),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    let encoded = Content {
        operations: rewritten,
    }
    .encode()?;
    replace_contents(doc, page_id, encoded)?;
    let images = image_names(doc, page_id, &resources);
    drop_unused_images(doc, page_id, &images, &used_images)
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

/// Replacement operators for a text-show with some glyphs removed
fn strip_glyphs(op: &Operation, shown: &ShownText, hit: &[bool]) -> Vec<Operation> {
    let mut prefix = Vec::new();
    match op.operator.as_str() {
        "'" => prefix.push(Operation::new("T*", vec![])),
        "\"" => {
            prefix.push(Operation::new("Tw", vec![op.operands[0].clone()]));
            prefix.push(Operation::new("Tc", vec![op.operands[1].clone()]));
            prefix.push(Operation::new("T*", vec![]));
        }
        _ => {}
    }

    let mut array = Vec::new();
    let mut glyphs = shown.glyphs.iter().zip(hit).peekable();
    for (index, item) in shown.items.iter().enumerate() {
        match item {
            ShowItem::Adjust(n) => array.push(real(*n)),
            ShowItem::Text(_, format) => {
                let mut kept: Vec<u8> = Vec::new();
                while let Some((glyph, removed)) = glyphs.next_if(|(g, _)| g.item == index) {
                    if !*removed {
                        kept.extend_from_slice(&glyph.code);
                        continue;
                    }
                    if !kept.is_empty() {
                        array.push(Object::String(std::mem::take(&mut kept), format.clone()));
                    }
                    if shown.font_size != 0.0 {
                        array.push(real(-glyph.advance * 1000.0 / shown.font_size));
                    }
                }
                if !kept.is_empty() {
                    array.push(Object::String(kept, format.clone()));
                }
            }
        }
    }

    prefix.push(Operation::new("TJ", vec![Object::Array(array)]));
    prefix
}

fn replace_contents(doc: &mut Document, page_id: ObjectId, content: Vec<u8>) -> Result<(), RedactError> {
    let stream_id = doc.add_object(Stream::new(Dictionary::new(), content));
    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Contents", Object::Reference(stream_id));
    Ok(())
}

fn image_names(doc: &Document, page_id: ObjectId, resources: &PageResources) -> Vec<Vec<u8>> {
    inherited(doc, page_id, b"Resources")
        .and_then(|o| resolve_dict(doc, o))
        .and_then(|d| d.get(b"XObject").ok())
        .and_then(|o| resolve_dict(doc, o))
        .map(|xobjects| {
            xobjects
                .iter()
                .map(|(name, _)| name.clone())
                .filter(|name| resources.is_image(name))
                .collect()
        })
        .unwrap_or_default()
}

/// Detach image XObjects the rewritten page no longer paints
///
/// The page gets its own copy of the resource dictionaries so pages sharing
/// inherited resources are unaffected. Orphaned image streams are removed
/// when the document is saved with garbage collection.
fn drop_unused_images(
    doc: &mut Document,
    page_id: ObjectId,
    images: &[Vec<u8>],
    used: &HashSet<Vec<u8>>,
) -> Result<(), RedactError> {
    let unused: Vec<&Vec<u8>> = images.iter().filter(|n| !used.contains(*n)).collect();
    if unused.is_empty() {
        return Ok(());
    }

    let Some(mut resources) = inherited(doc, page_id, b"Resources")
        .and_then(|o| resolve_dict(doc, o))
        .cloned()
    else {
        return Ok(());
    };
    let Some(mut xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|o| resolve_dict(doc, o))
        .cloned()
    else {
        return Ok(());
    };

    for name in unused {
        xobjects.remove(name);
    }
    resources.set("XObject", Object::Dictionary(xobjects));

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}
