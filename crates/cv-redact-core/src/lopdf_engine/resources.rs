//! Page resource lookup: media box, font metrics and image XObjects

use std::collections::{HashMap, HashSet};

use lopdf::{Dictionary, Document, Object, ObjectId};

use super::cmap::parse_to_unicode;

/// Glyph width used when a font carries no `Widths` array, in 1/1000 em
const DEFAULT_GLYPH_WIDTH: f64 = 500.0;
/// `DW` default for CIDFonts
const DEFAULT_CID_WIDTH: f64 = 1000.0;
/// Upper bound on CIDs covered by one `c_first c_last w` entry
const MAX_CID_RUN: u32 = 0xFFFF;

/// Follow a single indirect reference
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

pub(crate) fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

pub(crate) fn as_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Look up a page attribute, following the `Parent` chain for inherited keys
pub(crate) fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_object(page_id).ok()?.as_dict().ok()?;
    // Page trees are shallow; the bound guards against reference cycles.
    for _ in 0..32 {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").ok()?;
        current = resolve_dict(doc, parent)?;
    }
    None
}

/// Visible page area in user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MediaBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl MediaBox {
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> MediaBox {
    let numbers: Option<Vec<f64>> = inherited(doc, page_id, b"MediaBox")
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| match obj {
            Object::Array(arr) if arr.len() >= 4 => arr.iter().take(4).map(as_number).collect(),
            _ => None,
        });

    match numbers {
        Some(n) => MediaBox {
            x0: n[0].min(n[2]),
            y0: n[1].min(n[3]),
            x1: n[0].max(n[2]),
            y1: n[1].max(n[3]),
        },
        // Default US Letter
        None => MediaBox {
            x0: 0.0,
            y0: 0.0,
            x1: 612.0,
            y1: 792.0,
        },
    }
}

/// Glyph widths and text mapping for one font resource
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FontMetrics {
    /// Widths keyed by character code, in 1/1000 em
    widths: HashMap<u32, f64>,
    missing_width: f64,
    to_unicode: HashMap<u32, String>,
    /// Composite (Type0) fonts use two-byte character codes
    pub two_byte: bool,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            widths: HashMap::new(),
            missing_width: DEFAULT_GLYPH_WIDTH,
            to_unicode: HashMap::new(),
            two_byte: false,
        }
    }
}

impl FontMetrics {
    fn from_dict(doc: &Document, font: &Dictionary) -> Self {
        let two_byte = matches!(font.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Type0");
        let (widths, missing_width) = if two_byte {
            cid_widths(doc, font)
        } else {
            simple_widths(doc, font)
        };
        let to_unicode = font
            .get(b"ToUnicode")
            .ok()
            .and_then(|obj| resolve(doc, obj))
            .and_then(|obj| obj.as_stream().ok())
            .map(|stream| {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                parse_to_unicode(&data)
            })
            .unwrap_or_default();

        Self {
            widths,
            missing_width,
            to_unicode,
            two_byte,
        }
    }

    /// Width of a character code in 1/1000 em
    pub fn width(&self, code: u32) -> f64 {
        self.widths
            .get(&code)
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.missing_width)
    }

    /// Text from the font's `ToUnicode` map, if it has an entry
    pub fn unicode(&self, code: u32) -> Option<&str> {
        self.to_unicode.get(&code).map(String::as_str)
    }

    pub fn code_len(&self) -> usize {
        if self.two_byte {
            2
        } else {
            1
        }
    }
}

fn number_array<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Vec<Object>> {
    resolve(doc, obj)?.as_array().ok()
}

/// `FirstChar` / `Widths` of a simple font
fn simple_widths(doc: &Document, font: &Dictionary) -> (HashMap<u32, f64>, f64) {
    let first_char = font
        .get(b"FirstChar")
        .ok()
        .and_then(as_number)
        .unwrap_or(0.0) as u32;
    let widths = font
        .get(b"Widths")
        .ok()
        .and_then(|obj| number_array(doc, obj))
        .map(|arr| {
            arr.iter()
                .enumerate()
                .map(|(i, w)| {
                    let width = resolve(doc, w).and_then(as_number).unwrap_or(0.0);
                    (first_char + i as u32, width)
                })
                .collect()
        })
        .unwrap_or_default();
    let missing_width = font
        .get(b"FontDescriptor")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
        .and_then(|desc| desc.get(b"MissingWidth").ok())
        .and_then(as_number)
        .filter(|w| *w > 0.0)
        .unwrap_or(DEFAULT_GLYPH_WIDTH);
    (widths, missing_width)
}

/// `DW` / `W` of a Type0 font's descendant CIDFont
fn cid_widths(doc: &Document, font: &Dictionary) -> (HashMap<u32, f64>, f64) {
    let mut widths = HashMap::new();
    let Some(cid_font) = font
        .get(b"DescendantFonts")
        .ok()
        .and_then(|obj| number_array(doc, obj))
        .and_then(|arr| arr.first())
        .and_then(|obj| resolve_dict(doc, obj))
    else {
        return (widths, DEFAULT_CID_WIDTH);
    };

    let default_width = cid_font
        .get(b"DW")
        .ok()
        .and_then(as_number)
        .filter(|w| *w > 0.0)
        .unwrap_or(DEFAULT_CID_WIDTH);

    let entries = cid_font
        .get(b"W")
        .ok()
        .and_then(|obj| number_array(doc, obj))
        .map(Vec::as_slice)
        .unwrap_or_default();

    // Entries are `c [w1 w2 ...]` or `c_first c_last w`
    let mut i = 0;
    while i < entries.len() {
        let Some(first) = resolve(doc, &entries[i]).and_then(as_number) else {
            break;
        };
        let first = first as u32;
        match entries.get(i + 1).and_then(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    if let Some(w) = resolve(doc, w).and_then(as_number) {
                        widths.insert(first + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(w)) = (
                    as_number(last),
                    entries.get(i + 2).and_then(|o| resolve(doc, o)).and_then(as_number),
                ) else {
                    break;
                };
                let last = (last as u32).min(first.saturating_add(MAX_CID_RUN));
                for cid in first..=last {
                    widths.insert(cid, w);
                }
                i += 3;
            }
            None => break,
        }
    }

    (widths, default_width)
}

/// Resources referenced by one page's content stream
#[derive(Debug, Clone, Default)]
pub(crate) struct PageResources {
    fonts: HashMap<Vec<u8>, FontMetrics>,
    images: HashSet<Vec<u8>>,
}

impl PageResources {
    pub fn load(doc: &Document, page_id: ObjectId) -> Self {
        let mut resources = Self::default();
        let Some(dict) = inherited(doc, page_id, b"Resources").and_then(|o| resolve_dict(doc, o))
        else {
            return resources;
        };

        if let Some(fonts) = dict.get(b"Font").ok().and_then(|o| resolve_dict(doc, o)) {
            for (name, font) in fonts.iter() {
                if let Some(font) = resolve_dict(doc, font) {
                    resources
                        .fonts
                        .insert(name.clone(), FontMetrics::from_dict(doc, font));
                }
            }
        }

        if let Some(xobjects) = dict.get(b"XObject").ok().and_then(|o| resolve_dict(doc, o)) {
            for (name, xobject) in xobjects.iter() {
                let is_image = resolve_dict(doc, xobject)
                    .and_then(|d| d.get(b"Subtype").ok())
                    .is_some_and(|s| matches!(s, Object::Name(n) if n == b"Image"));
                if is_image {
                    resources.images.insert(name.clone());
                }
            }
        }

        resources
    }

    pub fn font(&self, name: &[u8]) -> Option<&FontMetrics> {
        self.fonts.get(name)
    }

    pub fn is_image(&self, name: &[u8]) -> bool {
        self.images.contains(name)
    }
}
