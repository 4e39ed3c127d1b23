//! Content stream interpreter
//!
//! Tracks just enough graphics and text state to place every glyph and image
//! on the page. Layout extraction and redaction both drive the same
//! interpreter, so the boxes a redaction tests against are exactly the boxes
//! the detectors saw.
//!
//! | Operator          | Action                                   |
//! |-------------------|------------------------------------------|
//! | `q` `Q` `cm`      | Save / restore / concatenate the CTM     |
//! | `BT` `ET`         | Begin / end a text object                |
//! | `Tf`              | Select font and size                     |
//! | `Tm` `Td` `TD` `T*` | Position the text matrix               |
//! | `TL` `Tc` `Tw` `Tz` `Ts` | Text state parameters             |
//! | `Tj` `TJ` `'` `"` | Show text                                |
//! | `Do`              | Paint an XObject (images only)           |

use lopdf::content::Operation;
use lopdf::{Object, StringFormat};

use super::resources::{as_number, FontMetrics, MediaBox, PageResources};
use crate::geometry::Rect;

/// Glyph box extent above and below the baseline, in em
const ASCENT: f64 = 0.8;
const DESCENT: f64 = 0.2;

/// Affine matrix `[a b c d e f]` in PDF row-vector convention
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix([f64; 6]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn translate(tx: f64, ty: f64) -> Matrix {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        if operands.len() < 6 {
            return None;
        }
        let mut m = [0.0; 6];
        for (slot, obj) in m.iter_mut().zip(operands) {
            *slot = as_number(obj)?;
        }
        Some(Matrix(m))
    }

    /// `self` applied first, then `other`
    pub fn then(&self, other: &Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// Length of the transformed unit y vector
    fn vertical_scale(&self) -> f64 {
        let [_, _, c, d, _, _] = self.0;
        (c * c + d * d).sqrt()
    }

    /// Bounding box of a transformed rectangle, still in user space
    fn bounds(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> (f64, f64, f64, f64) {
        let corners = [
            self.apply(x0, y0),
            self.apply(x1, y0),
            self.apply(x0, y1),
            self.apply(x1, y1),
        ];
        corners.iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(lx, ly, hx, hy), &(x, y)| (lx.min(x), ly.min(y), hx.max(x), hy.max(y)),
        )
    }
}

/// Maps PDF user space (origin bottom-left) to page space (origin top-left)
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageSpace {
    media: MediaBox,
}

impl PageSpace {
    pub fn new(media: MediaBox) -> Self {
        Self { media }
    }

    pub fn rect_from_user(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
        Rect::new(
            x0 - self.media.x0,
            self.media.y1 - y0,
            x1 - self.media.x0,
            self.media.y1 - y1,
        )
    }

    pub fn y_from_user(&self, y: f64) -> f64 {
        self.media.y1 - y
    }

    /// `(x, y, width, height)` of a page-space rectangle in user space
    pub fn rect_to_user(&self, rect: &Rect) -> (f64, f64, f64, f64) {
        (
            rect.x0 + self.media.x0,
            self.media.y1 - rect.y1,
            rect.width(),
            rect.height(),
        )
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font_key: Vec<u8>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horiz_scale: f64,
    leading: f64,
    rise: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            font_key: Vec::new(),
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horiz_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// One element of a text-show operand
#[derive(Debug, Clone)]
pub(crate) enum ShowItem {
    Text(Vec<u8>, StringFormat),
    /// `TJ` displacement in thousandths of text space
    Adjust(f64),
}

#[derive(Debug, Clone)]
pub(crate) struct PlacedGlyph {
    /// Index of the [`ShowItem::Text`] this glyph came from
    pub item: usize,
    pub code: Vec<u8>,
    pub text: String,
    pub bbox: Rect,
    /// Horizontal advance before scaling: `w0 * Tfs + Tc + Tw`
    pub advance: f64,
}

impl PlacedGlyph {
    pub fn is_space(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ShownText {
    pub items: Vec<ShowItem>,
    pub glyphs: Vec<PlacedGlyph>,
    /// Resource name of the active font
    pub font_key: Vec<u8>,
    /// Size operand of the active `Tf`
    pub font_size: f64,
    /// Rendered size after the text and graphics matrices
    pub effective_size: f64,
    /// Page-space y of the baseline where showing started
    pub baseline: f64,
}

#[derive(Debug, Clone)]
pub(crate) enum Event {
    BeginText,
    EndText,
    Text(ShownText),
    Image { name: Vec<u8>, rect: Rect },
}

pub(crate) struct Interpreter<'a> {
    resources: &'a PageResources,
    space: PageSpace,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
}

impl<'a> Interpreter<'a> {
    pub fn new(resources: &'a PageResources, space: PageSpace) -> Self {
        Self {
            resources,
            space,
            state: GraphicsState::default(),
            stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
        }
    }

    /// Update state for one operator, reporting anything placed on the page
    pub fn step(&mut self, op: &Operation) -> Option<Event> {
        let operands = op.operands.as_slice();
        let number = |i: usize| operands.get(i).and_then(as_number);

        match op.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.state.ctm = m.then(&self.state.ctm);
                }
            }
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
                return Some(Event::BeginText);
            }
            "ET" => return Some(Event::EndText),
            "Tf" => {
                if let Some(Object::Name(key)) = operands.first() {
                    self.state.font_key = key.clone();
                }
                if let Some(size) = number(1) {
                    self.state.font_size = size;
                }
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (number(0), number(1)) {
                    self.next_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (number(0), number(1)) {
                    self.state.leading = -ty;
                    self.next_line(tx, ty);
                }
            }
            "T*" => self.next_line(0.0, -self.state.leading),
            "TL" => {
                if let Some(v) = number(0) {
                    self.state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = number(0) {
                    self.state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = number(0) {
                    self.state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = number(0) {
                    self.state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = number(0) {
                    self.state.rise = v;
                }
            }
            "Tj" | "TJ" => {
                return operands
                    .first()
                    .map(|o| Event::Text(self.show(show_items(o))));
            }
            "'" => {
                self.next_line(0.0, -self.state.leading);
                return operands
                    .first()
                    .map(|o| Event::Text(self.show(show_items(o))));
            }
            "\"" => {
                if operands.len() < 3 {
                    return None;
                }
                if let Some(aw) = number(0) {
                    self.state.word_spacing = aw;
                }
                if let Some(ac) = number(1) {
                    self.state.char_spacing = ac;
                }
                self.next_line(0.0, -self.state.leading);
                return Some(Event::Text(self.show(show_items(&operands[2]))));
            }
            "Do" => {
                if let Some(Object::Name(name)) = operands.first() {
                    if self.resources.is_image(name) {
                        let (x0, y0, x1, y1) = self.state.ctm.bounds(0.0, 0.0, 1.0, 1.0);
                        return Some(Event::Image {
                            name: name.clone(),
                            rect: self.space.rect_from_user(x0, y0, x1, y1),
                        });
                    }
                }
            }
            _ => {}
        }
        None
    }

    fn next_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translate(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// Text space to user space for the current glyph position
    fn rendering_matrix(&self) -> Matrix {
        let s = &self.state;
        Matrix([
            s.font_size * s.horiz_scale,
            0.0,
            0.0,
            s.font_size,
            0.0,
            s.rise,
        ])
        .then(&self.text_matrix)
        .then(&s.ctm)
    }

    fn show(&mut self, items: Vec<ShowItem>) -> ShownText {
        let metrics = self
            .resources
            .font(&self.state.font_key)
            .cloned()
            .unwrap_or_default();

        let start = self.text_matrix.then(&self.state.ctm);
        let (_, baseline_user) = start.apply(0.0, self.state.rise);
        let baseline = self.space.y_from_user(baseline_user);
        let effective_size = self.state.font_size.abs() * start.vertical_scale();

        let mut glyphs = Vec::new();
        for (index, item) in items.iter().enumerate() {
            match item {
                ShowItem::Text(bytes, _) => {
                    for code in bytes.chunks(metrics.code_len()) {
                        glyphs.push(self.place_glyph(index, code, &metrics));
                    }
                }
                ShowItem::Adjust(n) => {
                    let tx = -n / 1000.0 * self.state.font_size * self.state.horiz_scale;
                    self.text_matrix = Matrix::translate(tx, 0.0).then(&self.text_matrix);
                }
            }
        }

        ShownText {
            items,
            glyphs,
            font_key: self.state.font_key.clone(),
            font_size: self.state.font_size,
            effective_size,
            baseline,
        }
    }

    fn place_glyph(&mut self, item: usize, code: &[u8], metrics: &FontMetrics) -> PlacedGlyph {
        let value = code.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);
        let w0 = metrics.width(value) / 1000.0;

        let (x0, y0, x1, y1) = self.rendering_matrix().bounds(0.0, -DESCENT, w0, ASCENT);
        let bbox = self.space.rect_from_user(x0, y0, x1, y1);

        let s = &self.state;
        let word_spacing = if code == [b' '] { s.word_spacing } else { 0.0 };
        let advance = w0 * s.font_size + s.char_spacing + word_spacing;
        self.text_matrix = Matrix::translate(advance * s.horiz_scale, 0.0).then(&self.text_matrix);

        PlacedGlyph {
            item,
            code: code.to_vec(),
            text: decode_code(value, metrics),
            bbox,
            advance,
        }
    }
}

fn show_items(operand: &Object) -> Vec<ShowItem> {
    match operand {
        Object::String(bytes, format) => vec![ShowItem::Text(bytes.clone(), format.clone())],
        Object::Array(arr) => arr
            .iter()
            .filter_map(|item| match item {
                Object::String(bytes, format) => Some(ShowItem::Text(bytes.clone(), format.clone())),
                other => as_number(other).map(ShowItem::Adjust),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Best-effort Unicode for a character code
///
/// The font's `ToUnicode` map wins; otherwise simple fonts are read as
/// Latin-1 and two-byte codes as UCS-2.
fn decode_code(value: u32, metrics: &FontMetrics) -> String {
    if let Some(text) = metrics.unicode(value) {
        if !text.is_empty() && !text.chars().all(char::is_control) {
            return text.to_string();
        }
        return " ".to_string();
    }

    let ch = if metrics.two_byte {
        char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER)
    } else {
        char::from_u32(value).unwrap_or(' ')
    };
    if ch.is_control() {
        " ".to_string()
    } else {
        ch.to_string()
    }
}
