//! Page geometry model
//!
//! Value types handed from the document engine to the detectors. All
//! coordinates are page-space units with the origin at the top-left corner
//! and y growing downward, so `y0` is the top edge of a rectangle.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle, always normalized so that `x0 <= x1` and `y0 <= y1`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Grow by `dx` on the left and right and `dy` on the top and bottom
    pub fn expand(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x0 - dx, self.y0 - dy, self.x1 + dx, self.y1 + dy)
    }

    /// True when the interiors overlap (touching edges do not count)
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Integer key used to collapse placements that resolve to the same geometry
    pub fn rounded_key(&self) -> (i64, i64, i64, i64) {
        (
            self.x0.round() as i64,
            self.y0.round() as i64,
            self.x1.round() as i64,
            self.y1.round() as i64,
        )
    }
}

/// A run of text with a single font size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub bbox: Rect,
    pub font_size: f64,
}

/// Smallest extracted text unit, tagged with its visual line grouping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub bbox: Rect,
    pub block: u32,
    pub line: u32,
}

impl Word {
    pub fn line_key(&self) -> (u32, u32) {
        (self.block, self.line)
    }
}

/// Bounding rectangle of one placement of an embedded raster image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageRegion {
    pub bbox: Rect,
}

/// An image resource together with every place it is drawn on the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    pub name: String,
    pub placements: Vec<Rect>,
}

/// Snapshot of one page's layout as reported by the document engine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    pub spans: Vec<TextSpan>,
    pub words: Vec<Word>,
    pub images: Vec<EmbeddedImage>,
}

impl Page {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Every image placement on the page, in enumeration order
    pub fn image_regions(&self) -> impl Iterator<Item = ImageRegion> + '_ {
        self.images
            .iter()
            .flat_map(|img| img.placements.iter().map(|&bbox| ImageRegion { bbox }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_corners() {
        let r = Rect::new(10.0, 40.0, 5.0, 20.0);
        assert_eq!(r, Rect::new(5.0, 20.0, 10.0, 40.0));
        assert_eq!(r.width(), 5.0);
        assert_eq!(r.height(), 20.0);
        assert_eq!(r.area(), 100.0);
    }

    #[test]
    fn test_union_and_expand() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 30.0, 8.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 30.0, 10.0));
        assert_eq!(a.expand(10.0, 4.0), Rect::new(-10.0, -4.0, 20.0, 14.0));
    }

    #[test]
    fn test_intersects_ignores_touching_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!a.intersects(&Rect::new(10.0, 0.0, 20.0, 10.0)));
        assert!(!a.intersects(&Rect::new(0.0, 11.0, 10.0, 20.0)));
    }

    #[test]
    fn test_rounded_key() {
        let r = Rect::new(99.6, 10.4, 180.5, 100.49);
        assert_eq!(r.rounded_key(), (100, 10, 181, 100));
    }

    #[test]
    fn test_image_regions_flatten_placements() {
        let mut page = Page::new(600.0, 800.0);
        page.images.push(EmbeddedImage {
            name: "Im1".into(),
            placements: vec![Rect::new(0.0, 0.0, 1.0, 1.0), Rect::new(2.0, 2.0, 3.0, 3.0)],
        });
        page.images.push(EmbeddedImage {
            name: "Im2".into(),
            placements: vec![Rect::new(4.0, 4.0, 5.0, 5.0)],
        });
        assert_eq!(page.image_regions().count(), 3);
    }
}
