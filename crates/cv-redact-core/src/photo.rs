//! Profile photo detection
//!
//! Profile photos sit in the upper-right area of a CV and are larger than
//! icons or logos.

use std::collections::HashSet;

use crate::config::RedactionConfig;
use crate::geometry::{ImageRegion, Page};

fn is_photo_candidate(region: &ImageRegion, page: &Page, config: &RedactionConfig) -> bool {
    let r = &region.bbox;
    if r.x0 < page.width * config.photo_min_left_fraction {
        return false;
    }
    if r.y0 > page.height * config.photo_max_top_fraction {
        return false;
    }
    r.width() >= config.photo_min_width && r.height() >= config.photo_min_height
}

/// Image placements that look like a profile photo
///
/// Placements that round to the same integer geometry are reported once.
pub fn detect_photo_regions(page: &Page, config: &RedactionConfig) -> Vec<ImageRegion> {
    let mut seen = HashSet::new();
    page.image_regions()
        .filter(|region| is_photo_candidate(region, page, config))
        .filter(|region| seen.insert(region.bbox.rounded_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{EmbeddedImage, Rect};

    fn page_with(placements: Vec<Rect>) -> Page {
        Page {
            images: vec![EmbeddedImage {
                name: "Im0".into(),
                placements,
            }],
            ..Page::new(600.0, 800.0)
        }
    }

    #[test]
    fn test_top_right_photo_is_detected() {
        let page = page_with(vec![Rect::new(450.0, 40.0, 530.0, 130.0)]);
        let photos = detect_photo_regions(&page, &RedactionConfig::default());
        assert_eq!(photos.len(), 1);
    }

    #[test]
    fn test_left_side_image_is_ignored() {
        // 0.55 * 600 = 330
        let page = page_with(vec![Rect::new(300.0, 40.0, 400.0, 140.0)]);
        assert!(detect_photo_regions(&page, &RedactionConfig::default()).is_empty());
    }

    #[test]
    fn test_low_image_is_ignored() {
        // 0.45 * 800 = 360
        let page = page_with(vec![Rect::new(450.0, 370.0, 530.0, 460.0)]);
        assert!(detect_photo_regions(&page, &RedactionConfig::default()).is_empty());
    }

    #[test]
    fn test_small_icons_are_ignored() {
        let page = page_with(vec![
            Rect::new(450.0, 40.0, 500.0, 130.0),
            Rect::new(450.0, 40.0, 530.0, 100.0),
        ]);
        assert!(detect_photo_regions(&page, &RedactionConfig::default()).is_empty());
    }

    #[test]
    fn test_duplicate_placements_collapse() {
        let page = page_with(vec![
            Rect::new(450.0, 40.0, 530.0, 130.0),
            Rect::new(450.2, 39.9, 530.1, 130.4),
        ]);
        let photos = detect_photo_regions(&page, &RedactionConfig::default());
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].bbox, Rect::new(450.0, 40.0, 530.0, 130.0));
    }

    #[test]
    fn test_duplicates_across_image_resources_collapse() {
        let rect = Rect::new(450.0, 40.0, 530.0, 130.0);
        let page = Page {
            images: vec![
                EmbeddedImage {
                    name: "Im0".into(),
                    placements: vec![rect],
                },
                EmbeddedImage {
                    name: "Im1".into(),
                    placements: vec![rect],
                },
            ],
            ..Page::new(600.0, 800.0)
        };
        assert_eq!(detect_photo_regions(&page, &RedactionConfig::default()).len(), 1);
    }
}
