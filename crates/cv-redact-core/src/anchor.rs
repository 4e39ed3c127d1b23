//! Name anchor detection
//!
//! The candidate's name is usually the largest capitalized multi-word run
//! near the top of the page.

use crate::config::RedactionConfig;
use crate::geometry::{Page, Rect};

/// Score a span as a name heading, or `None` if it cannot be one
fn anchor_score(text: &str, font_size: f64, config: &RedactionConfig) -> Option<f64> {
    let text = text.trim();
    let first = text.chars().next()?;
    if text.split_whitespace().count() < config.anchor_min_tokens {
        return None;
    }
    let boost = if first.is_uppercase() {
        config.anchor_capital_boost
    } else {
        1.0
    };
    Some(font_size * boost)
}

/// Find the best-guess name heading on the page
///
/// Ties keep the first span in enumeration order.
pub fn find_name_anchor(page: &Page, config: &RedactionConfig) -> Option<Rect> {
    let max_top = page.height * config.anchor_top_fraction;
    let mut best: Option<(f64, Rect)> = None;

    for span in &page.spans {
        if span.bbox.y0 > max_top {
            continue;
        }
        let Some(score) = anchor_score(&span.text, span.font_size, config) else {
            continue;
        };
        if best.map_or(true, |(best_score, _)| score > best_score) {
            best = Some((score, span.bbox));
        }
    }

    best.map(|(_, rect)| rect)
}
