//! Personal-information line classification
//!
//! Words below the name anchor are regrouped into visual lines and each line
//! is tested against fixed contact-detail patterns. Email, phone and site
//! matches are strong evidence; an address keyword alone is weak.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::config::RedactionConfig;
use crate::geometry::{Page, Rect, Word};

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap();

    static ref PHONE_PATTERN: Regex = Regex::new(r"\+?\d[\d\s().-]{7,}").unwrap();

    static ref SITE_PATTERN: Regex =
        Regex::new(r"(?i)(linkedin|github|www\.|\.com\b|\.co\.uk\b)").unwrap();

    static ref ADDRESS_PATTERN: Regex = Regex::new(
        r"(?i)\b(street|strasse|road|avenue|ave|square|blvd|boulevard|london|munich|berlin|paris|madrid|germany|uk|united kingdom)\b"
    )
    .unwrap();

    static ref HAS_NUMBER: Regex = Regex::new(r"\d").unwrap();
}

/// Which contact-detail signals a line carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineSignals {
    pub email: bool,
    pub phone: bool,
    pub site: bool,
    pub address: bool,
}

impl LineSignals {
    pub fn matched(&self) -> bool {
        self.strong() || self.address
    }

    /// Email, phone or site; an address keyword alone never counts
    pub fn strong(&self) -> bool {
        self.email || self.phone || self.site
    }
}

/// Test a reconstructed line against the contact-detail patterns
pub fn classify_line(text: &str) -> LineSignals {
    let line = text.trim();
    if line.is_empty() {
        return LineSignals::default();
    }
    LineSignals {
        email: EMAIL_PATTERN.is_match(line),
        phone: PHONE_PATTERN.is_match(line),
        site: SITE_PATTERN.is_match(line),
        address: ADDRESS_PATTERN.is_match(line) && HAS_NUMBER.is_match(line),
    }
}

/// A visual line that matched at least one signal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalLine {
    pub text: String,
    pub rect: Rect,
    pub signals: LineSignals,
}

impl PersonalLine {
    pub fn strong(&self) -> bool {
        self.signals.strong()
    }
}

/// Matched lines in reading order, capped at `max_lines`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonalLines {
    pub lines: Vec<PersonalLine>,
    pub strong_count: usize,
}

impl PersonalLines {
    pub fn rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.lines.iter().map(|l| l.rect)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Vertical range (top, bottom) in which contact lines are searched
pub fn search_band(page: &Page, anchor: Option<&Rect>, config: &RedactionConfig) -> (f64, f64) {
    match anchor {
        Some(anchor) => (
            anchor.y1 + config.band_offset,
            (anchor.y1 + config.band_depth).min(page.height * config.band_max_fraction),
        ),
        None => (
            page.height * config.fallback_band.0,
            page.height * config.fallback_band.1,
        ),
    }
}

/// Group in-band words by their (block, line) pair, ordered left to right
fn group_lines<'a>(words: &'a [Word], top: f64, bottom: f64) -> BTreeMap<(u32, u32), Vec<&'a Word>> {
    let mut grouped: BTreeMap<(u32, u32), Vec<&Word>> = BTreeMap::new();
    for word in words {
        if word.bbox.y0 < top || word.bbox.y1 > bottom {
            continue;
        }
        grouped.entry(word.line_key()).or_default().push(word);
    }
    for parts in grouped.values_mut() {
        parts.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
    }
    grouped
}

/// Find contact-detail lines under the name anchor
pub fn detect_personal_lines(
    page: &Page,
    anchor: Option<&Rect>,
    config: &RedactionConfig,
) -> PersonalLines {
    let (top, bottom) = search_band(page, anchor, config);
    let grouped = group_lines(&page.words, top, bottom);

    let mut matched: Vec<PersonalLine> = Vec::new();
    for parts in grouped.values() {
        let text = parts
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let signals = classify_line(&text);
        if !signals.matched() {
            continue;
        }

        let Some(bounds) = parts
            .iter()
            .map(|w| w.bbox)
            .reduce(|acc, r| acc.union(&r))
        else {
            continue;
        };

        matched.push(PersonalLine {
            text: text.trim().to_string(),
            rect: bounds.expand(config.line_padding_x, config.line_padding_y),
            signals,
        });
    }

    matched.sort_by(|a, b| {
        a.rect
            .y0
            .total_cmp(&b.rect.y0)
            .then(a.rect.x0.total_cmp(&b.rect.x0))
    });
    matched.truncate(config.max_lines);

    let strong_count = matched.iter().filter(|l| l.strong()).count();
    PersonalLines {
        lines: matched,
        strong_count,
    }
}
