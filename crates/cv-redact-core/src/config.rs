//! Detection thresholds
//!
//! All heuristic constants live here so deployments can override them from a
//! JSON file without touching the detectors. Missing keys keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RedactError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Name anchor candidates must start within this fraction of page height
    pub anchor_top_fraction: f64,
    /// Minimum whitespace-separated tokens in a name anchor span
    pub anchor_min_tokens: usize,
    /// Score multiplier for spans starting with an uppercase letter
    pub anchor_capital_boost: f64,

    /// Gap between the anchor's bottom edge and the search band
    pub band_offset: f64,
    /// Maximum depth of the search band below the anchor
    pub band_depth: f64,
    /// The band never extends past this fraction of page height
    pub band_max_fraction: f64,
    /// Band used when no anchor was found, as fractions of page height
    pub fallback_band: (f64, f64),

    /// Horizontal padding added around a matched line
    pub line_padding_x: f64,
    /// Vertical padding added around a matched line
    pub line_padding_y: f64,
    /// Maximum number of personal lines redacted per page
    pub max_lines: usize,

    /// Photos must start right of this fraction of page width
    pub photo_min_left_fraction: f64,
    /// Photos must start above this fraction of page height
    pub photo_max_top_fraction: f64,
    pub photo_min_width: f64,
    pub photo_min_height: f64,

    /// Largest fraction of the page the plan may cover
    pub max_coverage: f64,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            anchor_top_fraction: 0.38,
            anchor_min_tokens: 2,
            anchor_capital_boost: 1.15,
            band_offset: 2.0,
            band_depth: 160.0,
            band_max_fraction: 0.45,
            fallback_band: (0.08, 0.33),
            line_padding_x: 10.0,
            line_padding_y: 4.0,
            max_lines: 3,
            photo_min_left_fraction: 0.55,
            photo_max_top_fraction: 0.45,
            photo_min_width: 55.0,
            photo_min_height: 70.0,
            max_coverage: 0.08,
        }
    }
}

impl RedactionConfig {
    /// Load overrides from a JSON file and validate the result
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RedactError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RedactError::InvalidInput(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(json: &str) -> Result<Self, RedactError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RedactError::InvalidInput(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RedactError> {
        let fractions = [
            ("anchor_top_fraction", self.anchor_top_fraction),
            ("band_max_fraction", self.band_max_fraction),
            ("fallback_band.0", self.fallback_band.0),
            ("fallback_band.1", self.fallback_band.1),
            ("photo_min_left_fraction", self.photo_min_left_fraction),
            ("photo_max_top_fraction", self.photo_max_top_fraction),
            ("max_coverage", self.max_coverage),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(RedactError::InvalidInput(format!(
                    "{} must be within 0..=1, got {}",
                    name, value
                )));
            }
        }

        if self.fallback_band.0 >= self.fallback_band.1 {
            return Err(RedactError::InvalidInput(
                "fallback_band start must be above its end".into(),
            ));
        }
        if self.band_depth <= 0.0 || self.anchor_capital_boost <= 0.0 {
            return Err(RedactError::InvalidInput(
                "band_depth and anchor_capital_boost must be positive".into(),
            ));
        }
        if self.line_padding_x < 0.0 || self.line_padding_y < 0.0 {
            return Err(RedactError::InvalidInput(
                "line padding must not be negative".into(),
            ));
        }
        if self.photo_min_width <= 0.0 || self.photo_min_height <= 0.0 {
            return Err(RedactError::InvalidInput(
                "photo minimum size must be positive".into(),
            ));
        }
        if self.max_lines == 0 {
            return Err(RedactError::InvalidInput("max_lines must be at least 1".into()));
        }
        Ok(())
    }
}
