//! Compilation settings and options
//!
//! [`Settings`] is the typed page/typography/numbering record the editor
//! stores with a project. [`CompileOptions`] controls the compiler itself
//! (math back-ends, figure defaults) and never reaches the document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::utils::error::{CompileError, CompileResult};

// =============================================================================
// Settings
// =============================================================================

/// Paper size of every section in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    A5,
    Letter,
}

impl PaperSize {
    /// Page width and height in centimetres
    pub fn dimensions_cm(self) -> (f64, f64) {
        match self {
            PaperSize::A4 => (21.0, 29.7),
            PaperSize::A5 => (14.8, 21.0),
            PaperSize::Letter => (21.59, 27.94),
        }
    }
}

/// Page, typography and numbering settings of one thesis
///
/// Deserializing this type directly rejects unknown keys; use
/// [`Settings::from_value_lenient`] at boundaries that may carry editor-only
/// keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub paper_size: PaperSize,
    /// Margins in centimetres
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,

    pub font_family: String,
    /// Body font size in points
    pub font_size: f64,
    /// Line spacing multiple (1.5 = one and a half lines)
    pub line_spacing: f64,
    /// First-line indent of body paragraphs in centimetres
    pub indent: f64,

    /// Heading sizes in points; levels 4 and 5 use `font_size`
    pub h1_size: f64,
    pub h2_size: f64,
    pub h3_size: f64,

    /// Chapter prefix text, e.g. "CHƯƠNG"; may be empty
    pub h1_prefix: String,
    pub auto_numbering: bool,
    pub hierarchical_numbering: bool,
    pub h1_uppercase: bool,
    /// Put the chapter number and the chapter title on separate lines
    pub h1_split: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            margin_top: 2.5,
            margin_bottom: 2.5,
            margin_left: 3.5,
            margin_right: 2.0,
            font_family: "Times New Roman".to_string(),
            font_size: 13.0,
            line_spacing: 1.5,
            indent: 1.27,
            h1_size: 16.0,
            h2_size: 14.0,
            h3_size: 13.0,
            h1_prefix: "CHƯƠNG".to_string(),
            auto_numbering: true,
            hierarchical_numbering: true,
            h1_uppercase: true,
            h1_split: false,
        }
    }
}

/// Keys accepted by [`Settings`]
pub const SETTINGS_KEYS: &[&str] = &[
    "paper_size",
    "margin_top",
    "margin_bottom",
    "margin_left",
    "margin_right",
    "font_family",
    "font_size",
    "line_spacing",
    "indent",
    "h1_size",
    "h2_size",
    "h3_size",
    "h1_prefix",
    "auto_numbering",
    "hierarchical_numbering",
    "h1_uppercase",
    "h1_split",
];

impl Settings {
    /// Font size in points of a heading level (1-5)
    pub fn heading_size(&self, level: u8) -> f64 {
        match level {
            1 => self.h1_size,
            2 => self.h2_size,
            3 => self.h3_size,
            _ => self.font_size,
        }
    }

    /// Build settings from a loosely-typed map, dropping unknown keys
    ///
    /// Returns the settings together with the names of the dropped keys.
    pub fn from_value_lenient(value: Value) -> CompileResult<(Self, Vec<String>)> {
        Self::default().overlay(value)
    }

    /// Apply a partial settings map on top of these settings
    ///
    /// Keys missing from `value` keep their current value. Unknown keys are
    /// dropped and reported.
    pub fn overlay(&self, value: Value) -> CompileResult<(Self, Vec<String>)> {
        let Value::Object(incoming) = value else {
            return Err(CompileError::settings("settings must be a key/value map"));
        };

        let mut merged = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let mut dropped = Vec::new();

        for (key, val) in incoming {
            if SETTINGS_KEYS.contains(&key.as_str()) {
                merged.insert(key, val);
            } else {
                dropped.push(key);
            }
        }

        let settings = serde_json::from_value(Value::Object(merged))?;
        Ok((settings, dropped))
    }

    /// Load a settings file (`.json` or `.toml`) on top of these settings
    pub fn overlay_file(&self, path: &Path) -> CompileResult<(Self, Vec<String>)> {
        let text = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let value = if is_toml {
            let table: toml::Value = toml::from_str(&text)?;
            serde_json::to_value(table)?
        } else {
            serde_json::from_str(&text)?
        };
        self.overlay(value)
    }
}

// =============================================================================
// Compile options
// =============================================================================

/// Options controlling the compiler back-ends
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Try native (editable) equations first
    /// Default: true
    pub native_math: bool,

    /// Try the external TeX rasterizer when native conversion fails
    /// Default: true
    pub raster_math: bool,

    /// Resolution used for rasterized equations
    /// Default: 600
    pub raster_dpi: u32,

    /// Rasterized inline equation size relative to the body font
    /// Default: 0.95
    pub inline_math_scale: f64,

    /// Rasterized display equation size relative to the body font
    /// Default: 1.15
    pub display_math_scale: f64,

    /// Figure width when the record does not carry one
    /// Default: 16.0 cm
    pub default_figure_width_cm: f64,

    /// Emit the field-refresh note, table of contents and lists
    /// Default: true
    pub front_matter: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            native_math: true,
            raster_math: true,
            raster_dpi: 600,
            inline_math_scale: 0.95,
            display_math_scale: 1.15,
            default_figure_width_cm: 16.0,
            front_matter: true,
        }
    }
}

impl CompileOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Every equation becomes an image (or a placeholder)
    pub fn images_only() -> Self {
        Self {
            native_math: false,
            ..Self::default()
        }
    }

    /// No external tools are invoked; unsupported equations become placeholders
    pub fn text_only() -> Self {
        Self {
            raster_math: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_match_thesis_template() {
        let s = Settings::default();
        assert_eq!(s.paper_size, PaperSize::A4);
        assert_eq!(s.margin_left, 3.5);
        assert_eq!(s.font_size, 13.0);
        assert_eq!(s.h1_prefix, "CHƯƠNG");
        assert!(s.auto_numbering && s.hierarchical_numbering && s.h1_uppercase);
        assert!(!s.h1_split);
    }

    #[test]
    fn test_heading_size_falls_back_to_body() {
        let s = Settings::default();
        assert_eq!(s.heading_size(1), 16.0);
        assert_eq!(s.heading_size(3), 13.0);
        assert_eq!(s.heading_size(4), s.font_size);
        assert_eq!(s.heading_size(5), s.font_size);
    }

    #[test]
    fn test_strict_deserialize_rejects_unknown() {
        let result: Result<Settings, _> = serde_json::from_value(json!({"text_density": 1.0}));
        assert!(result.is_err());
    }

    #[test]
    fn test_lenient_drops_unknown_keys() {
        let (s, dropped) = Settings::from_value_lenient(json!({
            "font_size": 14,
            "h1_prefix": "CHAPTER",
            "text_density": 1.2,
            "hard_wrap": false
        }))
        .unwrap();
        assert_eq!(s.font_size, 14.0);
        assert_eq!(s.h1_prefix, "CHAPTER");
        assert_eq!(s.margin_top, 2.5);
        assert_eq!(dropped, vec!["hard_wrap".to_string(), "text_density".to_string()]);
    }

    #[test]
    fn test_lenient_rejects_wrong_types() {
        assert!(Settings::from_value_lenient(json!({"font_size": "big"})).is_err());
        assert!(Settings::from_value_lenient(json!([1, 2])).is_err());
    }

    #[test]
    fn test_overlay_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.toml");
        std::fs::write(&path, "paper_size = \"A5\"\nh1_split = true\n").unwrap();

        let base = Settings {
            font_size: 12.0,
            ..Settings::default()
        };
        let (s, dropped) = base.overlay_file(&path).unwrap();
        assert_eq!(s.paper_size, PaperSize::A5);
        assert!(s.h1_split);
        assert_eq!(s.font_size, 12.0);
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_option_presets() {
        assert!(!CompileOptions::images_only().native_math);
        assert!(!CompileOptions::text_only().raster_math);
        assert!(CompileOptions::new().front_matter);
    }
}
