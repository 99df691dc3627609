//! Figure records and placeholder resolution
//!
//! A `[Hình 1.2: caption]` placeholder is matched against the figure records
//! by display number with all whitespace removed, so `Hình 1. 2` and
//! `Hình 1.2` name the same figure. Resolution never aborts compilation:
//! every failure is a [`FigureProblem`] that the assembler turns into a
//! visible placeholder.

use image::{ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

use crate::data::constants::{figure_file_missing, figure_insert_failed, figure_record_missing};
use crate::utils::files::FileResolver;

/// Record identity as the editor stores it: a number, or occasionally a string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl Default for RecordId {
    fn default() -> Self {
        RecordId::Number(0)
    }
}

/// An inserted figure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Figure {
    pub id: RecordId,
    /// Absolute, or relative to the project directory
    pub path: String,
    pub caption: String,
    pub chapter: u32,
    /// Display number, e.g. "Hình 1.2"
    pub number: String,
    /// Target width in centimetres
    pub width: Option<f64>,
    pub url: String,
}

/// Display number with all whitespace removed
pub fn normalize_number(number: &str) -> String {
    number.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Why a placeholder could not become a picture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FigureProblem {
    /// No record carries this number
    MissingRecord { number: String },
    /// The record has no file path
    MissingPath { number: String },
    FileNotFound { path: String },
    /// The file exists but is not a usable image
    Unreadable { number: String, reason: String },
}

impl FigureProblem {
    /// Text shown in the document in place of the picture
    pub fn placeholder(&self) -> String {
        match self {
            FigureProblem::MissingRecord { number } => figure_record_missing(number),
            FigureProblem::MissingPath { number } => figure_file_missing(number),
            FigureProblem::FileNotFound { path } => figure_file_missing(path),
            FigureProblem::Unreadable { number, .. } => figure_insert_failed(number),
        }
    }
}

impl fmt::Display for FigureProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FigureProblem::MissingRecord { number } => {
                write!(f, "no figure record for '{}'", number)
            }
            FigureProblem::MissingPath { number } => {
                write!(f, "figure '{}' has no image path", number)
            }
            FigureProblem::FileNotFound { path } => write!(f, "image file not found: {}", path),
            FigureProblem::Unreadable { number, reason } => {
                write!(f, "figure '{}' could not be inserted: {}", number, reason)
            }
        }
    }
}

/// A figure ready to embed
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFigure {
    pub number: String,
    pub caption: String,
    pub bytes: Vec<u8>,
    /// File extension for the media part
    pub extension: &'static str,
    pub width_cm: f64,
    pub height_cm: f64,
}

impl ResolvedFigure {
    /// "Hình 1.2: caption"
    pub fn caption_text(&self) -> String {
        if self.caption.is_empty() {
            self.number.clone()
        } else {
            format!("{}: {}", self.number, self.caption)
        }
    }
}

fn media_extension(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("png"),
        ImageFormat::Jpeg => Some("jpeg"),
        ImageFormat::Gif => Some("gif"),
        ImageFormat::Bmp => Some("bmp"),
        _ => None,
    }
}

/// Matches placeholders against figure records and loads their images
pub struct FigureResolver<'a> {
    figures: &'a [Figure],
    files: &'a dyn FileResolver,
    default_width_cm: f64,
}

impl<'a> FigureResolver<'a> {
    pub fn new(figures: &'a [Figure], files: &'a dyn FileResolver, default_width_cm: f64) -> Self {
        Self {
            figures,
            files,
            default_width_cm,
        }
    }

    /// First record whose normalized number equals the normalized `number`
    pub fn find(&self, number: &str) -> Option<&'a Figure> {
        let wanted = normalize_number(number);
        self.figures
            .iter()
            .find(|f| normalize_number(&f.number) == wanted)
    }

    /// Resolve a placeholder; `caption` falls back to the record's caption
    pub fn resolve(&self, number: &str, caption: &str) -> Result<ResolvedFigure, FigureProblem> {
        let figure = self
            .find(number)
            .ok_or_else(|| FigureProblem::MissingRecord {
                number: number.to_string(),
            })?;

        let path = figure.path.trim();
        if path.is_empty() {
            return Err(FigureProblem::MissingPath {
                number: number.to_string(),
            });
        }
        let location = self
            .files
            .locate(path)
            .ok_or_else(|| FigureProblem::FileNotFound {
                path: path.to_string(),
            })?;

        let unreadable = |reason: String| FigureProblem::Unreadable {
            number: number.to_string(),
            reason,
        };
        let bytes = self
            .files
            .read_bytes(&location)
            .map_err(|e| unreadable(e.to_string()))?;

        let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| unreadable(e.to_string()))?;
        let extension = reader
            .format()
            .and_then(media_extension)
            .ok_or_else(|| unreadable("unsupported image format".to_string()))?;
        let (px_width, px_height) = reader
            .into_dimensions()
            .map_err(|e| unreadable(e.to_string()))?;
        if px_width == 0 || px_height == 0 {
            return Err(unreadable("image has no pixels".to_string()));
        }

        let width_cm = figure
            .width
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width_cm);
        let height_cm = width_cm * px_height as f64 / px_width as f64;

        let caption = if caption.trim().is_empty() {
            figure.caption.trim().to_string()
        } else {
            caption.trim().to_string()
        };

        Ok(ResolvedFigure {
            number: number.trim().to_string(),
            caption,
            bytes,
            extension,
            width_cm,
            height_cm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::files::MemoryFileResolver;
    use image::{Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn figure(number: &str, path: &str) -> Figure {
        Figure {
            id: RecordId::Number(1),
            path: path.to_string(),
            caption: "Sơ đồ khối".to_string(),
            chapter: 1,
            number: number.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_number() {
        assert_eq!(normalize_number("Hình 1. 2"), "Hình1.2");
        assert_eq!(normalize_number(" Hình\t1.2 "), "Hình1.2");
    }

    #[test]
    fn test_whitespace_insensitive_match() {
        let figures = vec![figure("Hình 1.2", "a.png")];
        let mut files = MemoryFileResolver::new();
        files.add_file("a.png", png(40, 20));
        let resolver = FigureResolver::new(&figures, &files, 16.0);

        let resolved = resolver.resolve("Hình 1. 2", "x").unwrap();
        assert_eq!(resolved.caption_text(), "Hình 1. 2: x");
        assert_eq!(resolved.extension, "png");
        assert_eq!(resolved.width_cm, 16.0);
        assert!((resolved.height_cm - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_record_width_and_caption_fallback() {
        let mut fig = figure("Hình 2.1", "b.png");
        fig.width = Some(10.0);
        let figures = vec![fig];
        let mut files = MemoryFileResolver::new();
        files.add_file("b.png", png(10, 30));
        let resolver = FigureResolver::new(&figures, &files, 16.0);

        let resolved = resolver.resolve("Hình 2.1", "").unwrap();
        assert_eq!(resolved.caption, "Sơ đồ khối");
        assert_eq!(resolved.width_cm, 10.0);
        assert!((resolved.height_cm - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_problems() {
        let figures = vec![
            figure("Hình 1.1", "missing.png"),
            figure("Hình 1.2", ""),
            figure("Hình 1.3", "broken.png"),
        ];
        let mut files = MemoryFileResolver::new();
        files.add_file("broken.png", b"not an image".to_vec());
        let resolver = FigureResolver::new(&figures, &files, 16.0);

        let err = resolver.resolve("Hình 9.9", "").unwrap_err();
        assert_eq!(
            err.placeholder(),
            "[Hình ảnh không tìm thấy dữ liệu: Hình 9.9]"
        );

        let err = resolver.resolve("Hình 1.1", "").unwrap_err();
        assert_eq!(
            err,
            FigureProblem::FileNotFound {
                path: "missing.png".into()
            }
        );
        assert_eq!(err.placeholder(), "[Hình ảnh không tìm thấy: missing.png]");

        assert!(matches!(
            resolver.resolve("Hình 1.2", ""),
            Err(FigureProblem::MissingPath { .. })
        ));

        let err = resolver.resolve("Hình 1.3", "").unwrap_err();
        assert_eq!(err.placeholder(), "[Lỗi chèn hình: Hình 1.3]");
    }

    #[test]
    fn test_record_deserializes_with_defaults() {
        let fig: Figure =
            serde_json::from_str(r#"{"id": 3, "path": "x.png", "number": "Hình 1.1"}"#).unwrap();
        assert_eq!(fig.id, RecordId::Number(3));
        assert_eq!(fig.width, None);
        let fig: Figure = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(fig.id, RecordId::Text("abc".into()));
    }
}
