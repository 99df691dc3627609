//! Equation images through `latex` and `dvipng`
//!
//! Used when native conversion fails. The image keeps its baseline depth so
//! inline equations can be lowered to sit on the text baseline.

use image::{GenericImageView, ImageFormat};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::process::Command;

use super::{MathFailure, MathRasterizer};

lazy_static! {
    static ref STYLE_DIRECTIVE: Regex =
        Regex::new(r"\\(?:displaystyle|textstyle|scriptstyle)\b\s*").unwrap();
    static ref SHORT_RELATION: Regex = Regex::new(r"\\(ge|le|ne)\b").unwrap();
    static ref TEXT_COMMAND: Regex = Regex::new(r"\\text\{").unwrap();
    static ref BRACE_COMMAND: Regex = Regex::new(r"\\(l|r)brace\b").unwrap();
    static ref DVIPNG_DEPTH: Regex = Regex::new(r"depth=(-?\d+)").unwrap();

    /// Whether both external tools were found on PATH
    static ref TOOLS_AVAILABLE: bool = find_program("latex") && find_program("dvipng");
}

/// Constructs that either fail outright or render wrongly as an image
const UNSUPPORTED_CONSTRUCTS: &[&str] = &[
    "\\begin",
    "\\\\",
    "\\xrightarrow",
    "\\xleftarrow",
    "\\overbrace",
    "\\underbrace",
    "\\substack",
];

/// A rendered equation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// PNG bytes, cropped to the ink
    pub png: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
    /// Pixels below the baseline
    pub descent_px: u32,
    pub dpi: u32,
}

impl RasterImage {
    /// Width, height and descent in points, scaled to the body font
    ///
    /// The image is rendered at 10pt, so it is scaled by `font_size / 10`
    /// and then by the inline or display factor.
    pub fn scaled_size_pt(&self, font_size_pt: f64, factor: f64) -> (f64, f64, f64) {
        let scale = font_size_pt / 10.0 * factor;
        let dpi = self.dpi.max(1) as f64;
        let to_pt = |px: u32| px as f64 * 72.0 / dpi * scale;
        (
            to_pt(self.width_px),
            to_pt(self.height_px),
            to_pt(self.descent_px),
        )
    }
}

/// First construct in `expr` that rasterization cannot handle
pub fn find_unsupported_construct(expr: &str) -> Option<&'static str> {
    UNSUPPORTED_CONSTRUCTS
        .iter()
        .copied()
        .find(|construct| expr.contains(construct))
}

/// Rewrite shorthands the rasterizer's macro set does not know
pub fn normalize_for_raster(expr: &str) -> String {
    let out = STYLE_DIRECTIVE.replace_all(expr, "");
    let out = SHORT_RELATION.replace_all(&out, "\\${1}q");
    let out = TEXT_COMMAND.replace_all(&out, "\\mathrm{");
    let out = BRACE_COMMAND.replace_all(&out, |caps: &regex::Captures| {
        if &caps[1] == "l" {
            "\\{".to_string()
        } else {
            "\\}".to_string()
        }
    });
    out.trim().to_string()
}

fn find_program(name: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| {
        dir.join(name).is_file() || dir.join(format!("{}.exe", name)).is_file()
    })
}

fn tex_document(expr: &str, display: bool) -> String {
    let body = if display {
        format!("$\\displaystyle {}$", expr)
    } else {
        format!("${}$", expr)
    };
    format!(
        "\\documentclass[10pt]{{article}}\n\
         \\usepackage{{amsmath}}\n\
         \\usepackage{{amssymb}}\n\
         \\pagestyle{{empty}}\n\
         \\begin{{document}}\n\
         {}\n\
         \\end{{document}}\n",
        body
    )
}

/// Renders through a TeX installation found on PATH
#[derive(Debug, Clone)]
pub struct DvipngRasterizer {
    dpi: u32,
}

impl DvipngRasterizer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi: dpi.max(72) }
    }

    /// True if `latex` and `dvipng` are both on PATH
    pub fn is_available() -> bool {
        *TOOLS_AVAILABLE
    }

    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> Result<String, MathFailure> {
        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| MathFailure::failed(format!("{}: {}", program, e)))?;
        if !output.status.success() {
            return Err(MathFailure::failed(format!(
                "{} exited with {}",
                program, output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl MathRasterizer for DvipngRasterizer {
    fn rasterize(&self, expr: &str, display: bool) -> Result<RasterImage, MathFailure> {
        if !Self::is_available() {
            return Err(MathFailure::unavailable("latex and dvipng not found on PATH"));
        }

        let dir = tempfile::tempdir().map_err(|e| MathFailure::failed(e.to_string()))?;
        fs::write(dir.path().join("eq.tex"), tex_document(expr, display))
            .map_err(|e| MathFailure::failed(e.to_string()))?;

        self.run(
            dir.path(),
            "latex",
            &["-interaction=nonstopmode", "-halt-on-error", "eq.tex"],
        )?;
        let dpi = self.dpi.to_string();
        let log = self.run(
            dir.path(),
            "dvipng",
            &[
                "-D", &dpi, "-T", "tight", "-bg", "Transparent", "--depth", "-o", "eq.png",
                "eq.dvi",
            ],
        )?;

        let depth = DVIPNG_DEPTH
            .captures(&log)
            .and_then(|caps| caps[1].parse::<i64>().ok())
            .unwrap_or(0);
        let png = fs::read(dir.path().join("eq.png"))
            .map_err(|e| MathFailure::failed(format!("dvipng output: {}", e)))?;

        trim_transparent(&png, depth, self.dpi)
    }
}

/// Crop transparent margins, keeping the baseline depth consistent
pub fn trim_transparent(png: &[u8], depth: i64, dpi: u32) -> Result<RasterImage, MathFailure> {
    let img = image::load_from_memory(png)
        .map_err(|e| MathFailure::failed(format!("unreadable equation image: {}", e)))?;
    let (_, height) = img.dimensions();
    let rgba = img.to_rgba8();

    let mut bbox: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in rgba.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        bbox = Some(match bbox {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    let (x0, y0, x1, y1) = bbox.ok_or_else(|| MathFailure::failed("equation image is empty"))?;

    let cropped = img.crop_imm(x0, y0, x1 - x0 + 1, y1 - y0 + 1);
    let trimmed_below = height - 1 - y1;
    let descent = (depth.max(0) as u32).saturating_sub(trimmed_below);

    let mut buf = Cursor::new(Vec::new());
    cropped
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| MathFailure::failed(e.to_string()))?;

    Ok(RasterImage {
        png: buf.into_inner(),
        width_px: cropped.width(),
        height_px: cropped.height(),
        descent_px: descent,
        dpi,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_unsupported_constructs() {
        assert_eq!(find_unsupported_construct(r"a \xrightarrow{f} b"), Some("\\xrightarrow"));
        assert_eq!(find_unsupported_construct(r"a \\ b"), Some("\\\\"));
        assert_eq!(
            find_unsupported_construct(r"\begin{cases} a \end{cases}"),
            Some("\\begin")
        );
        assert_eq!(find_unsupported_construct(r"\frac{a}{b}"), None);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_for_raster(r"\displaystyle a \ge b"), r"a \geq b");
        assert_eq!(normalize_for_raster(r"a \le b \ne c"), r"a \leq b \neq c");
        assert_eq!(normalize_for_raster(r"a \leq b \neq c"), r"a \leq b \neq c");
        assert_eq!(normalize_for_raster(r"\text{if } x"), r"\mathrm{if } x");
        assert_eq!(normalize_for_raster(r"\lbrace x \rbrace"), r"\{ x \}");
    }

    #[test]
    fn test_tex_document() {
        let doc = tex_document("x", true);
        assert!(doc.contains("$\\displaystyle x$"));
        assert!(doc.contains("\\usepackage{amsmath}"));
        assert!(tex_document("x", false).contains("\n$x$\n"));
    }

    #[test]
    fn test_trim_transparent() {
        let mut img = RgbaImage::from_pixel(20, 10, Rgba([0, 0, 0, 0]));
        for x in 5..15 {
            for y in 2..7 {
                img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();

        // 3 transparent rows below the ink, depth 4 -> 1 pixel remains below baseline
        let raster = trim_transparent(buf.get_ref(), 4, 600).unwrap();
        assert_eq!((raster.width_px, raster.height_px), (10, 5));
        assert_eq!(raster.descent_px, 1);
        assert!(image::load_from_memory(&raster.png).is_ok());
    }

    #[test]
    fn test_fully_transparent_image_fails() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        assert!(matches!(
            trim_transparent(buf.get_ref(), 0, 600),
            Err(MathFailure::RenderFailed(_))
        ));
    }

    #[test]
    fn test_scaled_size() {
        let raster = RasterImage {
            png: Vec::new(),
            width_px: 600,
            height_px: 300,
            descent_px: 60,
            dpi: 600,
        };
        let (w, h, d) = raster.scaled_size_pt(10.0, 1.0);
        assert!((w - 72.0).abs() < 1e-9);
        assert!((h - 36.0).abs() < 1e-9);
        assert!((d - 7.2).abs() < 1e-9);
    }
}
