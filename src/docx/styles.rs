//! Style engine
//!
//! Maps [`Settings`] to the fixed set of named styles every compiled thesis
//! uses: body text, five heading levels, a front-matter heading, figure and
//! table captions, and the bordered table style.

use quick_xml::escape::escape;
use std::fmt::Write;

use super::Alignment;
use crate::config::Settings;
use crate::data::constants::{
    cm_to_twips, heading_style_id, pt_to_half_points, H5_INDENT_CM, STYLE_FIGURE_CAPTION,
    STYLE_FRONT_HEADING, STYLE_NORMAL, STYLE_TABLE_CAPTION, STYLE_TABLE_GRID,
};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// One paragraph style definition
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphStyle {
    pub id: String,
    /// Display name; Word recognizes "heading N" as its built-in headings
    pub name: String,
    pub based_on: Option<&'static str>,
    pub size_pt: f64,
    pub bold: bool,
    pub italic: bool,
    pub align: Alignment,
    pub before_pt: f64,
    pub after_pt: f64,
    /// Line spacing multiple; inherited when unset
    pub line_multiple: Option<f64>,
    pub first_line_cm: Option<f64>,
    pub left_cm: Option<f64>,
    /// 0-based outline level, which puts the style in the table of contents
    pub outline_level: Option<u8>,
    pub keep_next: bool,
}

impl ParagraphStyle {
    fn derived(id: impl Into<String>, name: impl Into<String>, settings: &Settings) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            based_on: Some(STYLE_NORMAL),
            size_pt: settings.font_size,
            bold: false,
            italic: false,
            align: Alignment::Left,
            before_pt: 0.0,
            after_pt: 0.0,
            line_multiple: None,
            first_line_cm: Some(0.0),
            left_cm: None,
            outline_level: None,
            keep_next: false,
        }
    }
}

fn heading(settings: &Settings, level: u8) -> ParagraphStyle {
    let mut style = ParagraphStyle::derived(
        heading_style_id(level),
        format!("heading {}", level),
        settings,
    );
    style.size_pt = settings.heading_size(level);
    style.outline_level = Some(level - 1);
    style.keep_next = true;

    let (before, after) = match level {
        1 => (24.0, 18.0),
        2 => (18.0, 12.0),
        3 => (12.0, 6.0),
        _ => (6.0, 6.0),
    };
    style.before_pt = before;
    style.after_pt = after;

    match level {
        1 => {
            style.bold = true;
            style.align = Alignment::Center;
        }
        2 => style.bold = true,
        3 | 4 => {
            style.bold = true;
            style.italic = true;
        }
        _ => {
            style.italic = true;
            style.left_cm = Some(H5_INDENT_CM);
        }
    }
    style
}

/// All paragraph styles for the given settings, `Normal` first
pub fn build_styles(settings: &Settings) -> Vec<ParagraphStyle> {
    let normal = ParagraphStyle {
        id: STYLE_NORMAL.to_string(),
        name: "Normal".to_string(),
        based_on: None,
        size_pt: settings.font_size,
        bold: false,
        italic: false,
        align: Alignment::Justify,
        before_pt: 0.0,
        after_pt: 8.5,
        line_multiple: Some(settings.line_spacing),
        first_line_cm: Some(settings.indent),
        left_cm: None,
        outline_level: None,
        keep_next: false,
    };

    let mut styles = vec![normal];
    styles.extend((1..=5).map(|level| heading(settings, level)));

    let mut front = heading(settings, 1);
    front.id = STYLE_FRONT_HEADING.to_string();
    front.name = "Front Heading".to_string();
    front.outline_level = None;
    styles.push(front);

    let mut figure_caption =
        ParagraphStyle::derived(STYLE_FIGURE_CAPTION, "Figure Caption", settings);
    figure_caption.italic = true;
    figure_caption.align = Alignment::Center;
    figure_caption.before_pt = 6.0;
    figure_caption.after_pt = 12.0;
    styles.push(figure_caption);

    let mut table_caption = ParagraphStyle::derived(STYLE_TABLE_CAPTION, "Table Caption", settings);
    table_caption.bold = true;
    table_caption.align = Alignment::Center;
    table_caption.before_pt = 12.0;
    table_caption.after_pt = 6.0;
    styles.push(table_caption);

    styles
}

fn write_fonts(out: &mut String, family: &str) {
    let family = escape(family);
    let _ = write!(
        out,
        r#"<w:rFonts w:ascii="{f}" w:hAnsi="{f}" w:eastAsia="{f}" w:cs="{f}"/>"#,
        f = family
    );
}

fn write_style(out: &mut String, style: &ParagraphStyle, settings: &Settings) {
    let default_attr = if style.id == STYLE_NORMAL {
        r#" w:default="1""#
    } else {
        ""
    };
    let _ = write!(
        out,
        r#"<w:style w:type="paragraph"{} w:styleId="{}"><w:name w:val="{}"/>"#,
        default_attr,
        style.id,
        escape(style.name.as_str())
    );
    if let Some(base) = style.based_on {
        let _ = write!(out, r#"<w:basedOn w:val="{}"/><w:next w:val="{}"/>"#, base, STYLE_NORMAL);
    }
    out.push_str("<w:qFormat/>");

    out.push_str("<w:pPr>");
    if style.keep_next {
        out.push_str("<w:keepNext/>");
    }
    let _ = write!(
        out,
        r#"<w:spacing w:before="{}" w:after="{}""#,
        (style.before_pt * 20.0).round() as i64,
        (style.after_pt * 20.0).round() as i64
    );
    if let Some(multiple) = style.line_multiple {
        let _ = write!(
            out,
            r#" w:line="{}" w:lineRule="auto""#,
            (multiple * 240.0).round() as i64
        );
    }
    out.push_str("/>");
    if style.first_line_cm.is_some() || style.left_cm.is_some() {
        out.push_str("<w:ind");
        if let Some(left) = style.left_cm {
            let _ = write!(out, r#" w:left="{}""#, cm_to_twips(left));
        }
        if let Some(first) = style.first_line_cm {
            let _ = write!(out, r#" w:firstLine="{}""#, cm_to_twips(first));
        }
        out.push_str("/>");
    }
    let _ = write!(out, r#"<w:jc w:val="{}"/>"#, style.align.as_ooxml());
    if let Some(level) = style.outline_level {
        let _ = write!(out, r#"<w:outlineLvl w:val="{}"/>"#, level);
    }
    out.push_str("</w:pPr>");

    out.push_str("<w:rPr>");
    write_fonts(out, &settings.font_family);
    if style.bold {
        out.push_str("<w:b/><w:bCs/>");
    }
    if style.italic {
        out.push_str("<w:i/><w:iCs/>");
    }
    let size = pt_to_half_points(style.size_pt);
    let _ = write!(
        out,
        r#"<w:color w:val="000000"/><w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#,
        size
    );
    out.push_str("</w:rPr></w:style>");
}

fn write_table_grid(out: &mut String) {
    let _ = write!(
        out,
        r#"<w:style w:type="table" w:styleId="{}"><w:name w:val="Table Grid"/><w:tblPr>"#,
        STYLE_TABLE_GRID
    );
    out.push_str("<w:tblBorders>");
    for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        let _ = write!(
            out,
            r#"<w:{} w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#,
            side
        );
    }
    out.push_str("</w:tblBorders>");
    out.push_str(
        r#"<w:tblCellMar><w:left w:w="108" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar>"#,
    );
    out.push_str("</w:tblPr></w:style>");
}

/// `word/styles.xml`
pub fn styles_xml(settings: &Settings) -> String {
    let mut out = String::with_capacity(8 * 1024);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    let _ = write!(out, r#"<w:styles xmlns:w="{}">"#, W_NS);

    out.push_str("<w:docDefaults><w:rPrDefault><w:rPr>");
    write_fonts(&mut out, &settings.font_family);
    let size = pt_to_half_points(settings.font_size);
    let _ = write!(
        out,
        r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/><w:lang w:val="vi-VN"/>"#,
        size
    );
    out.push_str("</w:rPr></w:rPrDefault><w:pPrDefault/></w:docDefaults>");

    for style in build_styles(settings) {
        write_style(&mut out, &style, settings);
    }
    write_table_grid(&mut out);

    out.push_str("</w:styles>");
    out
}
