//! Word document model
//!
//! A small, write-only subset of WordprocessingML: paragraphs made of runs,
//! fields, equations and inline pictures, plus bordered tables. The
//! assembler builds a [`Document`]; [`writer`] turns it into a `.docx`
//! package and [`styles`] produces the style sheet it refers to.

pub mod styles;
pub mod writer;

use crate::config::Settings;

pub use styles::{build_styles, styles_xml, ParagraphStyle};
pub use writer::{document_xml, save_docx, write_docx};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_ooxml(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

/// Paragraph indentation in centimetres
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Indent {
    pub left_cm: Option<f64>,
    pub right_cm: Option<f64>,
    pub first_line_cm: Option<f64>,
    pub hanging_cm: Option<f64>,
}

impl Indent {
    /// All indents explicitly zero
    pub fn none() -> Self {
        Self {
            left_cm: Some(0.0),
            right_cm: Some(0.0),
            first_line_cm: Some(0.0),
            hanging_cm: None,
        }
    }

    pub fn hanging(left_cm: f64, hanging_cm: f64) -> Self {
        Self {
            left_cm: Some(left_cm),
            hanging_cm: Some(hanging_cm),
            ..Default::default()
        }
    }
}

/// A run of uniformly formatted text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// RGB hex, e.g. "808080"
    pub color: Option<String>,
    pub size_pt: Option<f64>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn size(mut self, pt: f64) -> Self {
        self.size_pt = Some(pt);
        self
    }
}

/// An inline picture
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    /// Relationship id of the media part
    pub rel_id: String,
    pub name: String,
    pub width_emu: i64,
    pub height_emu: i64,
    /// Vertical shift of the run in half-points (negative lowers it)
    pub position_half_points: Option<i64>,
}

/// Paragraph content
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(Run),
    /// Line break inside the paragraph
    Break,
    PageBreak,
    Tab,
    /// Computed field, shown as `placeholder` until Word refreshes it
    Field { instruction: String, placeholder: String },
    /// `<m:oMath>` or `<m:oMathPara>` markup
    Math(String),
    Image(Drawing),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub style: Option<String>,
    pub align: Option<Alignment>,
    pub indent: Option<Indent>,
    /// (before, after) in points
    pub spacing_pt: Option<(f64, f64)>,
    /// Left tab stops in centimetres
    pub tab_stops_cm: Vec<f64>,
    pub keep_next: bool,
    pub children: Vec<Inline>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn styled(style: &str) -> Self {
        Self {
            style: Some(style.to_string()),
            ..Default::default()
        }
    }

    pub fn align(mut self, align: Alignment) -> Self {
        self.align = Some(align);
        self
    }

    pub fn indent(mut self, indent: Indent) -> Self {
        self.indent = Some(indent);
        self
    }

    pub fn spacing(mut self, before_pt: f64, after_pt: f64) -> Self {
        self.spacing_pt = Some((before_pt, after_pt));
        self
    }

    pub fn tab_stop(mut self, cm: f64) -> Self {
        self.tab_stops_cm.push(cm);
        self
    }

    pub fn keep_next(mut self) -> Self {
        self.keep_next = true;
        self
    }

    pub fn with(mut self, inline: Inline) -> Self {
        self.children.push(inline);
        self
    }

    pub fn with_run(self, run: Run) -> Self {
        self.with(Inline::Text(run))
    }

    pub fn push(&mut self, inline: Inline) {
        self.children.push(inline);
    }

    /// Visible text, with breaks as newlines; equations and pictures are skipped
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Inline::Text(run) => out.push_str(&run.text),
                Inline::Break => out.push('\n'),
                Inline::Tab => out.push('\t'),
                Inline::Field { placeholder, .. } => out.push_str(placeholder),
                Inline::PageBreak | Inline::Math(_) | Inline::Image(_) => {}
            }
        }
        out
    }
}

/// A table cell holding one paragraph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCell {
    pub paragraph: Paragraph,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub style: Option<String>,
    /// Rows are rectangular; the first `header_rows` repeat on each page
    pub rows: Vec<Vec<TableCell>>,
    pub header_rows: usize,
    /// Relative column widths; equal when empty
    pub column_weights: Vec<f64>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// Page size and margins in centimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub width_cm: f64,
    pub height_cm: f64,
    pub margin_top_cm: f64,
    pub margin_bottom_cm: f64,
    pub margin_left_cm: f64,
    pub margin_right_cm: f64,
}

impl PageSetup {
    pub fn from_settings(settings: &Settings) -> Self {
        let (width_cm, height_cm) = settings.paper_size.dimensions_cm();
        Self {
            width_cm,
            height_cm,
            margin_top_cm: settings.margin_top,
            margin_bottom_cm: settings.margin_bottom,
            margin_left_cm: settings.margin_left,
            margin_right_cm: settings.margin_right,
        }
    }

    /// Width available to body text
    pub fn text_width_cm(&self) -> f64 {
        (self.width_cm - self.margin_left_cm - self.margin_right_cm).max(1.0)
    }
}

/// A media part stored under `word/media/`
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub rel_id: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Everything that goes into `word/document.xml` and its media
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub page: PageSetup,
    pub body: Vec<Block>,
    pub media: Vec<Media>,
}

impl Document {
    pub fn new(page: PageSetup) -> Self {
        Self {
            page,
            body: Vec::new(),
            media: Vec::new(),
        }
    }

    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.body.push(Block::Paragraph(paragraph));
    }

    pub fn push_table(&mut self, table: Table) {
        self.body.push(Block::Table(table));
    }

    /// Store image bytes and return the relationship id to embed them with
    pub fn add_media(&mut self, bytes: Vec<u8>, extension: &str) -> String {
        let n = self.media.len() + 1;
        let rel_id = format!("rIdImg{}", n);
        self.media.push(Media {
            rel_id: rel_id.clone(),
            file_name: format!("image{}.{}", n, extension.to_ascii_lowercase()),
            bytes,
        });
        rel_id
    }

    /// Paragraphs in body order, table cells included
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().flat_map(|block| -> Box<dyn Iterator<Item = &Paragraph> + '_> {
            match block {
                Block::Paragraph(p) => Box::new(std::iter::once(p)),
                Block::Table(t) => Box::new(t.rows.iter().flatten().map(|c| &c.paragraph)),
            }
        })
    }
}
