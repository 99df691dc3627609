//! Document assembly
//!
//! Drives one compilation: front matter, then every parsed block in source
//! order, then the reference list. Numbering state and the pending table
//! caption live on the assembler and die with it. Nothing in here fails;
//! missing assets, bad equations and ragged tables degrade into visible
//! placeholders and one [`CompileWarning`] each. Only writing the package can
//! fail, and [`export_docx`] turns that into an [`ExportReport`].

use std::path::Path;

use crate::config::{CompileOptions, Settings};
use crate::core::blocks::{parse_blocks, ParsedBlock, SourceBlock};
use crate::core::inline::{tokenize, InlineRun};
use crate::core::math::{MathOutcome, MathRenderer, MathStage, RasterImage};
use crate::core::numbering::NumberingState;
use crate::data::constants::*;
use crate::docx::{
    save_docx, Alignment, Document, Drawing, Indent, Inline, PageSetup, Paragraph, Run, Table,
    TableCell,
};
use crate::features::abbreviations::{group_entries, AbbreviationEntry};
use crate::features::figures::FigureResolver;
use crate::features::refs::reference_entries;
use crate::features::tables::TableModel;
use crate::project::Project;
use crate::utils::error::{CompileOutput, CompileWarning};
use crate::utils::files::FileResolver;

/// Outcome of [`export_docx`], shown to the author as-is
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub success: bool,
    pub message: String,
    pub warnings: Vec<CompileWarning>,
}

/// Compile and write the package to `out_path`
///
/// Never panics and never returns an error: a failed write is reported in
/// the returned message and leaves no file at `out_path`.
pub fn export_docx(
    project: &Project,
    options: &CompileOptions,
    files: &dyn FileResolver,
    out_path: &Path,
) -> ExportReport {
    let renderer = MathRenderer::from_options(options);
    let output = compile_with_renderer(project, options, files, &renderer);

    match save_docx(&output.content, &project.settings, out_path) {
        Ok(()) => ExportReport {
            success: true,
            message: export_succeeded(&out_path.display().to_string()),
            warnings: output.warnings,
        },
        Err(e) => ExportReport {
            success: false,
            message: export_failed(&e.to_string()),
            warnings: output.warnings,
        },
    }
}

/// Build the document model with the math back-ends named in `options`
pub fn compile_document(
    project: &Project,
    options: &CompileOptions,
    files: &dyn FileResolver,
) -> CompileOutput<Document> {
    let renderer = MathRenderer::from_options(options);
    compile_with_renderer(project, options, files, &renderer)
}

/// Build the document model with an explicit math renderer
pub fn compile_with_renderer(
    project: &Project,
    options: &CompileOptions,
    files: &dyn FileResolver,
    renderer: &MathRenderer,
) -> CompileOutput<Document> {
    let blocks = parse_blocks(&project.content);
    let mut assembler = Assembler::new(project, options, files, renderer);

    if options.front_matter {
        assembler.front_matter(project, &blocks);
    }
    for block in &blocks {
        assembler.block(block);
    }
    assembler.flush_caption();
    assembler.references(project);

    CompileOutput::with_warnings(assembler.doc, assembler.warnings)
}

/// Per-compilation state
struct Assembler<'a> {
    settings: &'a Settings,
    options: &'a CompileOptions,
    math: &'a MathRenderer,
    figures: FigureResolver<'a>,
    numbering: NumberingState,
    pending_caption: Option<String>,
    equations: usize,
    doc: Document,
    warnings: Vec<CompileWarning>,
}

impl<'a> Assembler<'a> {
    fn new(
        project: &'a Project,
        options: &'a CompileOptions,
        files: &'a dyn FileResolver,
        math: &'a MathRenderer,
    ) -> Self {
        Self {
            settings: &project.settings,
            options,
            math,
            figures: FigureResolver::new(&project.figures, files, options.default_figure_width_cm),
            numbering: NumberingState::new(),
            pending_caption: None,
            equations: 0,
            doc: Document::new(PageSetup::from_settings(&project.settings)),
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, message: impl Into<String>, line: usize) {
        self.warnings.push(CompileWarning::at_line(message, line));
    }

    // ------------------------------------------------------------------
    // Front matter
    // ------------------------------------------------------------------

    fn front_matter(&mut self, project: &Project, blocks: &[SourceBlock]) {
        self.doc.push_paragraph(
            Paragraph::new()
                .align(Alignment::Center)
                .with_run(
                    Run::new(FIELD_REFRESH_NOTE)
                        .italic()
                        .color(NOTE_COLOR)
                        .size(NOTE_FONT_SIZE_PT),
                ),
        );

        self.field_section(TOC_TITLE, TOC_FIELD);

        if !project.figures.is_empty() {
            self.field_section(LIST_OF_FIGURES_TITLE, LIST_OF_FIGURES_FIELD);
        }

        let has_table_captions = blocks
            .iter()
            .any(|b| matches!(b.block, ParsedBlock::CaptionLine { .. }));
        if has_table_captions {
            self.field_section(LIST_OF_TABLES_TITLE, LIST_OF_TABLES_FIELD);
        }

        self.abbreviation_table(&project.abbreviations);
    }

    fn field_section(&mut self, title: &str, instruction: &str) {
        self.doc
            .push_paragraph(Paragraph::styled(STYLE_FRONT_HEADING).with_run(Run::new(title)));
        self.doc.push_paragraph(Paragraph::new().with(Inline::Field {
            instruction: instruction.to_string(),
            placeholder: String::new(),
        }));
        self.page_break();
    }

    fn abbreviation_table(&mut self, entries: &[AbbreviationEntry]) {
        let groups = group_entries(entries);
        if groups.is_empty() {
            return;
        }

        self.doc.push_paragraph(
            Paragraph::styled(STYLE_FRONT_HEADING).with_run(Run::new(ABBREVIATIONS_TITLE)),
        );

        let mut rows = vec![ABBREVIATION_HEADER
            .iter()
            .map(|h| cell(Run::new(*h).bold(), Alignment::Center))
            .collect::<Vec<_>>()];
        for (label, group) in [
            (ABBREVIATION_GROUP_LABEL, &groups.abbreviations),
            (SYMBOL_GROUP_LABEL, &groups.symbols),
        ] {
            if group.is_empty() {
                continue;
            }
            rows.push(vec![
                cell(Run::new(label).bold().italic(), Alignment::Left),
                cell(Run::new(""), Alignment::Left),
            ]);
            for entry in group.iter() {
                rows.push(vec![
                    cell(Run::new(entry.abbreviation.as_str()), Alignment::Left),
                    cell(Run::new(entry.full_form.as_str()), Alignment::Left),
                ]);
            }
        }

        self.doc.push_table(Table {
            style: Some(STYLE_TABLE_GRID.to_string()),
            rows,
            header_rows: 1,
            column_weights: vec![1.0, 2.5],
        });
        self.page_break();
    }

    fn page_break(&mut self) {
        self.doc.push_paragraph(Paragraph::new().with(Inline::PageBreak));
    }

    // ------------------------------------------------------------------
    // Body
    // ------------------------------------------------------------------

    fn block(&mut self, source: &SourceBlock) {
        let line = source.line;
        match &source.block {
            ParsedBlock::TableRows { rows } => {
                self.table(rows, line);
                return;
            }
            ParsedBlock::CaptionLine { text } => {
                self.flush_caption();
                self.pending_caption = Some(text.clone());
                return;
            }
            _ => self.flush_caption(),
        }

        match &source.block {
            ParsedBlock::Heading { level, title } => self.heading(*level, title),
            ParsedBlock::Bullet { level, content } => self.bullet(*level, content, line),
            ParsedBlock::FigurePlaceholder { number, caption } => {
                self.figure(number, caption, line)
            }
            ParsedBlock::Paragraph { text } => {
                let paragraph = self.text_paragraph(text, line);
                self.doc.push_paragraph(paragraph);
            }
            ParsedBlock::Blank | ParsedBlock::TableRows { .. } | ParsedBlock::CaptionLine { .. } => {}
        }
    }

    /// Emit a buffered caption that did not bind to a table
    fn flush_caption(&mut self) {
        if let Some(text) = self.pending_caption.take() {
            self.doc
                .push_paragraph(Paragraph::styled(STYLE_TABLE_CAPTION).with_run(Run::new(text)));
        }
    }

    fn heading(&mut self, level: u8, title: &str) {
        let text = self.numbering.heading(level, title, self.settings);
        let mut paragraph = Paragraph::styled(&heading_style_id(level));
        for (i, line) in text.lines.iter().enumerate() {
            if i > 0 {
                paragraph.push(Inline::Break);
            }
            paragraph.push(Inline::Text(Run::new(line.as_str())));
        }
        self.doc.push_paragraph(paragraph);
    }

    fn bullet(&mut self, level: u8, content: &str, line: usize) {
        let level = level.clamp(1, BULLET_LEVEL_GLYPHS.len() as u8);
        let glyph = BULLET_LEVEL_GLYPHS[(level - 1) as usize];
        // Glyph hangs at the level's indent; the text starts one hanging width later
        let glyph_at = self.settings.indent + f64::from(level - 1) * BULLET_LEVEL_STEP_CM;
        let text_at = glyph_at + BULLET_HANGING_CM;

        let mut paragraph = Paragraph::new()
            .indent(Indent::hanging(text_at, BULLET_HANGING_CM))
            .tab_stop(text_at)
            .with_run(Run::new(glyph))
            .with(Inline::Tab);
        paragraph
            .children
            .extend(self.inline_children(content, line, false));
        self.doc.push_paragraph(paragraph);
    }

    fn text_paragraph(&mut self, text: &str, line: usize) -> Paragraph {
        let runs = tokenize(text);
        let lone_display = matches!(
            runs.as_slice(),
            [InlineRun::Math { display: true, .. }]
        );

        let mut paragraph = Paragraph::new();
        if lone_display {
            paragraph = paragraph.align(Alignment::Center).indent(Indent::none());
        }
        paragraph.children = self.render_runs(runs, line, false);
        paragraph
    }

    fn figure(&mut self, number: &str, caption: &str, line: usize) {
        match self.figures.resolve(number, caption) {
            Ok(figure) => {
                let caption = figure.caption_text();
                let rel_id = self.doc.add_media(figure.bytes, figure.extension);
                let drawing = Drawing {
                    rel_id,
                    name: figure.number,
                    width_emu: cm_to_emu(figure.width_cm),
                    height_emu: cm_to_emu(figure.height_cm),
                    position_half_points: None,
                };
                self.doc.push_paragraph(
                    Paragraph::new()
                        .align(Alignment::Center)
                        .indent(Indent::none())
                        .keep_next()
                        .with(Inline::Image(drawing)),
                );
                self.doc.push_paragraph(
                    Paragraph::styled(STYLE_FIGURE_CAPTION).with_run(Run::new(caption)),
                );
            }
            Err(problem) => {
                self.doc.push_paragraph(
                    Paragraph::new()
                        .align(Alignment::Center)
                        .indent(Indent::none())
                        .with_run(Run::new(problem.placeholder()).italic()),
                );
                self.warn(problem.to_string(), line);
            }
        }
    }

    fn table(&mut self, rows: &[Vec<String>], line: usize) {
        let Some(model) = TableModel::from_rows(rows.to_vec()) else {
            self.flush_caption();
            return;
        };
        if model.ragged {
            self.warn(
                format!("table rows have missing cells; padded to {} columns", model.columns),
                line,
            );
        }

        let mut table_rows = Vec::with_capacity(model.row_count());
        for (r, row) in model.rows().enumerate() {
            let header = r == 0;
            let align = if header {
                Alignment::Center
            } else {
                Alignment::Left
            };
            let cells = row
                .iter()
                .map(|text| {
                    let mut paragraph = Paragraph::new().align(align).indent(Indent::none());
                    paragraph.children = self.inline_children(text, line, header);
                    TableCell { paragraph }
                })
                .collect();
            table_rows.push(cells);
        }

        self.doc.push_paragraph(Paragraph::new());
        self.doc.push_table(Table {
            style: Some(STYLE_TABLE_GRID.to_string()),
            rows: table_rows,
            header_rows: 1,
            column_weights: vec![1.0; model.columns],
        });
        self.flush_caption();
        self.doc.push_paragraph(Paragraph::new());
    }

    // ------------------------------------------------------------------
    // Inline content
    // ------------------------------------------------------------------

    fn inline_children(&mut self, text: &str, line: usize, bold: bool) -> Vec<Inline> {
        self.render_runs(tokenize(text), line, bold)
    }

    fn render_runs(&mut self, runs: Vec<InlineRun>, line: usize, bold: bool) -> Vec<Inline> {
        let mut out = Vec::with_capacity(runs.len());
        for run in runs {
            let styled = match run {
                InlineRun::Plain(t) => Run::new(t),
                InlineRun::Bold(t) => Run::new(t).bold(),
                InlineRun::Italic(t) => Run::new(t).italic(),
                InlineRun::Underline(t) => Run::new(t).underline(),
                InlineRun::Math { expr, display } => {
                    out.push(self.equation(&expr, display, line));
                    continue;
                }
            };
            out.push(Inline::Text(if bold { styled.bold() } else { styled }));
        }
        out
    }

    fn equation(&mut self, expr: &str, display: bool, line: usize) -> Inline {
        let rendering = self.math.render(expr, display);

        match rendering.stage() {
            MathStage::Raster if self.options.native_math => {
                if let Some((_, failure)) = rendering.attempts.first() {
                    let message = format!("equation '{}' inserted as an image: {}", expr, failure);
                    self.warn(message, line);
                }
            }
            MathStage::Placeholder => {
                if let Some(failure) = rendering.final_failure() {
                    let message = format!("equation '{}' could not be rendered: {}", expr, failure);
                    self.warn(message, line);
                }
            }
            _ => {}
        }

        match rendering.outcome {
            MathOutcome::Native(xml) => Inline::Math(xml),
            MathOutcome::Raster(image) => self.equation_image(image, display),
            MathOutcome::Placeholder(text) => {
                Inline::Text(Run::new(text).italic().color(PLACEHOLDER_COLOR))
            }
        }
    }

    /// Embed a rasterized equation, lowered so its baseline meets the text's
    fn equation_image(&mut self, image: RasterImage, display: bool) -> Inline {
        let factor = if display {
            self.options.display_math_scale
        } else {
            self.options.inline_math_scale
        };
        let (width_pt, height_pt, descent_pt) =
            image.scaled_size_pt(self.settings.font_size, factor);

        self.equations += 1;
        let rel_id = self.doc.add_media(image.png, "png");
        Inline::Image(Drawing {
            rel_id,
            name: format!("Equation {}", self.equations),
            width_emu: pt_to_emu(width_pt),
            height_emu: pt_to_emu(height_pt),
            position_half_points: Some(-pt_to_half_points(descent_pt)),
        })
    }

    // ------------------------------------------------------------------
    // Back matter
    // ------------------------------------------------------------------

    fn references(&mut self, project: &Project) {
        if project.citations.is_empty() {
            return;
        }
        self.page_break();
        self.doc.push_paragraph(
            Paragraph::styled(STYLE_FRONT_HEADING).with_run(Run::new(REFERENCES_TITLE)),
        );
        for entry in reference_entries(&project.citations) {
            self.doc.push_paragraph(
                Paragraph::new()
                    .align(Alignment::Justify)
                    .indent(Indent {
                        first_line_cm: Some(0.0),
                        ..Default::default()
                    })
                    .with_run(Run::new(entry)),
            );
        }
    }
}

fn cell(run: Run, align: Alignment) -> TableCell {
    TableCell {
        paragraph: Paragraph::new()
            .align(align)
            .indent(Indent::none())
            .with_run(run),
    }
}
