//! Markup diagnostics
//!
//! A lint pass over a project that reports, before export, everything the
//! compiler would silently degrade:
//!
//! - Figure placeholders with no matching record, and records whose image is missing
//! - Equations the native converter cannot handle
//! - Unmatched inline delimiters
//! - Ragged table rows
//! - Heading levels that skip (`#` followed by `###`)
//! - Table captions not directly followed by a table
//!
//! ## Example
//!
//! ```rust
//! use thesisdoc::project::Project;
//! use thesisdoc::utils::diagnostics::check_markup;
//! use thesisdoc::utils::files::MemoryFileResolver;
//!
//! let project = Project::from_markup("# A\n### B\n");
//! let result = check_markup(&project, &MemoryFileResolver::new());
//! assert_eq!(result.warnings, 1);
//! ```

use std::fmt::{self, Write as _};

use crate::core::blocks::{parse_blocks, ParsedBlock};
use crate::core::inline::{has_unmatched_delimiter, tokenize, InlineRun};
use crate::core::math::{find_unsupported_construct, latex_to_omml};
use crate::features::figures::FigureResolver;
use crate::features::tables::TableModel;
use crate::project::Project;
use crate::utils::files::FileResolver;

/// How bad a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    /// The output will differ from a native rendering but nothing is lost
    Info,
    /// The output will contain a placeholder or a fallback rendering
    Warning,
    /// Something the author referenced does not exist
    Error,
}

impl DiagnosticLevel {
    fn label(self) -> &'static str {
        match self {
            DiagnosticLevel::Info => "note",
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Error => "error",
        }
    }

    fn ansi(self) -> &'static str {
        match self {
            DiagnosticLevel::Info => "\x1b[36m",
            DiagnosticLevel::Warning => "\x1b[33m",
            DiagnosticLevel::Error => "\x1b[31m",
        }
    }
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One finding, anchored to a markup line when it has one
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    /// 1-based
    pub line: Option<usize>,
    /// 1-based, counted in characters
    pub column: Option<usize>,
    /// The offending markup, or the record path
    pub source_text: Option<String>,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            line: None,
            column: None,
            source_text: None,
            suggestion: None,
        }
    }

    pub fn with_location(self, line: usize, column: usize) -> Self {
        Self {
            line: Some(line),
            column: Some(column),
            ..self
        }
    }

    pub fn with_source(self, text: impl Into<String>) -> Self {
        Self {
            source_text: Some(text.into()),
            ..self
        }
    }

    pub fn with_suggestion(self, suggestion: impl Into<String>) -> Self {
        Self {
            suggestion: Some(suggestion.into()),
            ..self
        }
    }

    /// "line 3:7" or "project" for record-level findings
    fn location(&self) -> String {
        match (self.line, self.column) {
            (Some(line), Some(column)) => format!("line {}:{}", line, column),
            (Some(line), None) => format!("line {}", line),
            _ => "project".to_string(),
        }
    }

    fn render(&self, f: &mut impl fmt::Write, use_color: bool) -> fmt::Result {
        let (on, off) = if use_color {
            (self.level.ansi(), "\x1b[0m")
        } else {
            ("", "")
        };
        write!(f, "{}: {}{}{}: {}", self.location(), on, self.level, off, self.message)?;
        if let Some(source) = &self.source_text {
            write!(f, "\n    {}", source)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n    hint: {}", suggestion)?;
        }
        Ok(())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, false)
    }
}

/// Every finding of one check run, with per-level counts
#[derive(Debug, Default)]
pub struct CheckResult {
    pub diagnostics: Vec<Diagnostic>,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl CheckResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diag: Diagnostic) {
        let counter = match diag.level {
            DiagnosticLevel::Error => &mut self.errors,
            DiagnosticLevel::Warning => &mut self.warnings,
            DiagnosticLevel::Info => &mut self.infos,
        };
        *counter += 1;
        self.diagnostics.push(diag);
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// "1 error, 2 warnings", or "no issues found"
    pub fn summary(&self) -> String {
        let parts: Vec<String> = [
            (self.errors, "error"),
            (self.warnings, "warning"),
            (self.infos, "note"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, word)| plural(count, word))
        .collect();

        if parts.is_empty() {
            "no issues found".to_string()
        } else {
            parts.join(", ")
        }
    }
}

fn plural(count: usize, word: &str) -> String {
    format!("{} {}{}", count, word, if count == 1 { "" } else { "s" })
}

/// Check a project's markup and records for issues
pub fn check_markup(project: &Project, files: &dyn FileResolver) -> CheckResult {
    let mut result = CheckResult::new();
    let lines: Vec<&str> = project.content.lines().collect();
    let source_line = |line: usize| lines.get(line - 1).map(|l| l.trim()).unwrap_or("");

    check_figure_records(project, files, &mut result);

    let resolver = FigureResolver::new(&project.figures, files, 0.0);
    let blocks = parse_blocks(&project.content);
    let mut previous_heading = 0u8;

    for (i, source) in blocks.iter().enumerate() {
        let line = source.line;
        match &source.block {
            ParsedBlock::Heading { level, title } => {
                if previous_heading > 0 && *level > previous_heading + 1 {
                    result.add(
                        Diagnostic::new(
                            DiagnosticLevel::Warning,
                            format!(
                                "heading level skips from {} to {}",
                                previous_heading, level
                            ),
                        )
                        .with_location(line, 1)
                        .with_source(source_line(line))
                        .with_suggestion(format!(
                            "Use {} for the next level",
                            "#".repeat(previous_heading as usize + 1)
                        )),
                    );
                }
                previous_heading = *level;
                check_text(title, line, &mut result);
            }
            ParsedBlock::Bullet { content, .. } => {
                check_text_in_line(content, line, source_line(line), &mut result)
            }
            ParsedBlock::Paragraph { text } => {
                check_text_in_line(text, line, source_line(line), &mut result)
            }
            ParsedBlock::TableRows { rows } => {
                if let Some(model) = TableModel::from_rows(rows.clone()) {
                    if model.ragged {
                        result.add(
                            Diagnostic::new(
                                DiagnosticLevel::Warning,
                                format!(
                                    "table rows have different cell counts; short rows are padded to {} columns",
                                    model.columns
                                ),
                            )
                            .with_location(line, 1)
                            .with_source(source_line(line)),
                        );
                    }
                }
                for cell in rows.iter().flatten() {
                    check_text(cell, line, &mut result);
                }
            }
            ParsedBlock::CaptionLine { text } => {
                let followed_by_table = matches!(
                    blocks.get(i + 1).map(|b| &b.block),
                    Some(ParsedBlock::TableRows { .. })
                );
                if !followed_by_table {
                    result.add(
                        Diagnostic::new(
                            DiagnosticLevel::Warning,
                            "table caption is not directly followed by a table",
                        )
                        .with_location(line, 1)
                        .with_source(text.as_str())
                        .with_suggestion("Put the table rows on the line right after the caption"),
                    );
                }
            }
            ParsedBlock::FigurePlaceholder { number, .. } => {
                if resolver.find(number).is_none() {
                    result.add(
                        Diagnostic::new(
                            DiagnosticLevel::Error,
                            format!("no figure record for '{}'", number),
                        )
                        .with_location(line, 1)
                        .with_source(source_line(line))
                        .with_suggestion("Insert the figure in the editor or fix the number"),
                    );
                }
            }
            ParsedBlock::Blank => {}
        }
    }

    result
}

fn check_figure_records(project: &Project, files: &dyn FileResolver, result: &mut CheckResult) {
    for figure in &project.figures {
        let path = figure.path.trim();
        if path.is_empty() {
            result.add(
                Diagnostic::new(
                    DiagnosticLevel::Warning,
                    format!("figure '{}' has no image path", figure.number),
                ),
            );
        } else if !files.file_exists(path) {
            result.add(
                Diagnostic::new(
                    DiagnosticLevel::Warning,
                    format!("image file of figure '{}' not found", figure.number),
                )
                .with_source(path),
            );
        }
    }
}

/// Check inline content whose position inside the source line is unknown
fn check_text(text: &str, line: usize, result: &mut CheckResult) {
    check_text_in_line(text, line, text, result);
}

fn check_text_in_line(text: &str, line: usize, source: &str, result: &mut CheckResult) {
    if has_unmatched_delimiter(text) {
        result.add(
            Diagnostic::new(DiagnosticLevel::Warning, "unmatched inline delimiter")
                .with_location(line, 1)
                .with_source(source)
                .with_suggestion("Close the `$`, `**` or `<u>` span, or remove the marker"),
        );
    }

    for run in tokenize(text) {
        let InlineRun::Math { expr, display } = run else {
            continue;
        };
        let Err(failure) = latex_to_omml(&expr, display) else {
            continue;
        };

        let column = column_of(source, &expr);
        let diag = match find_unsupported_construct(&expr) {
            Some(construct) => Diagnostic::new(
                DiagnosticLevel::Warning,
                format!(
                    "equation uses {}, which cannot be rendered; a placeholder will be inserted",
                    construct
                ),
            ),
            None => Diagnostic::new(
                DiagnosticLevel::Info,
                format!(
                    "equation will be inserted as an image ({})",
                    failure
                ),
            ),
        };
        result.add(
            diag.with_location(line, column)
                .with_source(expr.as_str()),
        );
    }
}

/// 1-based character column of `needle` in `line`
fn column_of(line: &str, needle: &str) -> usize {
    line.find(needle)
        .map(|byte| line[..byte].chars().count() + 1)
        .unwrap_or(1)
}

/// Render a check run for the terminal, one block per finding
pub fn format_diagnostics(result: &CheckResult, use_color: bool) -> String {
    let mut output = String::new();
    for diag in &result.diagnostics {
        let _ = diag.render(&mut output, use_color);
        output.push_str("\n\n");
    }

    let worst = result.diagnostics.iter().map(|d| d.level).max();
    let color = match worst {
        Some(level) if use_color => level.ansi(),
        None if use_color => "\x1b[32m",
        _ => "",
    };
    let reset = if use_color { "\x1b[0m" } else { "" };
    let _ = write!(output, "{}Summary: {}{}", color, result.summary(), reset);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::figures::Figure;
    use crate::utils::files::MemoryFileResolver;

    fn check(text: &str) -> CheckResult {
        check_markup(&Project::from_markup(text), &MemoryFileResolver::new())
    }

    #[test]
    fn test_clean_document() {
        let result = check("# Mở đầu\n## Bối cảnh\nCông thức $x^2$ và **đậm**.\n");
        assert!(result.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(result.summary(), "no issues found");
    }

    #[test]
    fn test_heading_skip() {
        let result = check("# A\n### B\n");
        assert_eq!(result.warnings, 1);
        assert_eq!(result.diagnostics[0].line, Some(2));
    }

    #[test]
    fn test_unmatched_delimiter() {
        let result = check("Giá $5 mỗi cái\n");
        assert_eq!(result.warnings, 1);
        assert!(result.diagnostics[0].message.contains("delimiter"));
    }

    #[test]
    fn test_unsupported_equation() {
        let result = check("Ta có $a \\xrightarrow{f} b$ đúng.\n");
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.message.contains("\\xrightarrow"))
            .unwrap();
        assert_eq!(diag.level, DiagnosticLevel::Warning);
        assert_eq!(diag.column, Some(8));
    }

    #[test]
    fn test_ragged_table_and_dangling_caption() {
        let result = check("Bảng 1.1: Số liệu\n\n| a | b |\n| c |\n");
        assert_eq!(result.warnings, 2);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("not directly followed")));
    }

    #[test]
    fn test_figure_checks() {
        let mut project = Project::from_markup("[Hình 1.1: có]\n[Hình 2.1: không]\n");
        project.figures.push(Figure {
            number: "Hình 1.1".into(),
            path: "missing.png".into(),
            ..Default::default()
        });
        let result = check_markup(&project, &MemoryFileResolver::new());
        assert_eq!(result.errors, 1);
        assert_eq!(result.warnings, 1);
        assert!(result.has_errors());

        let text = format_diagnostics(&result, false);
        assert!(text.contains("no figure record for 'Hình 2.1'"));
        assert!(text.contains("line 2:1: error: no figure record"));
        assert!(text.contains("project: warning: image file"));
        assert!(text.ends_with("Summary: 1 error, 1 warning"));
    }

    #[test]
    fn test_colored_output() {
        let result = check("# A\n### B\n");
        let text = format_diagnostics(&result, true);
        assert!(text.starts_with("line 2:1: \x1b[33mwarning\x1b[0m: heading level skips"));
        assert!(text.contains("hint: Use ## for the next level"));
        assert!(text.ends_with("\x1b[33mSummary: 1 warning\x1b[0m"));
    }
}
