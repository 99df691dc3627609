//! Line-oriented block parser
//!
//! Every source line is classified into exactly one [`ParsedBlock`]. The
//! parser never fails: anything it does not recognise is a paragraph.
//! Contiguous `|` lines are grouped into one table using a single line of
//! lookahead.

use lazy_static::lazy_static;
use regex::Regex;
use std::iter::{Enumerate, Peekable};
use std::str::Lines;

use crate::data::constants::BULLET_GLYPHS;

lazy_static! {
    /// "Bảng 1.1: caption"
    static ref CAPTION_LINE: Regex = Regex::new(r"^Bảng\b[^:]*:").unwrap();
    /// "Hình 1.2: caption" inside square brackets; spaces inside the number are tolerated
    static ref FIGURE_PLACEHOLDER: Regex =
        Regex::new(r"^\s*(Hình\s*\d+\s*\.\s*\d+)\s*(?::\s*(.*?))?\s*$").unwrap();
}

/// Deepest bullet level
pub const MAX_BULLET_LEVEL: u8 = 3;

/// One classified unit of source markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedBlock {
    /// `#` .. `#####`
    Heading { level: u8, title: String },
    /// `-`, `--`, `---`, `*`, `**`, `***` or a bullet glyph
    Bullet { level: u8, content: String },
    /// Contiguous `|` rows, separator rows removed; rows may be ragged
    TableRows { rows: Vec<Vec<String>> },
    /// "Bảng n.m: caption", binds to a directly following table
    CaptionLine { text: String },
    /// "[Hình n.m: caption]"
    FigurePlaceholder { number: String, caption: String },
    Paragraph { text: String },
    Blank,
}

/// A parsed block with the 1-based source line it started on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBlock {
    pub block: ParsedBlock,
    pub line: usize,
}

/// Streaming block parser over markup text
pub struct BlockParser<'a> {
    lines: Peekable<Enumerate<Lines<'a>>>,
}

impl<'a> BlockParser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate().peekable(),
        }
    }

    fn table_rows(&mut self, first: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut push = |line: &str| {
            let cells = split_table_row(line);
            if !is_separator_row(line, &cells) {
                rows.push(cells);
            }
        };

        push(first);
        while let Some(&(_, next)) = self.lines.peek() {
            if !next.trim().starts_with('|') {
                break;
            }
            push(next);
            self.lines.next();
        }
        rows
    }
}

impl Iterator for BlockParser<'_> {
    type Item = SourceBlock;

    fn next(&mut self) -> Option<SourceBlock> {
        loop {
            let (idx, raw) = self.lines.next()?;
            let line = idx + 1;
            let trimmed = raw.trim();

            if trimmed.starts_with('|') {
                let rows = self.table_rows(trimmed);
                // A group made only of separator rows carries no data
                if rows.is_empty() {
                    continue;
                }
                return Some(SourceBlock {
                    block: ParsedBlock::TableRows { rows },
                    line,
                });
            }

            return Some(SourceBlock {
                block: classify_line(trimmed),
                line,
            });
        }
    }
}

/// Parse markup text into blocks in document order
pub fn parse_blocks(text: &str) -> Vec<SourceBlock> {
    BlockParser::new(text).collect()
}

/// Classify one non-table line
fn classify_line(trimmed: &str) -> ParsedBlock {
    if trimmed.is_empty() {
        return ParsedBlock::Blank;
    }

    if CAPTION_LINE.is_match(trimmed) {
        return ParsedBlock::CaptionLine {
            text: trimmed.to_string(),
        };
    }

    if let Some(block) = parse_heading(trimmed) {
        return block;
    }

    if let Some(block) = parse_bullet(trimmed) {
        return block;
    }

    if let Some(block) = parse_figure_placeholder(trimmed) {
        return block;
    }

    ParsedBlock::Paragraph {
        text: trimmed.to_string(),
    }
}

fn parse_heading(line: &str) -> Option<ParsedBlock> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if !(1..=5).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some(ParsedBlock::Heading {
        level: hashes as u8,
        title: rest.trim().to_string(),
    })
}

fn parse_bullet(line: &str) -> Option<ParsedBlock> {
    let first = line.chars().next()?;

    let (level, marker_len) = if BULLET_GLYPHS.contains(&first) {
        (1, first.len_utf8())
    } else if first == '-' || first == '*' {
        let run = line.chars().take_while(|&c| c == first).count();
        (run.min(MAX_BULLET_LEVEL as usize) as u8, run)
    } else {
        return None;
    };

    let rest = &line[marker_len..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(ParsedBlock::Bullet {
        level,
        content: rest.trim().to_string(),
    })
}

fn parse_figure_placeholder(line: &str) -> Option<ParsedBlock> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    let caps = FIGURE_PLACEHOLDER.captures(inner)?;
    Some(ParsedBlock::FigurePlaceholder {
        number: caps[1].to_string(),
        caption: caps
            .get(2)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
    })
}

/// Split "| a | b |" into trimmed cells
///
/// The outer pipes are optional on the right, so "| a | b" has two cells.
pub fn split_table_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|c| c.trim().to_string()).collect()
}

/// A separator row contains "---" and nothing but dashes, colons and spaces
///
/// Rows that contain "---" next to real text are data and are kept.
fn is_separator_row(line: &str, cells: &[String]) -> bool {
    line.contains("---")
        && cells
            .iter()
            .all(|c| c.chars().all(|ch| ch == '-' || ch == ':' || ch.is_whitespace()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn blocks(text: &str) -> Vec<ParsedBlock> {
        parse_blocks(text).into_iter().map(|b| b.block).collect()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_headings() {
        assert_eq!(
            blocks("# Intro\n## Background\n##### Deep\n###### Too deep\n#NoSpace"),
            vec![
                ParsedBlock::Heading { level: 1, title: "Intro".into() },
                ParsedBlock::Heading { level: 2, title: "Background".into() },
                ParsedBlock::Heading { level: 5, title: "Deep".into() },
                ParsedBlock::Paragraph { text: "###### Too deep".into() },
                ParsedBlock::Paragraph { text: "#NoSpace".into() },
            ]
        );
    }

    #[test]
    fn test_bullets() {
        assert_eq!(
            blocks("- one\n-- two\n--- three\n---- four\n* a\n** b\n• glyph\n**bold** text"),
            vec![
                ParsedBlock::Bullet { level: 1, content: "one".into() },
                ParsedBlock::Bullet { level: 2, content: "two".into() },
                ParsedBlock::Bullet { level: 3, content: "three".into() },
                ParsedBlock::Bullet { level: 3, content: "four".into() },
                ParsedBlock::Bullet { level: 1, content: "a".into() },
                ParsedBlock::Bullet { level: 2, content: "b".into() },
                ParsedBlock::Bullet { level: 1, content: "glyph".into() },
                ParsedBlock::Paragraph { text: "**bold** text".into() },
            ]
        );
    }

    #[test]
    fn test_table_grouping_and_separator() {
        let parsed = parse_blocks("intro\n| A | B |\n|---|---|\n| 1 | 2 |\nafter");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[1].line, 2);
        assert_eq!(
            parsed[1].block,
            ParsedBlock::TableRows {
                rows: vec![row(&["A", "B"]), row(&["1", "2"])]
            }
        );
        assert_eq!(parsed[2].line, 5);
    }

    #[test]
    fn test_ragged_rows_are_kept() {
        assert_eq!(
            blocks("| a | b |\n| c |"),
            vec![ParsedBlock::TableRows {
                rows: vec![row(&["a", "b"]), row(&["c"])]
            }]
        );
    }

    #[test]
    fn test_dash_content_row_is_data() {
        assert_eq!(
            blocks("| name | range |\n| x | 1---5 |\n| :---: | --- |"),
            vec![ParsedBlock::TableRows {
                rows: vec![row(&["name", "range"]), row(&["x", "1---5"])]
            }]
        );
    }

    #[test]
    fn test_single_row_table() {
        assert_eq!(
            blocks("| only |"),
            vec![ParsedBlock::TableRows { rows: vec![row(&["only"])] }]
        );
    }

    #[test]
    fn test_caption_and_figure() {
        assert_eq!(
            blocks("Bảng 1.1: Kết quả\n[Hình 1. 2: Sơ đồ]\n[Hình 2.1]\n[not a figure]\nBảng giá trị"),
            vec![
                ParsedBlock::CaptionLine { text: "Bảng 1.1: Kết quả".into() },
                ParsedBlock::FigurePlaceholder {
                    number: "Hình 1. 2".into(),
                    caption: "Sơ đồ".into()
                },
                ParsedBlock::FigurePlaceholder {
                    number: "Hình 2.1".into(),
                    caption: String::new()
                },
                ParsedBlock::Paragraph { text: "[not a figure]".into() },
                ParsedBlock::Paragraph { text: "Bảng giá trị".into() },
            ]
        );
    }

    #[test]
    fn test_blank_lines_and_trimming() {
        assert_eq!(
            blocks("  text  \n\n   \nmore"),
            vec![
                ParsedBlock::Paragraph { text: "text".into() },
                ParsedBlock::Blank,
                ParsedBlock::Blank,
                ParsedBlock::Paragraph { text: "more".into() },
            ]
        );
    }

    #[test]
    fn test_split_row_without_trailing_pipe() {
        assert_eq!(split_table_row("| a | b"), row(&["a", "b"]));
        assert_eq!(split_table_row("|a||c|"), row(&["a", "", "c"]));
    }
}
