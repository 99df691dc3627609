//! Inline formatting tokenizer
//!
//! Splits one line into styled runs. At every position the delimiters are
//! tried in a fixed priority order: `$$`, `$`, `**`, `*`, `<u>`. A delimiter
//! only opens a span when its closing counterpart exists later on the line
//! and the enclosed text is non-empty; otherwise it is literal text. Spans
//! never nest and scanning resumes right after the closing delimiter.

/// A contiguous span of text sharing one inline style
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineRun {
    Plain(String),
    Bold(String),
    Italic(String),
    Underline(String),
    Math { expr: String, display: bool },
}

impl InlineRun {
    /// Text content of the run (the expression for math)
    pub fn text(&self) -> &str {
        match self {
            InlineRun::Plain(t)
            | InlineRun::Bold(t)
            | InlineRun::Italic(t)
            | InlineRun::Underline(t) => t,
            InlineRun::Math { expr, .. } => expr,
        }
    }

    pub fn is_math(&self) -> bool {
        matches!(self, InlineRun::Math { .. })
    }
}

#[derive(Debug, Clone, Copy)]
enum SpanKind {
    DisplayMath,
    InlineMath,
    Bold,
    Italic,
    Underline,
}

/// Delimiters in priority order
const DELIMITERS: [(SpanKind, &str, &str); 5] = [
    (SpanKind::DisplayMath, "$$", "$$"),
    (SpanKind::InlineMath, "$", "$"),
    (SpanKind::Bold, "**", "**"),
    (SpanKind::Italic, "*", "*"),
    (SpanKind::Underline, "<u>", "</u>"),
];

/// A matched span: kind, content range and the byte offset after the closer
struct Span<'a> {
    kind: SpanKind,
    content: &'a str,
    end: usize,
}

fn match_span(text: &str, pos: usize) -> Option<Span<'_>> {
    let rest = &text[pos..];
    for &(kind, open, close) in DELIMITERS.iter() {
        if !rest.starts_with(open) {
            continue;
        }
        let body_start = pos + open.len();
        let Some(rel_close) = text[body_start..].find(close) else {
            continue;
        };
        let content = &text[body_start..body_start + rel_close];
        if content.is_empty() {
            continue;
        }
        // "*" and "$" must not swallow the second half of a doubled delimiter
        if open.len() == 1 && content.starts_with(open) {
            continue;
        }
        return Some(Span {
            kind,
            content,
            end: body_start + rel_close + close.len(),
        });
    }
    None
}

/// Tokenize one line of text into styled runs
pub fn tokenize(text: &str) -> Vec<InlineRun> {
    let mut runs = Vec::new();
    let mut plain = String::new();
    let mut pos = 0;

    while pos < text.len() {
        if let Some(span) = match_span(text, pos) {
            if !plain.is_empty() {
                runs.push(InlineRun::Plain(std::mem::take(&mut plain)));
            }
            let content = span.content.to_string();
            runs.push(match span.kind {
                SpanKind::DisplayMath => InlineRun::Math {
                    expr: content.trim().to_string(),
                    display: true,
                },
                SpanKind::InlineMath => InlineRun::Math {
                    expr: content.trim().to_string(),
                    display: false,
                },
                SpanKind::Bold => InlineRun::Bold(content),
                SpanKind::Italic => InlineRun::Italic(content),
                SpanKind::Underline => InlineRun::Underline(content),
            });
            pos = span.end;
            continue;
        }

        // Not a span start: copy one character verbatim
        let ch = text[pos..].chars().next().unwrap_or_default();
        plain.push(ch);
        pos += ch.len_utf8().max(1);
    }

    if !plain.is_empty() {
        runs.push(InlineRun::Plain(plain));
    }
    runs
}

/// True if the line holds an opening delimiter with no closing counterpart
///
/// Used by diagnostics; tokenization itself treats such delimiters as text.
pub fn has_unmatched_delimiter(text: &str) -> bool {
    let mut pos = 0;
    while pos < text.len() {
        if let Some(span) = match_span(text, pos) {
            pos = span.end;
            continue;
        }
        let rest = &text[pos..];
        if rest.starts_with('$') || rest.starts_with("**") || rest.starts_with("<u>") {
            return true;
        }
        pos += rest.chars().next().map(char::len_utf8).unwrap_or(1);
    }
    false
}
