//! LaTeX math to Office Math Markup (OMML)
//!
//! The expression is parsed with mitex into a rowan tree, lowered into a
//! small [`MathNode`] tree and serialized as `<m:oMath>` markup. Anything the
//! lowering does not understand is reported as
//! [`MathFailure::UnsupportedConstruct`] so the caller can fall back to an
//! image.

use fxhash::FxHashMap;
use lazy_static::lazy_static;
use mitex_parser::syntax::{CmdItem, EnvItem, SyntaxElement, SyntaxKind, SyntaxNode};
use mitex_parser::CommandSpec;
use mitex_spec_gen::DEFAULT_SPEC;
use quick_xml::escape::escape;
use rowan::ast::AstNode;
use std::fmt::Write;

use super::{MathFailure, NativeMathConverter};
use crate::data::symbols::{
    delimiter_char, ACCENTS, BIG_OPERATORS, FONT_COMMANDS, FUNCTION_NAMES, MATH_SPACES,
    MATH_SYMBOLS, STYLE_DIRECTIVES,
};

lazy_static! {
    /// Command specification used to parse equations
    pub static ref MATH_SPEC: CommandSpec = {
        let commands: FxHashMap<String, _> = DEFAULT_SPEC
            .items()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        CommandSpec::new(commands)
    };
}

/// Functions whose subscript is set underneath (`\lim_{x \to 0}`)
const LIMIT_FUNCTIONS: &[&str] = &["lim", "liminf", "limsup", "max", "min", "sup", "inf"];

/// Run font of a text node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextFont {
    /// `m:sty`: p, b, i or bi
    pub sty: Option<&'static str>,
    /// `m:scr`: double-struck, script, fraktur, ...
    pub scr: Option<&'static str>,
    /// Upright operator name such as `sin`
    pub function: bool,
}

impl TextFont {
    fn from_command(value: &'static str) -> Self {
        match value {
            "p" | "b" | "i" | "bi" => TextFont {
                sty: Some(value),
                ..Default::default()
            },
            other => TextFont {
                scr: Some(other),
                ..Default::default()
            },
        }
    }

    fn function() -> Self {
        TextFont {
            sty: Some("p"),
            scr: None,
            function: true,
        }
    }
}

/// Equation tree between the parser and the serializer
#[derive(Debug, Clone, PartialEq)]
pub enum MathNode {
    Text {
        text: String,
        font: TextFont,
    },
    Frac {
        num: Vec<MathNode>,
        den: Vec<MathNode>,
        bar: bool,
    },
    Radical {
        degree: Option<Vec<MathNode>>,
        body: Vec<MathNode>,
    },
    Script {
        base: Vec<MathNode>,
        sub: Option<Vec<MathNode>>,
        sup: Option<Vec<MathNode>>,
    },
    /// Big operator; `integral` places limits to the side
    Nary {
        chr: &'static str,
        integral: bool,
        sub: Option<Vec<MathNode>>,
        sup: Option<Vec<MathNode>>,
        body: Vec<MathNode>,
    },
    Limit {
        base: Vec<MathNode>,
        below: Vec<MathNode>,
    },
    Delimited {
        open: String,
        close: String,
        body: Vec<MathNode>,
    },
    Accent {
        chr: &'static str,
        body: Vec<MathNode>,
    },
    Bar {
        top: bool,
        body: Vec<MathNode>,
    },
    Matrix {
        rows: Vec<Vec<Vec<MathNode>>>,
        left_aligned: bool,
    },
    EqArray {
        rows: Vec<Vec<MathNode>>,
    },
    Group(Vec<MathNode>),
    /// `&`, only valid inside an environment
    CellBreak,
    /// `\\`, only valid inside an environment
    RowBreak,
}

impl MathNode {
    fn text(text: impl Into<String>) -> Self {
        MathNode::Text {
            text: text.into(),
            font: TextFont::default(),
        }
    }

    fn is_break(&self) -> bool {
        matches!(self, MathNode::CellBreak | MathNode::RowBreak)
    }
}

/// The built-in native converter
#[derive(Debug, Clone, Copy, Default)]
pub struct OmmlConverter;

impl NativeMathConverter for OmmlConverter {
    fn convert(&self, expr: &str, display: bool) -> Result<String, MathFailure> {
        latex_to_omml(expr, display)
    }
}

/// Convert a LaTeX math expression to OMML
///
/// Display equations are wrapped in `<m:oMathPara>`.
pub fn latex_to_omml(expr: &str, display: bool) -> Result<String, MathFailure> {
    let nodes = parse_math(expr)?;
    Ok(write_omml(&nodes, display))
}

/// Parse an expression into the equation tree
pub fn parse_math(expr: &str) -> Result<Vec<MathNode>, MathFailure> {
    if expr.trim().is_empty() {
        return Err(MathFailure::unsupported("empty expression"));
    }
    let root = mitex_parser::parse(expr, MATH_SPEC.clone());
    let nodes = build_sequence(&root)?;
    if contains_break(&nodes) {
        return Err(MathFailure::unsupported(
            "`&` or `\\\\` outside an environment",
        ));
    }
    Ok(nodes)
}

// ============================================================================
// Tree lowering
// ============================================================================

fn build_sequence(node: &SyntaxNode) -> Result<Vec<MathNode>, MathFailure> {
    let mut out = Vec::new();
    for child in node.children_with_tokens() {
        push_element(child, &mut out)?;
    }
    Ok(fold_operators(out))
}

fn element_text(elem: &SyntaxElement) -> String {
    match elem {
        SyntaxElement::Node(n) => n.text().to_string(),
        SyntaxElement::Token(t) => t.text().to_string(),
    }
}

fn push_element(elem: SyntaxElement, out: &mut Vec<MathNode>) -> Result<(), MathFailure> {
    use SyntaxKind::*;

    match elem.kind() {
        TokenError => return Err(MathFailure::unsupported(element_text(&elem))),

        ScopeRoot | ItemText | ItemParen | ItemFormula | ClauseArgument | ItemBracket => {
            if let SyntaxElement::Node(n) = elem {
                for child in n.children_with_tokens() {
                    push_element(child, out)?;
                }
            }
        }

        ItemCurly => {
            if let SyntaxElement::Node(n) = elem {
                out.push(MathNode::Group(build_sequence(&n)?));
            }
        }

        ItemLR => {
            if let SyntaxElement::Node(n) = elem {
                out.push(delimited(&n)?);
            }
        }
        ClauseLR => return Err(MathFailure::unsupported("unbalanced \\left or \\right")),

        ItemAttachComponent => {
            if let SyntaxElement::Node(n) = elem {
                attach(&n, out)?;
            }
        }
        TokenUnderscore | TokenCaret => {
            return Err(MathFailure::unsupported("script without argument"))
        }

        ItemCmd => {
            if let SyntaxElement::Node(n) = elem {
                command(&n, out)?;
            }
        }
        ItemEnv => {
            if let SyntaxElement::Node(n) = elem {
                out.push(environment(&n)?);
            }
        }
        TokenCommandSym => command_symbol(&element_text(&elem), out)?,

        TokenWord => push_text(out, &element_text(&elem)),
        TokenComma => push_text(out, ","),
        TokenSemicolon => push_text(out, ";"),
        TokenSlash => push_text(out, "/"),
        TokenAsterisk => push_text(out, "∗"),
        TokenApostrophe => push_text(out, "′"),
        TokenAtSign => push_text(out, "@"),
        TokenDitto => push_text(out, "\""),
        TokenLParen => push_text(out, "("),
        TokenRParen => push_text(out, ")"),
        TokenLBracket => push_text(out, "["),
        TokenRBracket => push_text(out, "]"),
        TokenTilde => push_text(out, "\u{00A0}"),
        TokenHash => push_text(out, "#"),

        TokenAmpersand => out.push(MathNode::CellBreak),
        ItemNewLine => out.push(MathNode::RowBreak),

        ItemTypstCode => return Err(MathFailure::unsupported(element_text(&elem))),

        TokenWhiteSpace | TokenLineBreak | TokenLBrace | TokenRBrace | TokenDollar
        | TokenBeginMath | TokenEndMath | TokenComment | ItemBlockComment
        | ClauseCommandName | ItemBegin | ItemEnd => {}
    }
    Ok(())
}

/// Append plain text, merging with a preceding plain run
fn push_text(out: &mut Vec<MathNode>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(MathNode::Text { text: prev, font }) = out.last_mut() {
        if *font == TextFont::default() {
            prev.push_str(text);
            return;
        }
    }
    out.push(MathNode::text(text));
}

/// Take the node a script attaches to
///
/// Only the last character of a merged plain run is the base, so `ab^2`
/// raises `b` alone.
fn pop_base(out: &mut Vec<MathNode>) -> Option<MathNode> {
    match out.pop() {
        Some(MathNode::Text { text, font }) if font == TextFont::default() => {
            let mut chars: Vec<char> = text.chars().collect();
            let last = chars.pop()?;
            if !chars.is_empty() {
                out.push(MathNode::text(chars.into_iter().collect::<String>()));
            }
            Some(MathNode::text(last.to_string()))
        }
        other => other,
    }
}

fn into_content(node: MathNode) -> Vec<MathNode> {
    match node {
        MathNode::Group(children) => children,
        other => vec![other],
    }
}

fn attach(node: &SyntaxNode, out: &mut Vec<MathNode>) -> Result<(), MathFailure> {
    enum Slot {
        Sub,
        Sup,
    }

    let mut pending = None;
    let mut sub = None;
    let mut sup = None;

    for child in node.children_with_tokens() {
        match child.kind() {
            SyntaxKind::TokenUnderscore => pending = Some(Slot::Sub),
            SyntaxKind::TokenCaret => pending = Some(Slot::Sup),
            SyntaxKind::TokenWhiteSpace | SyntaxKind::TokenLineBreak => {}
            _ => match pending.take() {
                Some(slot) => {
                    let mut script = Vec::new();
                    push_element(child, &mut script)?;
                    let script: Vec<MathNode> = fold_operators(script)
                        .into_iter()
                        .flat_map(into_content)
                        .collect();
                    match slot {
                        Slot::Sub => sub = Some(script),
                        Slot::Sup => sup = Some(script),
                    }
                }
                // Base carried inside the component
                None => push_element(child, out)?,
            },
        }
    }

    if sub.is_none() && sup.is_none() {
        return Err(MathFailure::unsupported("script without argument"));
    }

    let base = pop_base(out);
    out.push(attach_scripts(base, sub, sup));
    Ok(())
}

fn attach_scripts(
    base: Option<MathNode>,
    sub: Option<Vec<MathNode>>,
    sup: Option<Vec<MathNode>>,
) -> MathNode {
    match base {
        Some(MathNode::Nary {
            chr,
            integral,
            sub: s0,
            sup: p0,
            body,
        }) if body.is_empty()
            && (sub.is_none() || s0.is_none())
            && (sup.is_none() || p0.is_none()) =>
        {
            MathNode::Nary {
                chr,
                integral,
                sub: sub.or(s0),
                sup: sup.or(p0),
                body,
            }
        }
        Some(MathNode::Script {
            base,
            sub: s0,
            sup: p0,
        }) if (sub.is_none() || s0.is_none()) && (sup.is_none() || p0.is_none()) => {
            MathNode::Script {
                base,
                sub: sub.or(s0),
                sup: sup.or(p0),
            }
        }
        Some(MathNode::Text { text, font })
            if font.function && sup.is_none() && LIMIT_FUNCTIONS.contains(&text.as_str()) =>
        {
            MathNode::Limit {
                base: vec![MathNode::Text { text, font }],
                below: sub.unwrap_or_default(),
            }
        }
        other => MathNode::Script {
            base: other.map(into_content).unwrap_or_default(),
            sub,
            sup,
        },
    }
}

/// Give each big operator the node that follows it as its operand
fn fold_operators(nodes: Vec<MathNode>) -> Vec<MathNode> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut iter = nodes.into_iter().peekable();
    while let Some(node) = iter.next() {
        match node {
            MathNode::Nary {
                chr,
                integral,
                sub,
                sup,
                body,
            } if body.is_empty() => {
                let body = iter
                    .next_if(|n| !n.is_break())
                    .map(into_content)
                    .unwrap_or_default();
                out.push(MathNode::Nary {
                    chr,
                    integral,
                    sub,
                    sup,
                    body,
                });
            }
            other => out.push(other),
        }
    }
    out
}

fn delimited(node: &SyntaxNode) -> Result<MathNode, MathFailure> {
    let mut open = None;
    let mut close = None;
    let mut body = Vec::new();

    for child in node.children_with_tokens() {
        if child.kind() != SyntaxKind::ClauseLR {
            push_element(child, &mut body)?;
            continue;
        }
        let text = element_text(&child);
        let text = text.trim();
        if let Some(rest) = text.strip_prefix("\\left") {
            open = Some(lr_delimiter(rest)?);
        } else if let Some(rest) = text.strip_prefix("\\right") {
            close = Some(lr_delimiter(rest)?);
        }
    }

    Ok(MathNode::Delimited {
        open: open.unwrap_or_default(),
        close: close.unwrap_or_default(),
        body: fold_operators(body),
    })
}

fn lr_delimiter(token: &str) -> Result<String, MathFailure> {
    delimiter_char(token)
        .map(String::from)
        .ok_or_else(|| MathFailure::unsupported(format!("delimiter {}", token.trim())))
}

// ============================================================================
// Commands
// ============================================================================

/// Required and optional argument nodes of a command, in order
fn arguments(node: &SyntaxNode) -> (Vec<SyntaxNode>, Vec<SyntaxNode>) {
    let mut required = Vec::new();
    let mut optional = Vec::new();
    for child in node.children() {
        if child.kind() != SyntaxKind::ClauseArgument {
            continue;
        }
        if child.children().any(|c| c.kind() == SyntaxKind::ItemBracket) {
            optional.push(child);
        } else {
            required.push(child);
        }
    }
    (required, optional)
}

/// Lower an argument, dropping its braces or brackets
fn convert_arg(arg: &SyntaxNode) -> Result<Vec<MathNode>, MathFailure> {
    let mut out = Vec::new();
    for child in arg.children_with_tokens() {
        match (child.kind(), child) {
            (SyntaxKind::ItemCurly | SyntaxKind::ItemBracket, SyntaxElement::Node(group)) => {
                for inner in group.children_with_tokens() {
                    match inner.kind() {
                        SyntaxKind::TokenLBrace
                        | SyntaxKind::TokenRBrace
                        | SyntaxKind::TokenLBracket
                        | SyntaxKind::TokenRBracket => {}
                        _ => push_element(inner, &mut out)?,
                    }
                }
            }
            (_, other) => push_element(other, &mut out)?,
        }
    }
    Ok(fold_operators(out))
}

/// Raw text of an argument without its braces
fn raw_arg(arg: &SyntaxNode) -> String {
    let text = arg.text().to_string();
    let text = text.trim();
    let text = text.strip_prefix('{').unwrap_or(text);
    let text = text.strip_suffix('}').unwrap_or(text);
    text.to_string()
}

fn required_arg(
    name: &str,
    required: &[SyntaxNode],
    index: usize,
) -> Result<Vec<MathNode>, MathFailure> {
    let arg = required
        .get(index)
        .ok_or_else(|| MathFailure::unsupported(format!("\\{} without argument", name)))?;
    convert_arg(arg)
}

fn command(node: &SyntaxNode, out: &mut Vec<MathNode>) -> Result<(), MathFailure> {
    let cmd = CmdItem::cast(node.clone())
        .ok_or_else(|| MathFailure::failed("malformed command node"))?;
    let name = cmd
        .name_tok()
        .map(|t| t.text().trim_start_matches('\\').to_string())
        .unwrap_or_default();
    let name = name.as_str();
    let (required, optional) = arguments(node);

    match name {
        "frac" | "dfrac" | "tfrac" | "cfrac" => {
            out.push(MathNode::Frac {
                num: required_arg(name, &required, 0)?,
                den: required_arg(name, &required, 1)?,
                bar: true,
            });
            return Ok(());
        }
        "binom" | "dbinom" | "tbinom" => {
            let frac = MathNode::Frac {
                num: required_arg(name, &required, 0)?,
                den: required_arg(name, &required, 1)?,
                bar: false,
            };
            out.push(MathNode::Delimited {
                open: "(".into(),
                close: ")".into(),
                body: vec![frac],
            });
            return Ok(());
        }
        "sqrt" => {
            let degree = optional.first().map(convert_arg).transpose()?;
            out.push(MathNode::Radical {
                degree,
                body: required_arg(name, &required, 0)?,
            });
            return Ok(());
        }
        "overline" | "underline" => {
            out.push(MathNode::Bar {
                top: name == "overline",
                body: required_arg(name, &required, 0)?,
            });
            return Ok(());
        }
        _ => {}
    }

    if let Some(&chr) = BIG_OPERATORS.get(name) {
        out.push(MathNode::Nary {
            chr,
            integral: name.ends_with("int"),
            sub: None,
            sup: None,
            body: Vec::new(),
        });
    } else if FUNCTION_NAMES.contains(name) {
        out.push(MathNode::Text {
            text: name.to_string(),
            font: TextFont::function(),
        });
    } else if let Some(&chr) = ACCENTS.get(name) {
        out.push(MathNode::Accent {
            chr,
            body: required_arg(name, &required, 0)?,
        });
    } else if let Some(&value) = FONT_COMMANDS.get(name) {
        let font = TextFont::from_command(value);
        let arg = required
            .first()
            .ok_or_else(|| MathFailure::unsupported(format!("\\{} without argument", name)))?;
        if name.starts_with("text") || name == "operatorname" {
            out.push(MathNode::Text {
                text: raw_arg(arg),
                font,
            });
        } else {
            let mut nodes = convert_arg(arg)?;
            apply_font(&mut nodes, font);
            out.push(MathNode::Group(nodes));
        }
    } else if STYLE_DIRECTIVES.contains(name) {
        // sizing only
    } else if let Some(&space) = MATH_SPACES.get(name) {
        push_text(out, space);
    } else if let Some(&symbol) = MATH_SYMBOLS.get(name) {
        push_text(out, symbol);
    } else {
        return Err(MathFailure::unsupported(format!("\\{}", name)));
    }
    Ok(())
}

fn apply_font(nodes: &mut [MathNode], font: TextFont) {
    for node in nodes {
        match node {
            MathNode::Text { font: f, .. } => *f = font,
            MathNode::Group(children) => apply_font(children, font),
            MathNode::Script { base, .. } => apply_font(base, font),
            _ => {}
        }
    }
}

/// `\,`, `\{`, `\%` and friends
fn command_symbol(text: &str, out: &mut Vec<MathNode>) -> Result<(), MathFailure> {
    let name = text.trim_start_matches('\\');
    if let Some(&space) = MATH_SPACES.get(name) {
        push_text(out, space);
    } else if let Some(&symbol) = MATH_SYMBOLS.get(name) {
        push_text(out, symbol);
    } else if name.chars().count() == 1 && !name.chars().all(char::is_alphanumeric) {
        push_text(out, name);
    } else {
        return Err(MathFailure::unsupported(text.to_string()));
    }
    Ok(())
}

// ============================================================================
// Environments
// ============================================================================

fn environment(node: &SyntaxNode) -> Result<MathNode, MathFailure> {
    let env = EnvItem::cast(node.clone())
        .ok_or_else(|| MathFailure::failed("malformed environment node"))?;
    let name = env
        .name_tok()
        .map(|t| t.text().to_string())
        .unwrap_or_default();

    let mut body = Vec::new();
    for child in node.children_with_tokens() {
        match child.kind() {
            SyntaxKind::ItemBegin | SyntaxKind::ItemEnd => continue,
            _ => push_element(child, &mut body)?,
        }
    }
    let rows = split_rows(body);

    let matrix = |left_aligned| MathNode::Matrix {
        rows: rows.clone(),
        left_aligned,
    };
    let wrap = |open: &str, close: &str, inner: MathNode| MathNode::Delimited {
        open: open.to_string(),
        close: close.to_string(),
        body: vec![inner],
    };

    let node = match name.as_str() {
        "matrix" | "smallmatrix" => matrix(false),
        "pmatrix" => wrap("(", ")", matrix(false)),
        "bmatrix" => wrap("[", "]", matrix(false)),
        "Bmatrix" => wrap("{", "}", matrix(false)),
        "vmatrix" => wrap("|", "|", matrix(false)),
        "Vmatrix" => wrap("‖", "‖", matrix(false)),
        "cases" => wrap("{", "", matrix(true)),
        "aligned" | "gathered" | "split" => MathNode::EqArray {
            rows: rows.iter().map(|cells| cells.concat()).collect(),
        },
        other => {
            return Err(MathFailure::unsupported(format!(
                "environment {}",
                other
            )))
        }
    };
    Ok(node)
}

/// Split environment content on `\\` and `&`
///
/// A trailing empty row (content ending in `\\`) is dropped.
fn split_rows(nodes: Vec<MathNode>) -> Vec<Vec<Vec<MathNode>>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell = Vec::new();

    for node in nodes {
        match node {
            MathNode::CellBreak => row.push(fold_operators(std::mem::take(&mut cell))),
            MathNode::RowBreak => {
                row.push(fold_operators(std::mem::take(&mut cell)));
                rows.push(std::mem::take(&mut row));
            }
            other => cell.push(other),
        }
    }
    row.push(fold_operators(cell));
    let trailing_empty = row.len() == 1 && row[0].is_empty();
    if !trailing_empty || rows.is_empty() {
        rows.push(row);
    }
    rows
}

fn contains_break(nodes: &[MathNode]) -> bool {
    nodes.iter().any(|node| match node {
        MathNode::CellBreak | MathNode::RowBreak => true,
        MathNode::Text { .. } => false,
        MathNode::Frac { num, den, .. } => contains_break(num) || contains_break(den),
        MathNode::Radical { degree, body } => {
            degree.as_deref().is_some_and(contains_break) || contains_break(body)
        }
        MathNode::Script { base, sub, sup } => {
            contains_break(base)
                || sub.as_deref().is_some_and(contains_break)
                || sup.as_deref().is_some_and(contains_break)
        }
        MathNode::Nary { sub, sup, body, .. } => {
            contains_break(body)
                || sub.as_deref().is_some_and(contains_break)
                || sup.as_deref().is_some_and(contains_break)
        }
        MathNode::Limit { base, below } => contains_break(base) || contains_break(below),
        MathNode::Delimited { body, .. }
        | MathNode::Accent { body, .. }
        | MathNode::Bar { body, .. }
        | MathNode::Group(body) => contains_break(body),
        MathNode::Matrix { rows, .. } => rows.iter().flatten().any(|c| contains_break(c)),
        MathNode::EqArray { rows } => rows.iter().any(|r| contains_break(r)),
    })
}

// ============================================================================
// Serialization
// ============================================================================

const MATH_RUN_FONT: &str =
    r#"<w:rPr><w:rFonts w:ascii="Cambria Math" w:hAnsi="Cambria Math"/></w:rPr>"#;

/// Serialize an equation tree
pub fn write_omml(nodes: &[MathNode], display: bool) -> String {
    let mut out = String::new();
    if display {
        out.push_str("<m:oMathPara>");
    }
    out.push_str("<m:oMath>");
    write_nodes(nodes, &mut out);
    out.push_str("</m:oMath>");
    if display {
        out.push_str("</m:oMathPara>");
    }
    out
}

fn write_nodes(nodes: &[MathNode], out: &mut String) {
    for node in nodes {
        write_node(node, out);
    }
}

fn write_arg(tag: &str, nodes: &[MathNode], out: &mut String) {
    if nodes.is_empty() {
        let _ = write!(out, "<m:{}/>", tag);
    } else {
        let _ = write!(out, "<m:{}>", tag);
        write_nodes(nodes, out);
        let _ = write!(out, "</m:{}>", tag);
    }
}

fn write_node(node: &MathNode, out: &mut String) {
    match node {
        MathNode::Text { text, font } => {
            out.push_str("<m:r>");
            if font.sty.is_some() || font.scr.is_some() {
                out.push_str("<m:rPr>");
                if let Some(scr) = font.scr {
                    let _ = write!(out, r#"<m:scr m:val="{}"/>"#, scr);
                }
                if let Some(sty) = font.sty {
                    let _ = write!(out, r#"<m:sty m:val="{}"/>"#, sty);
                }
                out.push_str("</m:rPr>");
            }
            out.push_str(MATH_RUN_FONT);
            let _ = write!(
                out,
                r#"<m:t xml:space="preserve">{}</m:t></m:r>"#,
                escape(text.as_str())
            );
        }
        MathNode::Frac { num, den, bar } => {
            out.push_str("<m:f>");
            if !bar {
                out.push_str(r#"<m:fPr><m:type m:val="noBar"/></m:fPr>"#);
            }
            write_arg("num", num, out);
            write_arg("den", den, out);
            out.push_str("</m:f>");
        }
        MathNode::Radical { degree, body } => {
            out.push_str("<m:rad>");
            match degree {
                Some(degree) => write_arg("deg", degree, out),
                None => out.push_str(r#"<m:radPr><m:degHide m:val="1"/></m:radPr><m:deg/>"#),
            }
            write_arg("e", body, out);
            out.push_str("</m:rad>");
        }
        MathNode::Script { base, sub, sup } => {
            let tag = match (sub, sup) {
                (Some(_), Some(_)) => "sSubSup",
                (Some(_), None) => "sSub",
                (None, Some(_)) => "sSup",
                (None, None) => {
                    write_nodes(base, out);
                    return;
                }
            };
            let _ = write!(out, "<m:{}>", tag);
            write_arg("e", base, out);
            if let Some(sub) = sub {
                write_arg("sub", sub, out);
            }
            if let Some(sup) = sup {
                write_arg("sup", sup, out);
            }
            let _ = write!(out, "</m:{}>", tag);
        }
        MathNode::Nary {
            chr,
            integral,
            sub,
            sup,
            body,
        } => {
            out.push_str("<m:nary><m:naryPr>");
            let _ = write!(out, r#"<m:chr m:val="{}"/>"#, chr);
            let loc = if *integral { "subSup" } else { "undOvr" };
            let _ = write!(out, r#"<m:limLoc m:val="{}"/>"#, loc);
            if sub.is_none() {
                out.push_str(r#"<m:subHide m:val="1"/>"#);
            }
            if sup.is_none() {
                out.push_str(r#"<m:supHide m:val="1"/>"#);
            }
            out.push_str("</m:naryPr>");
            write_arg("sub", sub.as_deref().unwrap_or_default(), out);
            write_arg("sup", sup.as_deref().unwrap_or_default(), out);
            write_arg("e", body, out);
            out.push_str("</m:nary>");
        }
        MathNode::Limit { base, below } => {
            out.push_str("<m:limLow>");
            write_arg("e", base, out);
            write_arg("lim", below, out);
            out.push_str("</m:limLow>");
        }
        MathNode::Delimited { open, close, body } => {
            let _ = write!(
                out,
                r#"<m:d><m:dPr><m:begChr m:val="{}"/><m:endChr m:val="{}"/></m:dPr>"#,
                escape(open.as_str()),
                escape(close.as_str())
            );
            write_arg("e", body, out);
            out.push_str("</m:d>");
        }
        MathNode::Accent { chr, body } => {
            let _ = write!(out, r#"<m:acc><m:accPr><m:chr m:val="{}"/></m:accPr>"#, chr);
            write_arg("e", body, out);
            out.push_str("</m:acc>");
        }
        MathNode::Bar { top, body } => {
            let pos = if *top { "top" } else { "bot" };
            let _ = write!(out, r#"<m:bar><m:barPr><m:pos m:val="{}"/></m:barPr>"#, pos);
            write_arg("e", body, out);
            out.push_str("</m:bar>");
        }
        MathNode::Matrix { rows, left_aligned } => {
            let cols = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
            let jc = if *left_aligned { "left" } else { "center" };
            let _ = write!(
                out,
                r#"<m:m><m:mPr><m:mcs><m:mc><m:mcPr><m:count m:val="{}"/><m:mcJc m:val="{}"/></m:mcPr></m:mc></m:mcs></m:mPr>"#,
                cols, jc
            );
            for row in rows {
                out.push_str("<m:mr>");
                for i in 0..cols {
                    write_arg("e", row.get(i).map(Vec::as_slice).unwrap_or_default(), out);
                }
                out.push_str("</m:mr>");
            }
            out.push_str("</m:m>");
        }
        MathNode::EqArray { rows } => {
            out.push_str("<m:eqArr>");
            for row in rows {
                write_arg("e", row, out);
            }
            out.push_str("</m:eqArr>");
        }
        MathNode::Group(children) => write_nodes(children, out),
        MathNode::CellBreak | MathNode::RowBreak => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn omml(expr: &str) -> String {
        latex_to_omml(expr, false).unwrap()
    }

    #[test]
    fn test_symbols_and_text() {
        let xml = omml(r"\alpha + 1");
        assert!(xml.starts_with("<m:oMath>"));
        assert!(xml.contains("α"));
        assert!(xml.contains("+"));
        assert!(xml.contains("Cambria Math"));
    }

    #[test]
    fn test_display_wraps_paragraph() {
        let xml = latex_to_omml("x", true).unwrap();
        assert!(xml.starts_with("<m:oMathPara><m:oMath>"));
        assert!(xml.ends_with("</m:oMath></m:oMathPara>"));
    }

    #[test]
    fn test_fraction_and_root() {
        let xml = omml(r"\frac{a}{b} + \sqrt{x}");
        assert!(xml.contains("<m:f><m:num>"));
        assert!(xml.contains("<m:den>"));
        assert!(xml.contains("<m:rad>"));
        assert!(xml.contains("degHide"));
    }

    #[test]
    fn test_scripts() {
        assert!(omml("x^2").contains("<m:sSup>"));
        assert!(omml("x_i").contains("<m:sSub>"));
    }

    #[test]
    fn test_big_operator() {
        let xml = omml(r"\sum_{i=1}^{n} i");
        assert!(xml.contains("<m:nary>"));
        assert!(xml.contains("∑"));
        assert!(xml.contains("undOvr"));
    }

    #[test]
    fn test_matrix_environment() {
        let xml = omml(r"\begin{pmatrix} a & b \\ c & d \end{pmatrix}");
        assert!(xml.contains("<m:m>"));
        assert!(xml.contains(r#"<m:begChr m:val="("/>"#));
        assert_eq!(xml.matches("<m:mr>").count(), 2);
        assert!(xml.contains(r#"<m:count m:val="2"/>"#));
    }

    #[test]
    fn test_unknown_command_is_unsupported() {
        assert!(matches!(
            latex_to_omml(r"\foobarbaz{x}", false),
            Err(MathFailure::UnsupportedConstruct(_))
        ));
        assert!(matches!(
            latex_to_omml("  ", false),
            Err(MathFailure::UnsupportedConstruct(_))
        ));
    }

    #[test]
    fn test_text_is_escaped() {
        let xml = omml("a < b");
        assert!(xml.contains("&lt;"));
        assert!(!xml.contains("a < b"));
    }

    #[test]
    fn test_writer_without_parser() {
        let nodes = vec![MathNode::Nary {
            chr: "∫",
            integral: true,
            sub: Some(vec![MathNode::text("0")]),
            sup: None,
            body: vec![MathNode::text("f")],
        }];
        let xml = write_omml(&nodes, false);
        assert!(xml.contains(r#"<m:limLoc m:val="subSup"/>"#));
        assert!(xml.contains(r#"<m:supHide m:val="1"/>"#));
        assert!(xml.contains("<m:sup/>"));
        assert!(xml.contains("<m:e><m:r>"));
    }

    #[test]
    fn test_split_rows_drops_trailing_empty_row() {
        let rows = split_rows(vec![
            MathNode::text("a"),
            MathNode::CellBreak,
            MathNode::text("b"),
            MathNode::RowBreak,
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 2);
    }

    #[test]
    fn test_pop_base_splits_word() {
        let mut out = vec![MathNode::text("ab")];
        let base = pop_base(&mut out);
        assert_eq!(base, Some(MathNode::text("b")));
        assert_eq!(out, vec![MathNode::text("a")]);
    }
}
