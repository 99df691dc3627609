//! LaTeX math command tables for native equation output
//!
//! Commands are stored without the leading backslash.

use phf::{phf_map, phf_set};

/// Commands that stand for a single character
pub static MATH_SYMBOLS: phf::Map<&'static str, &'static str> = phf_map! {
    // Greek lowercase
    "alpha" => "α", "beta" => "β", "gamma" => "γ", "delta" => "δ",
    "epsilon" => "ϵ", "varepsilon" => "ε", "zeta" => "ζ", "eta" => "η",
    "theta" => "θ", "vartheta" => "ϑ", "iota" => "ι", "kappa" => "κ",
    "lambda" => "λ", "mu" => "μ", "nu" => "ν", "xi" => "ξ",
    "omicron" => "ο", "pi" => "π", "varpi" => "ϖ", "rho" => "ρ",
    "varrho" => "ϱ", "sigma" => "σ", "varsigma" => "ς", "tau" => "τ",
    "upsilon" => "υ", "phi" => "ϕ", "varphi" => "φ", "chi" => "χ",
    "psi" => "ψ", "omega" => "ω",
    // Greek uppercase
    "Gamma" => "Γ", "Delta" => "Δ", "Theta" => "Θ", "Lambda" => "Λ",
    "Xi" => "Ξ", "Pi" => "Π", "Sigma" => "Σ", "Upsilon" => "Υ",
    "Phi" => "Φ", "Psi" => "Ψ", "Omega" => "Ω",

    // Binary operators
    "pm" => "±", "mp" => "∓", "times" => "×", "div" => "÷",
    "cdot" => "⋅", "ast" => "∗", "star" => "⋆", "circ" => "∘",
    "bullet" => "∙", "oplus" => "⊕", "ominus" => "⊖", "otimes" => "⊗",
    "oslash" => "⊘", "odot" => "⊙", "cap" => "∩", "cup" => "∪",
    "sqcap" => "⊓", "sqcup" => "⊔", "wedge" => "∧", "land" => "∧",
    "vee" => "∨", "lor" => "∨", "setminus" => "∖", "dagger" => "†",
    "ddagger" => "‡", "amalg" => "⨿",

    // Relations
    "leq" => "≤", "le" => "≤", "geq" => "≥", "ge" => "≥",
    "neq" => "≠", "ne" => "≠", "leqslant" => "⩽", "geqslant" => "⩾",
    "ll" => "≪", "gg" => "≫", "approx" => "≈", "equiv" => "≡",
    "sim" => "∼", "simeq" => "≃", "cong" => "≅", "propto" => "∝",
    "in" => "∈", "notin" => "∉", "ni" => "∋", "subset" => "⊂",
    "supset" => "⊃", "subseteq" => "⊆", "supseteq" => "⊇", "perp" => "⊥",
    "parallel" => "∥", "mid" => "∣", "models" => "⊨", "vdash" => "⊢",
    "prec" => "≺", "succ" => "≻", "preceq" => "⪯", "succeq" => "⪰",
    "doteq" => "≐", "asymp" => "≍",

    // Arrows
    "to" => "→", "rightarrow" => "→", "leftarrow" => "←", "gets" => "←",
    "leftrightarrow" => "↔", "Rightarrow" => "⇒", "Leftarrow" => "⇐",
    "Leftrightarrow" => "⇔", "implies" => "⟹", "impliedby" => "⟸",
    "iff" => "⟺", "mapsto" => "↦", "longrightarrow" => "⟶",
    "longleftarrow" => "⟵", "Longrightarrow" => "⟹", "Longleftarrow" => "⟸",
    "uparrow" => "↑", "downarrow" => "↓", "updownarrow" => "↕",
    "Uparrow" => "⇑", "Downarrow" => "⇓", "nearrow" => "↗",
    "searrow" => "↘", "swarrow" => "↙", "nwarrow" => "↖",
    "hookrightarrow" => "↪", "hookleftarrow" => "↩",
    "rightleftharpoons" => "⇌",

    // Miscellaneous
    "infty" => "∞", "partial" => "∂", "nabla" => "∇", "forall" => "∀",
    "exists" => "∃", "nexists" => "∄", "emptyset" => "∅", "varnothing" => "∅",
    "neg" => "¬", "lnot" => "¬", "angle" => "∠", "triangle" => "△",
    "hbar" => "ℏ", "ell" => "ℓ", "Re" => "ℜ", "Im" => "ℑ",
    "aleph" => "ℵ", "wp" => "℘", "prime" => "′", "degree" => "°",
    "ldots" => "…", "dots" => "…", "cdots" => "⋯", "vdots" => "⋮",
    "ddots" => "⋱", "therefore" => "∴", "because" => "∵",
    "top" => "⊤", "bot" => "⊥", "square" => "□", "Box" => "□",
    "checkmark" => "✓",

    // Delimiters as commands
    "langle" => "⟨", "rangle" => "⟩", "lceil" => "⌈", "rceil" => "⌉",
    "lfloor" => "⌊", "rfloor" => "⌋", "lbrace" => "{", "rbrace" => "}",
    "vert" => "|", "Vert" => "‖", "lvert" => "|", "rvert" => "|",
    "lVert" => "‖", "rVert" => "‖",

    // Escaped characters
    "{" => "{", "}" => "}", "%" => "%", "$" => "$", "&" => "&",
    "#" => "#", "_" => "_", "|" => "‖",
};

/// Spacing commands and the text they become
pub static MATH_SPACES: phf::Map<&'static str, &'static str> = phf_map! {
    "," => "\u{2009}",
    ":" => "\u{205F}",
    ">" => "\u{205F}",
    ";" => "\u{2004}",
    "!" => "",
    " " => " ",
    "quad" => "\u{2003}",
    "qquad" => "\u{2003}\u{2003}",
    "enspace" => "\u{2002}",
    "thinspace" => "\u{2009}",
    "medspace" => "\u{205F}",
    "thickspace" => "\u{2004}",
    "negthinspace" => "",
};

/// N-ary operators, rendered with limits
pub static BIG_OPERATORS: phf::Map<&'static str, &'static str> = phf_map! {
    "sum" => "∑",
    "prod" => "∏",
    "coprod" => "∐",
    "int" => "∫",
    "iint" => "∬",
    "iiint" => "∭",
    "oint" => "∮",
    "bigcup" => "⋃",
    "bigcap" => "⋂",
    "bigoplus" => "⨁",
    "bigotimes" => "⨂",
    "bigvee" => "⋁",
    "bigwedge" => "⋀",
    "bigsqcup" => "⨆",
};

/// Upright function names (`\sin x`, `\lim_{x \to 0}`)
pub static FUNCTION_NAMES: phf::Set<&'static str> = phf_set! {
    "sin", "cos", "tan", "cot", "sec", "csc",
    "arcsin", "arccos", "arctan",
    "sinh", "cosh", "tanh", "coth",
    "log", "ln", "lg", "exp",
    "lim", "liminf", "limsup", "max", "min", "sup", "inf",
    "det", "dim", "ker", "deg", "gcd", "hom", "arg", "Pr",
    "mod", "bmod",
};

/// Accent commands and the combining character placed over the base
pub static ACCENTS: phf::Map<&'static str, &'static str> = phf_map! {
    "hat" => "\u{0302}",
    "widehat" => "\u{0302}",
    "tilde" => "\u{0303}",
    "widetilde" => "\u{0303}",
    "bar" => "\u{0305}",
    "vec" => "\u{20D7}",
    "dot" => "\u{0307}",
    "ddot" => "\u{0308}",
    "acute" => "\u{0301}",
    "grave" => "\u{0300}",
    "check" => "\u{030C}",
    "breve" => "\u{0306}",
    "overrightarrow" => "\u{20D7}",
    "overleftarrow" => "\u{20D6}",
};

/// Font commands and the OMML style/script they select
pub static FONT_COMMANDS: phf::Map<&'static str, &'static str> = phf_map! {
    "mathrm" => "p",
    "text" => "p",
    "textrm" => "p",
    "textnormal" => "p",
    "operatorname" => "p",
    "mathbf" => "b",
    "textbf" => "b",
    "boldsymbol" => "bi",
    "mathit" => "i",
    "textit" => "i",
    "mathbb" => "double-struck",
    "mathcal" => "script",
    "mathscr" => "script",
    "mathfrak" => "fraktur",
    "mathsf" => "sans-serif",
    "mathtt" => "monospace",
};

/// Style directives that only change sizing and can be dropped
pub static STYLE_DIRECTIVES: phf::Set<&'static str> = phf_set! {
    "displaystyle", "textstyle", "scriptstyle", "scriptscriptstyle",
    "limits", "nolimits",
};

/// Delimiter token after `\left` / `\right` as a character
pub fn delimiter_char(token: &str) -> Option<&'static str> {
    let token = token.trim();
    match token {
        "." => Some(""),
        "(" => Some("("),
        ")" => Some(")"),
        "[" => Some("["),
        "]" => Some("]"),
        "|" => Some("|"),
        "\\{" | "\\lbrace" => Some("{"),
        "\\}" | "\\rbrace" => Some("}"),
        "\\|" | "\\Vert" => Some("‖"),
        _ => token
            .strip_prefix('\\')
            .and_then(|name| MATH_SYMBOLS.get(name).copied()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(MATH_SYMBOLS.get("alpha"), Some(&"α"));
        assert_eq!(MATH_SYMBOLS.get("ge"), MATH_SYMBOLS.get("geq"));
        assert!(MATH_SYMBOLS.get("frac").is_none());
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(delimiter_char("("), Some("("));
        assert_eq!(delimiter_char("\\{"), Some("{"));
        assert_eq!(delimiter_char("\\langle"), Some("⟨"));
        assert_eq!(delimiter_char("."), Some(""));
        assert_eq!(delimiter_char("\\foo"), None);
    }

    #[test]
    fn test_operator_tables_disjoint() {
        for (name, _) in BIG_OPERATORS.entries() {
            assert!(!FUNCTION_NAMES.contains(name));
            assert!(MATH_SYMBOLS.get(name).is_none());
        }
    }
}
