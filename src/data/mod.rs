//! Data layer - static tables and constants
//!
//! - Localized labels, style ids and unit conversions
//! - LaTeX command tables for native equations

pub mod constants;
pub mod symbols;

pub use symbols::{
    delimiter_char, ACCENTS, BIG_OPERATORS, FONT_COMMANDS, FUNCTION_NAMES, MATH_SPACES,
    MATH_SYMBOLS, STYLE_DIRECTIVES,
};
