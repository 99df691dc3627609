//! Heading numbering
//!
//! A [`NumberingState`] lives for exactly one compilation. Advancing level L
//! increments that counter and zeroes every deeper one, so a section number
//! is never carried over from a previous chapter.

use crate::config::Settings;

/// Deepest heading level
pub const MAX_LEVEL: u8 = 5;

const ROMAN_TABLE: [(u32, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Convert a positive integer to a Roman numeral
///
/// Zero has no Roman form and yields an empty string.
pub fn to_roman(mut n: u32) -> String {
    let mut out = String::new();
    for &(value, symbol) in ROMAN_TABLE.iter() {
        while n >= value {
            out.push_str(symbol);
            n -= value;
        }
    }
    out
}

/// Per-level heading counters (h1..h5)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberingState {
    counters: [u32; MAX_LEVEL as usize],
}

/// Rendered heading text, split where the chapter layout asks for a line break
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingText {
    /// Lines of the heading; more than one only for split chapter headings
    pub lines: Vec<String>,
}

impl HeadingText {
    fn single(text: String) -> Self {
        Self { lines: vec![text] }
    }

    /// Heading text with lines joined by a newline
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }
}

impl NumberingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter (1-based level)
    pub fn counter(&self, level: u8) -> u32 {
        let level = level.clamp(1, MAX_LEVEL);
        self.counters[(level - 1) as usize]
    }

    /// Increment the counter of `level` and reset every deeper counter
    pub fn advance(&mut self, level: u8) {
        let idx = (level.clamp(1, MAX_LEVEL) - 1) as usize;
        self.counters[idx] += 1;
        for deeper in self.counters.iter_mut().skip(idx + 1) {
            *deeper = 0;
        }
    }

    /// Numeric prefix for a sub-heading (level >= 2), e.g. "1.2.3."
    ///
    /// Hierarchical mode starts at the chapter counter; flat mode starts at
    /// the level-2 counter.
    pub fn number_prefix(&self, level: u8, hierarchical: bool) -> String {
        let level = level.clamp(1, MAX_LEVEL) as usize;
        let start = if hierarchical || level == 1 { 0 } else { 1 };
        let mut out = String::new();
        for value in &self.counters[start..level] {
            out.push_str(&value.to_string());
            out.push('.');
        }
        out
    }

    /// Advance the counter for `level` and render the heading title
    pub fn heading(&mut self, level: u8, title: &str, settings: &Settings) -> HeadingText {
        let level = level.clamp(1, MAX_LEVEL);
        self.advance(level);

        if level == 1 {
            return self.chapter_heading(title, settings);
        }

        let title = title.trim();
        if !settings.auto_numbering {
            return HeadingText::single(title.to_string());
        }
        let prefix = self.number_prefix(level, settings.hierarchical_numbering);
        HeadingText::single(format!("{} {}", prefix, title))
    }

    fn chapter_heading(&self, title: &str, settings: &Settings) -> HeadingText {
        let title = title.trim();
        let title = if settings.h1_uppercase {
            title.to_uppercase()
        } else {
            title.to_string()
        };

        if !settings.auto_numbering {
            return HeadingText::single(title);
        }

        let roman = to_roman(self.counter(1));
        let prefix = settings.h1_prefix.trim();

        if settings.h1_split {
            let first = if prefix.is_empty() {
                roman
            } else {
                format!("{} {}", prefix, roman)
            };
            return HeadingText {
                lines: vec![first, title],
            };
        }

        let text = if prefix.is_empty() {
            format!("{}. {}", roman, title)
        } else {
            format!("{} {}: {}", prefix, roman, title)
        };
        HeadingText::single(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn test_roman_known_values() {
        assert_eq!(to_roman(1), "I");
        assert_eq!(to_roman(4), "IV");
        assert_eq!(to_roman(9), "IX");
        assert_eq!(to_roman(14), "XIV");
        assert_eq!(to_roman(40), "XL");
        assert_eq!(to_roman(90), "XC");
        assert_eq!(to_roman(400), "CD");
        assert_eq!(to_roman(1994), "MCMXCIV");
        assert_eq!(to_roman(2024), "MMXXIV");
        assert_eq!(to_roman(3999), "MMMCMXCIX");
    }

    #[test]
    fn test_roman_is_injective() {
        let mut seen = std::collections::HashSet::new();
        for n in 1..=3999 {
            let r = to_roman(n);
            assert!(!r.is_empty());
            assert!(seen.insert(r), "duplicate numeral for {}", n);
        }
    }

    #[test]
    fn test_reset_on_ancestor_increment() {
        let s = settings();
        let mut state = NumberingState::new();
        state.heading(1, "a", &s);
        assert_eq!(state.heading(2, "x", &s).joined(), "1.1. x");
        assert_eq!(state.heading(2, "y", &s).joined(), "1.2. y");
        state.heading(1, "b", &s);
        assert_eq!(state.heading(2, "z", &s).joined(), "2.1. z");
    }

    #[test]
    fn test_deep_levels_reset() {
        let s = settings();
        let mut state = NumberingState::new();
        state.heading(1, "a", &s);
        state.heading(2, "b", &s);
        state.heading(3, "c", &s);
        state.heading(4, "d", &s);
        assert_eq!(state.heading(5, "e", &s).joined(), "1.1.1.1.1. e");
        state.heading(3, "f", &s);
        assert_eq!(state.counter(4), 0);
        assert_eq!(state.counter(5), 0);
        assert_eq!(state.heading(4, "g", &s).joined(), "1.1.2.1. g");
        state.heading(1, "h", &s);
        assert_eq!(state.counter(5), 0);
        assert_eq!(state.heading(3, "i", &s).joined(), "2.0.1. i");
    }

    #[test]
    fn test_flat_numbering() {
        let s = Settings {
            hierarchical_numbering: false,
            ..settings()
        };
        let mut state = NumberingState::new();
        state.heading(1, "a", &s);
        state.heading(2, "b", &s);
        assert_eq!(state.heading(3, "c", &s).joined(), "1.1. c");
        assert_eq!(state.heading(2, "d", &s).joined(), "2. d");
    }

    #[test]
    fn test_chapter_heading_variants() {
        let mut state = NumberingState::new();
        let s = Settings {
            h1_prefix: "CHAPTER".to_string(),
            ..settings()
        };
        assert_eq!(state.heading(1, "Intro", &s).joined(), "CHAPTER I: INTRO");

        let s = Settings {
            h1_prefix: String::new(),
            ..settings()
        };
        assert_eq!(state.heading(1, "Methods", &s).joined(), "II. METHODS");

        let s = Settings {
            h1_split: true,
            ..settings()
        };
        let text = state.heading(1, "Kết quả", &s);
        assert_eq!(text.lines, vec!["CHƯƠNG III".to_string(), "KẾT QUẢ".to_string()]);

        let s = Settings {
            h1_uppercase: false,
            auto_numbering: false,
            ..settings()
        };
        assert_eq!(state.heading(1, "Kết luận", &s).joined(), "Kết luận");
        assert_eq!(state.counter(1), 4);
    }

    #[test]
    fn test_no_auto_numbering_subheading() {
        let s = Settings {
            auto_numbering: false,
            ..settings()
        };
        let mut state = NumberingState::new();
        state.heading(1, "a", &s);
        assert_eq!(state.heading(2, " Background ", &s).joined(), "Background");
    }
}
