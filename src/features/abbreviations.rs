//! Abbreviations and symbols for the front-matter table
//!
//! Entries accept the key spellings of the editor's import format
//! (`abbr`/`viettatt`, `full`/`diengiai`/`meaning`), so a list exported by
//! any editor version loads unchanged.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum EntryKind {
    #[default]
    Abbreviation,
    Symbol,
}

/// Anything other than "symbol" is an abbreviation, `null` included
impl From<Option<String>> for EntryKind {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(kind) if kind.trim().eq_ignore_ascii_case("symbol") => EntryKind::Symbol,
            _ => EntryKind::Abbreviation,
        }
    }
}

impl From<EntryKind> for String {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Abbreviation => "abbreviation".to_string(),
            EntryKind::Symbol => "symbol".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbbreviationEntry {
    #[serde(alias = "abbr", alias = "viettatt")]
    pub abbreviation: String,
    #[serde(
        rename = "fullForm",
        alias = "full_form",
        alias = "full",
        alias = "diengiai",
        alias = "meaning"
    )]
    pub full_form: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: EntryKind,
}

impl AbbreviationEntry {
    pub fn new(abbreviation: &str, full_form: &str, kind: EntryKind) -> Self {
        Self {
            abbreviation: abbreviation.to_string(),
            full_form: full_form.to_string(),
            kind,
        }
    }

    fn is_complete(&self) -> bool {
        !self.abbreviation.trim().is_empty() && !self.full_form.trim().is_empty()
    }
}

/// Entries split by kind, each group sorted alphabetically
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbbreviationGroups {
    pub abbreviations: Vec<AbbreviationEntry>,
    pub symbols: Vec<AbbreviationEntry>,
}

impl AbbreviationGroups {
    pub fn is_empty(&self) -> bool {
        self.abbreviations.is_empty() && self.symbols.is_empty()
    }
}

/// Drop incomplete entries, split by kind and sort case-insensitively
pub fn group_entries(entries: &[AbbreviationEntry]) -> AbbreviationGroups {
    let mut groups = AbbreviationGroups::default();
    for entry in entries.iter().filter(|e| e.is_complete()) {
        let entry = AbbreviationEntry {
            abbreviation: entry.abbreviation.trim().to_string(),
            full_form: entry.full_form.trim().to_string(),
            kind: entry.kind,
        };
        match entry.kind {
            EntryKind::Abbreviation => groups.abbreviations.push(entry),
            EntryKind::Symbol => groups.symbols.push(entry),
        }
    }
    groups
        .abbreviations
        .sort_by_cached_key(|e| e.abbreviation.to_lowercase());
    groups
        .symbols
        .sort_by_cached_key(|e| e.abbreviation.to_lowercase());
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping_and_sorting() {
        let entries = vec![
            AbbreviationEntry::new("CNN", "Convolutional Neural Network", EntryKind::Abbreviation),
            AbbreviationEntry::new("α", "Hệ số học", EntryKind::Symbol),
            AbbreviationEntry::new("ai", "Trí tuệ nhân tạo", EntryKind::Abbreviation),
            AbbreviationEntry::new("", "bỏ", EntryKind::Abbreviation),
            AbbreviationEntry::new("X", " ", EntryKind::Symbol),
        ];
        let groups = group_entries(&entries);
        let abbrs: Vec<&str> = groups
            .abbreviations
            .iter()
            .map(|e| e.abbreviation.as_str())
            .collect();
        assert_eq!(abbrs, vec!["ai", "CNN"]);
        assert_eq!(groups.symbols.len(), 1);
        assert!(!groups.is_empty());
    }

    #[test]
    fn test_import_key_aliases() {
        let json = r#"[
            {"abbreviation": "AI", "fullForm": "Trí tuệ nhân tạo"},
            {"abbr": "ML", "full": "Học máy", "type": "abbreviation"},
            {"viettatt": "CSDL", "diengiai": "Cơ sở dữ liệu"},
            {"abbreviation": "λ", "meaning": "Bước sóng", "type": "symbol"},
            {"abbreviation": "Z", "fullForm": "Tập số nguyên", "type": "other"}
        ]"#;
        let entries: Vec<AbbreviationEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[1].abbreviation, "ML");
        assert_eq!(entries[1].full_form, "Học máy");
        assert_eq!(entries[2].full_form, "Cơ sở dữ liệu");
        assert_eq!(entries[3].kind, EntryKind::Symbol);
        assert_eq!(entries[4].kind, EntryKind::Abbreviation);
    }

    #[test]
    fn test_null_kind_is_abbreviation() {
        let json = r#"[
            {"abbr": "GV", "full": "Giảng viên", "type": null},
            {"abbr": "μ", "full": "Độ nhớt", "kind": "Symbol"}
        ]"#;
        let entries: Vec<AbbreviationEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].kind, EntryKind::Abbreviation);
        assert_eq!(entries[1].kind, EntryKind::Symbol);
    }

    #[test]
    fn test_kind_serializes_as_string() {
        let entry = AbbreviationEntry::new("π", "Pi", EntryKind::Symbol);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "symbol");
        assert_eq!(value["fullForm"], "Pi");
    }
}
