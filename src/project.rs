//! Project input: markup plus settings and the editor's record lists
//!
//! The JSON layout is the editor's save/export payload. Only `content` is
//! required; settings are overlaid on the defaults and unknown setting keys
//! (the editor's preview calibration values, for instance) are dropped with a
//! warning.

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::config::Settings;
use crate::features::abbreviations::AbbreviationEntry;
use crate::features::figures::Figure;
use crate::features::refs::Citation;
use crate::features::tables::TableRecord;
use crate::utils::error::{CompileError, CompileOutput, CompileResult, CompileWarning};

/// Everything one compilation reads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Project {
    pub content: String,
    pub settings: Settings,
    pub figures: Vec<Figure>,
    pub tables: Vec<TableRecord>,
    pub citations: Vec<Citation>,
    pub abbreviations: Vec<AbbreviationEntry>,
}

#[derive(Deserialize)]
struct ProjectFile {
    content: String,
    #[serde(default)]
    settings: Option<Value>,
    #[serde(default)]
    figures: Vec<Figure>,
    #[serde(default)]
    tables: Vec<TableRecord>,
    #[serde(default)]
    citations: Vec<Citation>,
    #[serde(default)]
    abbreviations: Vec<AbbreviationEntry>,
}

impl Project {
    /// A bare markup document with default settings
    pub fn from_markup(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn from_json_str(text: &str) -> CompileResult<CompileOutput<Self>> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> CompileResult<CompileOutput<Self>> {
        if !value.is_object() {
            return Err(CompileError::invalid("project must be a JSON object"));
        }
        let file: ProjectFile = serde_json::from_value(value)?;

        let mut warnings = Vec::new();
        let settings = match file.settings {
            Some(Value::Null) | None => Settings::default(),
            Some(map) => {
                let (settings, dropped) = Settings::from_value_lenient(map)?;
                warnings.extend(dropped.iter().map(|key| {
                    CompileWarning::new(format!("ignored unknown settings key '{}'", key))
                }));
                settings
            }
        };

        let project = Self {
            content: file.content,
            settings,
            figures: file.figures,
            tables: file.tables,
            citations: file.citations,
            abbreviations: file.abbreviations,
        };
        Ok(CompileOutput::with_warnings(project, warnings))
    }

    /// Load a `.json` project or a plain markup file
    pub fn load(path: &Path) -> CompileResult<CompileOutput<Self>> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CompileError::io(format!("{}: {}", path.display(), e)))?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_str(&text)
        } else {
            Ok(CompileOutput::new(Self::from_markup(text)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::abbreviations::EntryKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_editor_payload() {
        let value = json!({
            "content": "# Mở đầu\n",
            "settings": {
                "font_size": 14,
                "h1_prefix": "CHAPTER",
                "text_density": 1.1,
                "hard_wrap": true
            },
            "figures": [{"id": 1, "path": "a.png", "caption": "A", "chapter": 1, "number": "Hình 1.1"}],
            "citations": [{"id": 1, "author": "A", "year": "2020", "title": "T"}],
            "abbreviations": [{"abbr": "AI", "full": "Trí tuệ nhân tạo"}]
        });
        let output = Project::from_json_value(value).unwrap();
        let project = output.content;

        assert_eq!(project.settings.font_size, 14.0);
        assert_eq!(project.settings.h1_prefix, "CHAPTER");
        assert_eq!(project.figures.len(), 1);
        assert!(project.tables.is_empty());
        assert_eq!(project.abbreviations[0].kind, EntryKind::Abbreviation);

        let messages: Vec<&str> = output.warnings.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().any(|m| m.contains("text_density")));
        assert!(messages.iter().any(|m| m.contains("hard_wrap")));
    }

    #[test]
    fn test_abbreviation_with_null_type_loads() {
        let value = json!({
            "content": "",
            "abbreviations": [{"abbreviation": "SV", "fullForm": "Sinh viên", "type": null}]
        });
        let project = Project::from_json_value(value).unwrap().content;
        assert_eq!(project.abbreviations.len(), 1);
        assert_eq!(project.abbreviations[0].kind, EntryKind::Abbreviation);
    }

    #[test]
    fn test_content_only() {
        let output = Project::from_json_str(r#"{"content": "abc"}"#).unwrap();
        assert!(!output.has_warnings());
        assert_eq!(output.content.settings, Settings::default());
    }

    #[test]
    fn test_invalid_payloads() {
        assert!(Project::from_json_str("[]").is_err());
        assert!(Project::from_json_str(r#"{"settings": {}}"#).is_err());
        assert!(Project::from_json_str(r#"{"content": "", "settings": 3}"#).is_err());
    }

    #[test]
    fn test_load_markup_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("thesis.md");
        std::fs::write(&md, "# A\n").unwrap();
        let project = Project::load(&md).unwrap().content;
        assert_eq!(project.content, "# A\n");

        let js = dir.path().join("thesis.json");
        std::fs::write(&js, r#"{"content": "x"}"#).unwrap();
        assert_eq!(Project::load(&js).unwrap().content.content, "x");

        assert!(Project::load(&dir.path().join("missing.md")).is_err());
    }
}
