//! Citation records and the reference list

use serde::{Deserialize, Serialize};

use super::figures::RecordId;

/// A bibliography entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Citation {
    pub id: RecordId,
    pub author: String,
    pub year: String,
    pub title: String,
    pub publisher: String,
    pub url: String,
    #[serde(alias = "type", alias = "kind")]
    pub citation_type: String,
}

impl Default for Citation {
    fn default() -> Self {
        Self {
            id: RecordId::default(),
            author: String::new(),
            year: String::new(),
            title: String::new(),
            publisher: String::new(),
            url: String::new(),
            citation_type: "book".to_string(),
        }
    }
}

/// APA-style string: `Author (Year). Title. Publisher. Retrieved from URL.`
///
/// A missing year becomes "n.d."; other empty parts are left out.
pub fn format_citation_apa(c: &Citation) -> String {
    let year = if c.year.trim().is_empty() {
        "n.d."
    } else {
        c.year.trim()
    };

    let mut parts = Vec::with_capacity(4);
    if c.author.trim().is_empty() {
        parts.push(format!("({})", year));
    } else {
        parts.push(format!("{} ({})", c.author.trim(), year));
    }
    if !c.title.trim().is_empty() {
        parts.push(c.title.trim().to_string());
    }
    if !c.publisher.trim().is_empty() {
        parts.push(c.publisher.trim().to_string());
    }
    if !c.url.trim().is_empty() {
        parts.push(format!("Retrieved from {}", c.url.trim()));
    }

    let mut out = parts.join(". ");
    out.push('.');
    out
}

/// Numbered reference list entries, "[1] ..." in input order
pub fn reference_entries(citations: &[Citation]) -> Vec<String> {
    citations
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[{}] {}", i + 1, format_citation_apa(c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn citation(author: &str, year: &str, title: &str) -> Citation {
        Citation {
            author: author.into(),
            year: year.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_citation() {
        let c = Citation {
            publisher: "NXB Giáo dục".into(),
            url: "https://example.org".into(),
            ..citation("Nguyễn Văn A", "2020", "Giáo trình")
        };
        assert_eq!(
            format_citation_apa(&c),
            "Nguyễn Văn A (2020). Giáo trình. NXB Giáo dục. Retrieved from https://example.org."
        );
    }

    #[test]
    fn test_missing_parts() {
        assert_eq!(format_citation_apa(&citation("", "", "T")), "(n.d.). T.");
        assert_eq!(format_citation_apa(&citation("A", "1999", "")), "A (1999).");
    }

    #[test]
    fn test_reference_entries_are_numbered() {
        let list = reference_entries(&[citation("A", "1", "x"), citation("B", "2", "y")]);
        assert_eq!(list, vec!["[1] A (1). x.".to_string(), "[2] B (2). y.".to_string()]);
    }

    #[test]
    fn test_deserialize_aliases() {
        let c: Citation = serde_json::from_str(r#"{"id": 1, "author": "A", "type": "web"}"#).unwrap();
        assert_eq!(c.citation_type, "web");
        let c: Citation = serde_json::from_str(r#"{"author": "A"}"#).unwrap();
        assert_eq!(c.citation_type, "book");
    }
}
