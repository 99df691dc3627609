//! Table records and pipe-table models
//!
//! Cell contents live in the markup; a [`TableRecord`] only carries the
//! editor's caption metadata. [`TableModel`] turns the rows of one
//! `TableRows` block into a rectangular grid.

use serde::{Deserialize, Serialize};

use super::figures::RecordId;

/// Caption metadata of a table created in the editor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableRecord {
    pub id: RecordId,
    pub caption: String,
    pub chapter: u32,
    /// Display number, e.g. "Bảng 1.1"
    pub number: String,
}

/// A rectangular table; the first source row is the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableModel {
    pub header: Vec<String>,
    pub body: Vec<Vec<String>>,
    pub columns: usize,
    /// Some source row had fewer cells than the widest row
    pub ragged: bool,
}

impl TableModel {
    /// Pad every row to the widest row; `None` for an empty row list
    pub fn from_rows(rows: Vec<Vec<String>>) -> Option<Self> {
        let columns = rows.iter().map(Vec::len).max()?;
        if columns == 0 {
            return None;
        }
        let ragged = rows.iter().any(|r| r.len() != columns);

        let mut rows = rows.into_iter().map(|mut row| {
            row.resize(columns, String::new());
            row
        });
        let header = rows.next()?;
        Some(Self {
            header,
            body: rows.collect(),
            columns,
            ragged,
        })
    }

    /// All rows, header first
    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        std::iter::once(self.header.as_slice()).chain(self.body.iter().map(Vec::as_slice))
    }

    pub fn row_count(&self) -> usize {
        1 + self.body.len()
    }
}
