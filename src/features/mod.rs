//! Feature modules - the editor's record lists
//!
//! - Figures: placeholder resolution and image loading
//! - Tables: caption records and ragged-row padding
//! - References: citation records and APA formatting
//! - Abbreviations: grouping and sorting for the front-matter table

pub mod abbreviations;
pub mod figures;
pub mod refs;
pub mod tables;

// Re-export commonly used types
pub use abbreviations::{group_entries, AbbreviationEntry, AbbreviationGroups, EntryKind};
pub use figures::{Figure, FigureProblem, FigureResolver, RecordId, ResolvedFigure};
pub use refs::{format_citation_apa, reference_entries, Citation};
pub use tables::{TableModel, TableRecord};
