//! # thesisdoc
//!
//! Compiles thesis markup into a Word (DOCX) document.
//!
//! ## Features
//!
//! - **Numbered headings**: five levels, Roman-numeral chapters, hierarchical or flat numbering
//! - **Native equations**: `$...$` and `$$...$$` become editable OMML, with an image and a placeholder fallback
//! - **Figures and tables**: `[Hình 1.2: ...]` placeholders resolved against figure records, pipe tables with captions
//! - **Front matter**: table of contents, lists of figures/tables, abbreviations, reference list
//! - **Diagnostics**: a lint pass that reports everything the compiler would degrade
//!
//! ## Usage Examples
//!
//! ### Markup to document model
//!
//! ```rust
//! use thesisdoc::{compile_markup, Settings};
//!
//! let output = compile_markup("# Mở đầu\n## Bối cảnh\nNội dung.\n", &Settings::default());
//! let texts: Vec<String> = output.content.paragraphs().map(|p| p.text()).collect();
//! assert!(texts.contains(&"CHƯƠNG I: MỞ ĐẦU".to_string()));
//! assert!(texts.contains(&"1.1. Bối cảnh".to_string()));
//! ```
//!
//! ### Project to DOCX bytes
//!
//! ```rust
//! use thesisdoc::{to_docx_bytes, CompileOptions, MemoryFileResolver, Project};
//!
//! let project = Project::from_markup("Công thức $\\frac{a}{b}$.\n");
//! let output = to_docx_bytes(&project, &CompileOptions::text_only(), &MemoryFileResolver::new()).unwrap();
//! assert!(output.content.starts_with(b"PK"));
//! ```

/// Core compilation modules
pub mod core;

/// Data layer - labels, units and symbol tables
pub mod data;

/// Document model, styles and package writer
pub mod docx;

/// Feature modules - figures, tables, references, abbreviations
pub mod features;

/// Utility modules
pub mod utils;

pub mod config;
pub mod project;

use std::io::Cursor;

// Re-export the compilation entry points
pub use core::assembler::{compile_document, compile_with_renderer, export_docx, ExportReport};
pub use core::math::{latex_to_omml, MathRenderer};
pub use core::numbering::to_roman;

pub use config::{CompileOptions, PaperSize, Settings};
pub use docx::Document;
pub use project::Project;

// Re-export feature modules
pub use features::abbreviations;
pub use features::figures;
pub use features::refs;
pub use features::tables;

// Re-export utilities
pub use utils::diagnostics;
pub use utils::error::{CompileError, CompileOutput, CompileResult, CompileWarning};
pub use utils::files::{FileResolver, MemoryFileResolver, StdFileResolver};

/// Compile bare markup without invoking external tools
///
/// Figure paths are resolved against the working directory; equations the
/// native converter rejects become placeholders.
pub fn compile_markup(markup: &str, settings: &Settings) -> CompileOutput<Document> {
    let project = Project::from_markup(markup).with_settings(settings.clone());
    compile_document(&project, &CompileOptions::text_only(), &StdFileResolver::new())
}

/// Compile a project into the bytes of a `.docx` package
pub fn to_docx_bytes(
    project: &Project,
    options: &CompileOptions,
    files: &dyn FileResolver,
) -> CompileResult<CompileOutput<Vec<u8>>> {
    let output = compile_document(project, options, files);
    let cursor = docx::write_docx(&output.content, &project.settings, Cursor::new(Vec::new()))?;
    Ok(CompileOutput::with_warnings(
        cursor.into_inner(),
        output.warnings,
    ))
}
