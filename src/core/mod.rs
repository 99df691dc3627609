//! Core compilation modules
//!
//! - `blocks`: line classifier
//! - `inline`: emphasis and math span tokenizer
//! - `numbering`: heading counters and Roman numerals
//! - `math`: equation rendering (native, raster, placeholder)
//! - `assembler`: drives a whole compilation

pub mod assembler;
pub mod blocks;
pub mod inline;
pub mod math;
pub mod numbering;

pub use assembler::{compile_document, compile_with_renderer, export_docx, ExportReport};
pub use blocks::{parse_blocks, BlockParser, ParsedBlock, SourceBlock};
pub use inline::{tokenize, InlineRun};
pub use math::{MathFailure, MathOutcome, MathRenderer, MathRendering, MathStage};
pub use numbering::{to_roman, HeadingText, NumberingState};
