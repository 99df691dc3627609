//! Utility modules
//!
//! - Diagnostics and error reporting
//! - Asset file resolution
//! - Error types and result types

pub mod diagnostics;
pub mod error;
pub mod files;

// Re-export commonly used items
pub use diagnostics::{check_markup, format_diagnostics, CheckResult, Diagnostic, DiagnosticLevel};
pub use error::{CompileError, CompileOutput, CompileResult, CompileWarning};
pub use files::{FileResolveError, FileResolver, MemoryFileResolver, StdFileResolver};
