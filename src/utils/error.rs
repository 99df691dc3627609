//! Error handling for thesisdoc compilation
//!
//! Only output failures abort a compilation. Everything else (missing
//! figures, bad equations, ragged tables) degrades in the document and is
//! reported as a [`CompileWarning`].

use std::fmt;

/// Compilation error type
#[derive(Debug, Clone)]
pub enum CompileError {
    /// IO error (output file, settings file, project file)
    IoError { message: String },
    /// The DOCX package could not be assembled
    PackageError { message: String },
    /// Project or settings file is malformed
    SettingsError { message: String },
    /// Input is not a usable project
    InvalidInput { message: String },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::IoError { message } => write!(f, "IO error: {}", message),
            CompileError::PackageError { message } => write!(f, "Package error: {}", message),
            CompileError::SettingsError { message } => write!(f, "Settings error: {}", message),
            CompileError::InvalidInput { message } => write!(f, "Invalid input: {}", message),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<std::io::Error> for CompileError {
    fn from(err: std::io::Error) -> Self {
        CompileError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for CompileError {
    fn from(err: zip::result::ZipError) -> Self {
        CompileError::PackageError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CompileError {
    fn from(err: serde_json::Error) -> Self {
        CompileError::SettingsError {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CompileError {
    fn from(err: toml::de::Error) -> Self {
        CompileError::SettingsError {
            message: err.to_string(),
        }
    }
}

/// Result type for compilation operations
pub type CompileResult<T> = Result<T, CompileError>;

/// Compilation warnings (non-fatal issues)
#[derive(Debug, Clone, PartialEq)]
pub struct CompileWarning {
    pub message: String,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl CompileWarning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            suggestion: None,
        }
    }

    pub fn at_line(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(l) = self.line {
            write!(f, "Warning at line {}: {}", l, self.message)?;
        } else {
            write!(f, "Warning: {}", self.message)?;
        }
        if let Some(ref sug) = self.suggestion {
            write!(f, " ({})", sug)?;
        }
        Ok(())
    }
}

/// Compilation output with optional warnings
#[derive(Debug, Clone)]
pub struct CompileOutput<T> {
    /// The compiled artifact
    pub content: T,
    /// Any warnings generated during compilation
    pub warnings: Vec<CompileWarning>,
}

impl<T> CompileOutput<T> {
    pub fn new(content: T) -> Self {
        Self {
            content,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(content: T, warnings: Vec<CompileWarning>) -> Self {
        Self { content, warnings }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

// Convenience constructors for errors
impl CompileError {
    pub fn io(message: impl Into<String>) -> Self {
        CompileError::IoError {
            message: message.into(),
        }
    }

    pub fn settings(message: impl Into<String>) -> Self {
        CompileError::SettingsError {
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        CompileError::InvalidInput {
            message: message.into(),
        }
    }
}
