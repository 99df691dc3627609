//! Asset file access for figure embedding
//!
//! Figure records carry free-form paths written by the editor: absolute
//! paths, or paths relative to the project directory. The `FileResolver`
//! trait hides where the bytes actually come from so that compilation can
//! run against the real filesystem (CLI) or preloaded memory (tests).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Locates and reads figure assets
///
/// `locate` turns a record path into a concrete location; `read_bytes`
/// takes that location, never the raw record path.
pub trait FileResolver: Send + Sync {
    fn locate(&self, path: &str) -> Option<String>;

    fn read_bytes(&self, location: &str) -> Result<Vec<u8>, FileResolveError>;

    fn file_exists(&self, path: &str) -> bool {
        self.locate(path).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResolveError {
    Missing(String),
    Unreadable { location: String, reason: String },
}

impl fmt::Display for FileResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileResolveError::Missing(location) => write!(f, "no asset at {}", location),
            FileResolveError::Unreadable { location, reason } => {
                write!(f, "cannot read {}: {}", location, reason)
            }
        }
    }
}

impl std::error::Error for FileResolveError {}

/// Editor paths may use either separator; keep one form for lookups
fn normalize_separators(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    path.strip_prefix("./").map(str::to_string).unwrap_or(path)
}

/// Filesystem resolver used by the CLI
///
/// Relative paths are tried against the project directory, then against
/// the working directory.
#[derive(Debug, Clone, Default)]
pub struct StdFileResolver {
    project_dir: Option<PathBuf>,
}

impl StdFileResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(project_dir: impl AsRef<Path>) -> Self {
        Self {
            project_dir: Some(project_dir.as_ref().to_path_buf()),
        }
    }

    fn candidates(&self, path: &str) -> Vec<PathBuf> {
        let relative = PathBuf::from(normalize_separators(path));
        if relative.is_absolute() {
            return vec![relative];
        }
        let mut out = Vec::with_capacity(2);
        if let Some(dir) = &self.project_dir {
            out.push(dir.join(&relative));
        }
        out.push(relative);
        out
    }
}

impl FileResolver for StdFileResolver {
    fn locate(&self, path: &str) -> Option<String> {
        if path.trim().is_empty() {
            return None;
        }
        self.candidates(path)
            .into_iter()
            .find(|candidate| candidate.is_file())
            .map(|found| found.to_string_lossy().into_owned())
    }

    fn read_bytes(&self, location: &str) -> Result<Vec<u8>, FileResolveError> {
        std::fs::read(location).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FileResolveError::Missing(location.to_string()),
            _ => FileResolveError::Unreadable {
                location: location.to_string(),
                reason: e.to_string(),
            },
        })
    }
}

/// Preloaded assets keyed by path, for tests and embedding hosts
#[derive(Debug, Clone, Default)]
pub struct MemoryFileResolver {
    assets: HashMap<String, Vec<u8>>,
    project_dir: Option<String>,
}

impl MemoryFileResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(project_dir: &str) -> Self {
        Self {
            assets: HashMap::new(),
            project_dir: Some(normalize_separators(project_dir).trim_end_matches('/').to_string()),
        }
    }

    pub fn add_file(&mut self, path: &str, content: impl Into<Vec<u8>>) {
        self.assets.insert(normalize_separators(path), content.into());
    }
}

impl FileResolver for MemoryFileResolver {
    fn locate(&self, path: &str) -> Option<String> {
        let key = normalize_separators(path);
        if self.assets.contains_key(&key) {
            return Some(key);
        }
        let dir = self.project_dir.as_ref()?;
        if key.starts_with('/') {
            return None;
        }
        let joined = format!("{}/{}", dir, key);
        self.assets.contains_key(&joined).then_some(joined)
    }

    fn read_bytes(&self, location: &str) -> Result<Vec<u8>, FileResolveError> {
        self.assets
            .get(location)
            .cloned()
            .ok_or_else(|| FileResolveError::Missing(location.to_string()))
    }
}
