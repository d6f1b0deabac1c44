//! Script storage backends.
//!
//! The console reads scripts through [`ScriptStorage`] so that the
//! file-system layout stays with the host game. [`FileStorage`] searches a
//! list of directories; [`MemoryStorage`] serves scripts from memory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::StorageError;

/// Where a script is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageLocation {
    /// Every search path, first match wins.
    #[default]
    All,
    /// Only the save path (the first search path).
    Save,
    /// The name is a path used as given.
    Absolute,
}

/// Source of console scripts.
pub trait ScriptStorage: Send + Sync {
    /// Read a script and return its lines.
    fn read_lines(&self, name: &str, location: StorageLocation) -> Result<Vec<String>, StorageError>;
}

/// Split script text into lines, dropping a UTF-8 byte order mark and
/// carriage returns.
pub fn script_lines(text: &str) -> Vec<String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}

/// Reads scripts from the file system.
#[derive(Debug, Clone)]
pub struct FileStorage {
    search_paths: Vec<PathBuf>,
}

impl FileStorage {
    /// Create a storage searching `search_paths` in order. The first path is
    /// the save path.
    pub fn new<I, P>(search_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    fn read(path: &Path) -> Result<Vec<String>, StorageError> {
        fs::read_to_string(path)
            .map(|text| script_lines(&text))
            .map_err(|source| StorageError::Io {
                path: path.display().to_string(),
                source,
            })
    }
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new(["."])
    }
}

impl ScriptStorage for FileStorage {
    fn read_lines(&self, name: &str, location: StorageLocation) -> Result<Vec<String>, StorageError> {
        match location {
            StorageLocation::Absolute => Self::read(Path::new(name)),
            StorageLocation::Save => match self.search_paths.first() {
                Some(dir) => Self::read(&dir.join(name)),
                None => Err(StorageError::NotFound(name.to_string())),
            },
            StorageLocation::All => self
                .search_paths
                .iter()
                .map(|dir| dir.join(name))
                .find(|path| path.is_file())
                .map(|path| Self::read(&path))
                .unwrap_or_else(|| Err(StorageError::NotFound(name.to_string()))),
        }
    }
}

/// Serves scripts registered in memory. Locations are ignored.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    scripts: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a script.
    pub fn insert(&mut self, name: impl Into<String>, contents: impl Into<String>) {
        self.scripts.insert(name.into(), contents.into());
    }

    pub fn with_script(mut self, name: impl Into<String>, contents: impl Into<String>) -> Self {
        self.insert(name, contents);
        self
    }
}

impl ScriptStorage for MemoryStorage {
    fn read_lines(&self, name: &str, _location: StorageLocation) -> Result<Vec<String>, StorageError> {
        self.scripts
            .get(name)
            .map(|text| script_lines(text))
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }
}
