//! Flat-file cache: one JSON object mapping keys to texts

use super::{CacheError, RequestCache};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// File name used under the system temp directory
pub const DEFAULT_CACHE_FILE: &str = "openai_cache.json";

/// Cache persisted as a single JSON object.
///
/// The file is read on every lookup and rewritten on every store, so several
/// clients may share it as long as they do not write at the same time.
#[derive(Debug, Clone)]
pub struct FileRequestCache {
    path: PathBuf,
}

impl FileRequestCache {
    /// Open the cache at `path`, creating an empty file if none exists.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache = Self { path: path.into() };
        if !cache.path.exists() {
            cache.write(&Map::new())?;
        } else if !cache.path.is_file() {
            return Err(CacheError::Io {
                path: cache.display_path(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "cache path is not a regular file",
                ),
            });
        }
        Ok(cache)
    }

    /// Cache file in the system temp directory
    pub fn default_location() -> PathBuf {
        std::env::temp_dir().join(DEFAULT_CACHE_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    fn read(&self) -> Result<Map<String, Value>, CacheError> {
        let content = fs::read_to_string(&self.path).map_err(|e| CacheError::Io {
            path: self.display_path(),
            source: e,
        })?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(CacheError::Corrupt {
                path: self.display_path(),
                message: "top-level value is not an object".to_string(),
            }),
            Err(e) => Err(CacheError::Corrupt {
                path: self.display_path(),
                message: e.to_string(),
            }),
        }
    }

    fn write(&self, data: &Map<String, Value>) -> Result<(), CacheError> {
        let content = serde_json::to_string(data)?;
        fs::write(&self.path, content).map_err(|e| CacheError::Io {
            path: self.display_path(),
            source: e,
        })
    }
}

impl RequestCache for FileRequestCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let data = self.read()?;
        Ok(data.get(key).and_then(Value::as_str).map(str::to_string))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut data = match self.read() {
            Ok(data) => data,
            Err(CacheError::Corrupt { path, message }) => {
                warn!("Discarding corrupt cache file '{}': {}", path, message);
                Map::new()
            }
            Err(e) => return Err(e),
        };
        data.insert(key.to_string(), Value::String(value.to_string()));
        self.write(&data)
    }

    fn clear(&mut self) -> Result<(), CacheError> {
        self.write(&Map::new())
    }
}
