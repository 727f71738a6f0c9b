use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;
use crate::walk::WalkFilter;

/// Name of the per-project settings file looked up in the first root.
pub const SETTINGS_FILE: &str = "phpns.toml";

/// Scan settings. Every key is optional; missing keys take the defaults.
///
/// ```toml
/// folders_to_exclude = [".git", "node_modules", "storage"]
/// file_extensions_to_include = [".php"]
/// cache_dir = "/tmp/phpns"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub folders_to_exclude: Vec<String>,
    pub file_extensions_to_include: Vec<String>,
    pub cache_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            folders_to_exclude: [".git", ".svn", ".hg", "node_modules"]
                .into_iter()
                .map(String::from)
                .collect(),
            file_extensions_to_include: vec![".php".to_string()],
            cache_dir: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.message().to_string(),
        })
    }

    /// `explicit` if given, else `phpns.toml` in the first root, else defaults.
    pub fn discover(explicit: Option<&Path>, roots: &[PathBuf]) -> Result<Self, Error> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(candidate) = roots.first().map(|r| r.join(SETTINGS_FILE)) {
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "using project settings");
                return Self::load(&candidate);
            }
        }
        Ok(Self::default())
    }

    #[must_use]
    pub fn filter(&self) -> WalkFilter<'_> {
        WalkFilter {
            folders_to_exclude: &self.folders_to_exclude,
            file_extensions_to_include: &self.file_extensions_to_include,
        }
    }

    /// Directory holding persisted indexes.
    ///
    /// `cache_dir` setting, else the platform cache dir, else `.phpns-cache`
    /// under the first root.
    #[must_use]
    pub fn cache_root(&self, roots: &[PathBuf]) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        if let Some(dir) = dirs::cache_dir() {
            return dir.join("phpns");
        }
        roots
            .first()
            .map_or_else(|| PathBuf::from(".phpns-cache"), |r| r.join(".phpns-cache"))
    }
}
