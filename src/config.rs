//! Store configuration.
//!
//! Deserialized from JSON:
//!
//! ```json
//! { "fontDir": "/usr/share/fonts/truetype", "preload": ["dejavu/DejaVuSans.ttf"] }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::FontError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory that relative font paths are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_dir: Option<PathBuf>,

    /// Fonts loaded into the cache when the store is built.
    #[serde(default)]
    pub preload: Vec<PathBuf>,
}

impl StoreConfig {
    pub fn from_json(json: &str) -> Result<Self, FontError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve `path` against `font_dir`. Absolute and empty paths pass through.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.font_dir {
            Some(dir) if path.is_relative() && !path.as_os_str().is_empty() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}
