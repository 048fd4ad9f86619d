//! # Font File Loading
//!
//! Reads a font file through a [`FontSource`] and hands the bytes to a
//! [`FontParser`]. No caching happens here; the store layers that on top.
//!
//! The filesystem is behind a trait so fonts can come from disk, from
//! memory (WASM builds, bundled fonts) or from an instrumented source in
//! tests.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::FontError;
use crate::font::{FontParser, FontReader, ParsedFont, TtfParser};

/// Where font bytes come from.
pub trait FontSource: Send + Sync {
    /// Size of the file in bytes.
    fn stat(&self, path: &Path) -> io::Result<u64>;
    /// The whole file.
    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads fonts from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskSource;

impl FontSource for DiskSource {
    fn stat(&self, path: &Path) -> io::Result<u64> {
        fs::metadata(path).map(|m| m.len())
    }

    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

/// Serves fonts from an in-memory table of path → bytes.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_file(mut self, path: impl Into<PathBuf>, data: Vec<u8>) -> Self {
        self.insert(path, data);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, data: Vec<u8>) {
        self.files.insert(path.into(), data);
    }

    fn get(&self, path: &Path) -> io::Result<&Vec<u8>> {
        self.files.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no in-memory font at '{}'", path.display()),
            )
        })
    }
}

impl FontSource for MemorySource {
    fn stat(&self, path: &Path) -> io::Result<u64> {
        self.get(path).map(|data| data.len() as u64)
    }

    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.get(path).cloned()
    }
}

/// Turns a path into a freshly parsed font.
pub struct FontFileLoader {
    source: Box<dyn FontSource>,
    parser: Box<dyn FontParser>,
}

impl fmt::Debug for FontFileLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFileLoader").finish_non_exhaustive()
    }
}

impl Default for FontFileLoader {
    fn default() -> Self {
        Self::new(DiskSource, TtfParser)
    }
}

impl FontFileLoader {
    pub fn new(source: impl FontSource + 'static, parser: impl FontParser + 'static) -> Self {
        Self {
            source: Box::new(source),
            parser: Box::new(parser),
        }
    }

    /// Stat, read and parse the font at `path`.
    ///
    /// Returns the font together with the file size reported by `stat`,
    /// which is also stored as the font's `original_size`.
    pub fn load(&self, path: &Path) -> Result<(ParsedFont, u64), FontError> {
        if path.as_os_str().is_empty() {
            return Err(FontError::InvalidArgument);
        }

        let original_size = self
            .source
            .stat(path)
            .map_err(|e| FontError::io(path, e))?;
        let bytes = self
            .source
            .read_all(path)
            .map_err(|e| FontError::io(path, e))?;

        let mut font = self
            .parser
            .parse(FontReader::new(bytes))
            .map_err(|source| FontError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        font.original_size = original_size;

        Ok((font, original_size))
    }
}
