//! Structured error types for the font cache.
//!
//! Filesystem, parser, argument and configuration failures each get their
//! own variant so callers can tell them apart without string matching.

use std::io;
use std::path::PathBuf;

/// The unified error type returned by the loader and the store.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// An empty font path was supplied.
    #[error("font path must not be empty")]
    InvalidArgument,

    /// The font file does not exist.
    #[error("font file '{}' not found: {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The font file exists but could not be stat'd or read.
    #[error("failed to read font file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The parser rejected the font bytes.
    #[error("failed to parse font '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// Loading finished without an error but produced nothing usable.
    #[error("can't load font from '{}'", .path.display())]
    LoadFailed { path: PathBuf },

    /// The store configuration failed to deserialize.
    #[error("invalid font cache configuration: {source}{}", hint_suffix(.hint))]
    Config {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
}

impl FontError {
    /// Wrap an I/O error, keeping `NotFound` distinguishable from other failures.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            FontError::NotFound { path, source }
        } else {
            FontError::Io { path, source }
        }
    }

    /// True for `NotFound` and `Io`.
    pub fn is_io(&self) -> bool {
        matches!(self, FontError::NotFound { .. } | FontError::Io { .. })
    }
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for FontError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the configuration schema. Expected keys are `fontDir` and `preload`.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FontError::Config { source: e, hint }
    }
}

/// Errors raised while decoding font bytes.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A read ran past the end of the buffer.
    #[error("unexpected end of font data at offset {offset} (wanted {wanted} bytes)")]
    UnexpectedEof { offset: usize, wanted: usize },

    /// The file is a format this parser does not handle.
    #[error("unsupported font format: {0}")]
    Unsupported(String),

    /// A table record points outside the file.
    #[error("table '{tag}' at offset {offset} with length {length} lies outside the font data")]
    TableOutOfBounds { tag: String, offset: u32, length: u32 },

    /// `ttf-parser` rejected the face.
    #[error("malformed font face: {0}")]
    Face(#[from] ttf_parser::FaceParsingError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguished() {
        let err = FontError::io("/nope.ttf", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, FontError::NotFound { .. }));
        assert!(err.is_io());

        let err = FontError::io("/nope.ttf", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, FontError::Io { .. }));
        assert!(err.is_io());
    }

    #[test]
    fn test_config_error_has_hint() {
        let err: FontError = serde_json::from_str::<serde_json::Value>("{\"a\": }")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.contains("Hint: Check for trailing commas"), "{}", msg);
    }

    #[test]
    fn test_load_failed_names_path() {
        let err = FontError::LoadFailed { path: "/fonts/a.ttf".into() };
        assert_eq!(err.to_string(), "can't load font from '/fonts/a.ttf'");
    }
}
