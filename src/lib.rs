//! # fontcache
//!
//! A process-wide cache of parsed font files for PDF font embedding.
//!
//! Parsing a TrueType file is expensive, and a document pipeline asks for
//! the same handful of fonts over and over, often from several render jobs
//! at once. Each job also needs to *mutate* what it gets: subsetting drops
//! tables, embedding rewrites the code-to-glyph maps. So the cache parses a
//! path once, keeps the result, and hands every caller its own deep copy.
//!
//! ## Architecture
//!
//! ```text
//! caller
//!   ↓
//! [store]   — FontFileStore::get(path): RwLock'd map of path → entry
//!   ↓ miss                          ↓ hit
//! [loader]  — stat + read via FontSource
//!   ↓
//! [font]    — FontParser (TtfParser) decodes into ParsedFont
//!   ↓
//! [copy]    — deep_copy: every container freshly allocated
//!   ↓
//! caller owns a ParsedFont
//! ```

pub mod config;
pub mod copy;
pub mod error;
pub mod font;
pub mod loader;
pub mod sample;
pub mod store;

pub use config::StoreConfig;
pub use copy::{copy_font, deep_copy};
pub use error::{FontError, ParseError};
pub use font::{FontMetrics, FontParser, FontReader, ParsedFont, TableDescription, TtfParser};
pub use loader::{DiskSource, FontFileLoader, FontSource, MemorySource};
pub use store::{global, install_global, FontFileStore};

use std::path::Path;

/// Load a font through the process-wide store.
///
/// Returns a copy the caller may mutate freely, plus the size of the font
/// file when it was first loaded.
pub fn load_font(path: impl AsRef<Path>) -> Result<(ParsedFont, u64), FontError> {
    global().get(path)
}
