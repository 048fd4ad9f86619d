//! # Parsed Font Model
//!
//! The in-memory decoding of one TrueType/OpenType file, in the shape the
//! PDF embedding code consumes it: raw table payloads for writing a subset,
//! the glyph offset table, character-to-glyph maps and per-character widths.
//!
//! Every container here is owned. A `ParsedFont` handed out by the store is
//! exclusively the caller's, so subsetting or rewriting symbol tables for one
//! document never shows up in another.

pub mod parser;
pub mod reader;

pub use parser::{FontParser, TtfParser};
pub use reader::FontReader;

use std::collections::HashMap;

/// Symbol-data group holding `[advance_width, left_side_bearing]`.
pub const METRICS_GROUP: &str = "metrics";
/// Symbol-data group holding the component glyph IDs of a composite glyph.
pub const COMPONENTS_GROUP: &str = "components";

/// One record of the sfnt table directory.
#[derive(Debug, PartialEq, Eq, Default)]
pub struct TableDescription {
    pub offset: u32,
    pub length: u32,
    /// Table checksum split into `[high16, low16]`.
    pub checksum: Vec<u16>,
}

impl TableDescription {
    /// The checksum as the single `u32` stored in the file.
    pub fn checksum_u32(&self) -> u32 {
        match self.checksum.as_slice() {
            [hi, lo] => (u32::from(*hi) << 16) | u32::from(*lo),
            _ => 0,
        }
    }
}

/// Font-wide metrics used for the PDF font descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub cap_height: i16,
    pub italic_angle: f32,
    pub underline_position: i16,
    pub underline_thickness: i16,
    /// `[x_min, y_min, x_max, y_max]`
    pub bbox: [i16; 4],
    /// Advance of glyph 0, used for unmapped character slots.
    pub default_width: u16,
    /// PDF font descriptor flags.
    pub flags: u32,
}

/// A fully parsed font file.
///
/// `Clone` is a deep copy (see [`crate::copy::deep_copy`]).
#[derive(Debug, PartialEq, Default)]
pub struct ParsedFont {
    /// Byte length of the source file when it was loaded.
    pub original_size: u64,
    /// The buffer the font was parsed from, retained for re-reads.
    pub reader: FontReader,
    pub table_descriptions: HashMap<String, TableDescription>,
    /// Raw table payloads keyed by tag, ready to be rewritten for embedding.
    pub out_tables_data: HashMap<String, Vec<u8>>,
    /// Glyph ID → byte offset into `glyf` (the decoded `loca` table).
    pub symbol_position: Vec<u32>,
    /// Unicode code point → glyph ID.
    pub char_symbol_dictionary: HashMap<u32, u16>,
    /// Advance width per character slot, indexed by code point.
    pub char_widths: Vec<u16>,
    /// Glyph ID → named groups of per-glyph data.
    pub symbol_data: HashMap<u16, HashMap<String, Vec<i32>>>,
    /// Legacy (non-Unicode) cmap code → glyph ID.
    pub code_symbol_dictionary: HashMap<u32, u16>,
    pub metrics: FontMetrics,
    pub name: Option<String>,
}

impl Clone for ParsedFont {
    fn clone(&self) -> Self {
        crate::copy::deep_copy(self)
    }
}

impl ParsedFont {
    /// True if the font has a table directory entry for `tag`.
    pub fn has_table(&self, tag: &str) -> bool {
        self.table_descriptions.contains_key(tag)
    }

    /// Glyph ID for a character, if the Unicode cmap maps it.
    pub fn glyph_id(&self, ch: char) -> Option<u16> {
        self.char_symbol_dictionary.get(&(ch as u32)).copied()
    }

    /// Advance width of a character in font units.
    pub fn char_width(&self, ch: char) -> u16 {
        self.char_widths
            .get(ch as usize)
            .copied()
            .unwrap_or(self.metrics.default_width)
    }

    /// Number of glyphs described by the `loca` table.
    pub fn glyph_count(&self) -> usize {
        self.symbol_position.len().saturating_sub(1)
    }

    /// Component glyph IDs if `gid` is a composite glyph.
    pub fn components(&self, gid: u16) -> Option<&[i32]> {
        self.symbol_data
            .get(&gid)
            .and_then(|groups| groups.get(COMPONENTS_GROUP))
            .map(Vec::as_slice)
    }
}
