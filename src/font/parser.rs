//! # Font Parsing
//!
//! Turns raw sfnt bytes into a [`ParsedFont`].
//!
//! The table directory is walked with the [`FontReader`] cursor so every
//! record, including ones `ttf-parser` has no interest in, lands in
//! `table_descriptions` and `out_tables_data`. Character maps and metrics
//! come from `ttf-parser`. `loca` and composite glyph records are decoded
//! from the raw table bytes.

use std::collections::HashMap;

use log::{debug, trace};
use ttf_parser::GlyphId;

use super::{FontMetrics, FontReader, ParsedFont, TableDescription, COMPONENTS_GROUP, METRICS_GROUP};
use crate::error::ParseError;

/// PDF font descriptor flag bits.
const FLAG_FIXED_PITCH: u32 = 1;
const FLAG_NONSYMBOLIC: u32 = 1 << 5;
const FLAG_ITALIC: u32 = 1 << 6;

/// Character widths are tracked for the Basic Multilingual Plane only.
const MAX_WIDTH_SLOT: u32 = 0xFFFF;

/// Decodes font bytes into a [`ParsedFont`].
///
/// Implementations must return either a fully populated font or an error,
/// never a half-filled result.
pub trait FontParser: Send + Sync {
    fn parse(&self, reader: FontReader) -> Result<ParsedFont, ParseError>;
}

/// The default parser for TrueType and OpenType (CFF) files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TtfParser;

impl FontParser for TtfParser {
    fn parse(&self, mut reader: FontReader) -> Result<ParsedFont, ParseError> {
        let table_descriptions = read_table_directory(&mut reader)?;

        let mut out_tables_data = HashMap::with_capacity(table_descriptions.len());
        for (tag, desc) in &table_descriptions {
            // Bounds were checked while reading the directory
            if let Some(bytes) = reader.slice(desc.offset as usize, desc.length as usize) {
                out_tables_data.insert(tag.clone(), bytes.to_vec());
            }
        }

        let face = read_face(reader.data(), &out_tables_data)?;
        debug!(
            "parsed font {:?}: {} tables, {} glyphs, {} mapped chars",
            face.name,
            table_descriptions.len(),
            face.symbol_position.len().saturating_sub(1),
            face.char_symbol_dictionary.len()
        );

        Ok(ParsedFont {
            original_size: reader.len() as u64,
            reader,
            table_descriptions,
            out_tables_data,
            symbol_position: face.symbol_position,
            char_symbol_dictionary: face.char_symbol_dictionary,
            char_widths: face.char_widths,
            symbol_data: face.symbol_data,
            code_symbol_dictionary: face.code_symbol_dictionary,
            metrics: face.metrics,
            name: face.name,
        })
    }
}

// ─── Table Directory ────────────────────────────────────────────

fn read_table_directory(
    reader: &mut FontReader,
) -> Result<HashMap<String, TableDescription>, ParseError> {
    reader.seek(0)?;
    let version = reader.read_tag()?;
    match &version {
        &[0x00, 0x01, 0x00, 0x00] | b"true" | b"OTTO" => {}
        b"ttcf" => {
            return Err(ParseError::Unsupported(
                "font collections (ttcf) are not supported".to_string(),
            ))
        }
        other => {
            return Err(ParseError::Unsupported(format!(
                "unknown sfnt version {:02X?}",
                other
            )))
        }
    }

    let num_tables = reader.read_u16()?;
    reader.skip(6)?; // searchRange, entrySelector, rangeShift

    let mut tables = HashMap::with_capacity(num_tables as usize);
    for _ in 0..num_tables {
        let tag = String::from_utf8_lossy(&reader.read_tag()?).into_owned();
        let checksum = reader.read_u32()?;
        let offset = reader.read_u32()?;
        let length = reader.read_u32()?;

        if reader.slice(offset as usize, length as usize).is_none() {
            return Err(ParseError::TableOutOfBounds { tag, offset, length });
        }
        trace!("table '{}' offset={} length={}", tag, offset, length);

        tables.insert(
            tag,
            TableDescription {
                offset,
                length,
                checksum: vec![(checksum >> 16) as u16, (checksum & 0xFFFF) as u16],
            },
        );
    }
    Ok(tables)
}

// ─── Face Data ──────────────────────────────────────────────────

struct FaceTables {
    symbol_position: Vec<u32>,
    char_symbol_dictionary: HashMap<u32, u16>,
    char_widths: Vec<u16>,
    symbol_data: HashMap<u16, HashMap<String, Vec<i32>>>,
    code_symbol_dictionary: HashMap<u32, u16>,
    metrics: FontMetrics,
    name: Option<String>,
}

fn read_face(data: &[u8], raw_tables: &HashMap<String, Vec<u8>>) -> Result<FaceTables, ParseError> {
    let face = ttf_parser::Face::parse(data, 0)?;

    let (char_symbol_dictionary, code_symbol_dictionary) = read_cmaps(&face);

    let default_width = face.glyph_hor_advance(GlyphId(0)).unwrap_or(0);
    let char_widths = read_char_widths(&face, &char_symbol_dictionary, default_width);

    let symbol_position = match (raw_tables.get("loca"), raw_tables.get("head")) {
        (Some(loca), Some(head)) => {
            let long_offsets = read_i16(head, 50).unwrap_or(0) != 0;
            parse_loca(loca, long_offsets, face.number_of_glyphs())
        }
        _ => Vec::new(),
    };

    let mut symbol_data: HashMap<u16, HashMap<String, Vec<i32>>> = HashMap::new();
    for gid in 0..face.number_of_glyphs() {
        if let Some(advance) = face.glyph_hor_advance(GlyphId(gid)) {
            let lsb = face.glyph_hor_side_bearing(GlyphId(gid)).unwrap_or(0);
            symbol_data
                .entry(gid)
                .or_default()
                .insert(METRICS_GROUP.to_string(), vec![i32::from(advance), i32::from(lsb)]);
        }
    }
    if let Some(glyf) = raw_tables.get("glyf") {
        for (gid, components) in composite_components(glyf, &symbol_position) {
            symbol_data
                .entry(gid)
                .or_default()
                .insert(COMPONENTS_GROUP.to_string(), components);
        }
    }

    let italic_angle = face.italic_angle();
    let mut flags = FLAG_NONSYMBOLIC;
    if face.is_monospaced() {
        flags |= FLAG_FIXED_PITCH;
    }
    if face.is_italic() || italic_angle != 0.0 {
        flags |= FLAG_ITALIC;
    }
    let bbox = face.global_bounding_box();
    let underline = face.underline_metrics();

    let metrics = FontMetrics {
        units_per_em: face.units_per_em(),
        ascender: face.ascender(),
        descender: face.descender(),
        cap_height: face.capital_height().unwrap_or_else(|| face.ascender()),
        italic_angle,
        underline_position: underline.map_or(0, |m| m.position),
        underline_thickness: underline.map_or(0, |m| m.thickness),
        bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
        default_width,
        flags,
    };

    Ok(FaceTables {
        symbol_position,
        char_symbol_dictionary,
        char_widths,
        symbol_data,
        code_symbol_dictionary,
        metrics,
        name: read_name(&face),
    })
}

/// Split cmap subtables into the Unicode map and the legacy-encoding map.
/// The first subtable to map a code wins.
fn read_cmaps(face: &ttf_parser::Face) -> (HashMap<u32, u16>, HashMap<u32, u16>) {
    let mut unicode = HashMap::new();
    let mut legacy = HashMap::new();

    let Some(cmap) = face.tables().cmap else {
        return (unicode, legacy);
    };
    for subtable in cmap.subtables {
        let target = if subtable.is_unicode() {
            &mut unicode
        } else {
            &mut legacy
        };
        subtable.codepoints(|code| {
            if let Some(gid) = subtable.glyph_index(code) {
                if gid.0 != 0 {
                    target.entry(code).or_insert(gid.0);
                }
            }
        });
    }
    (unicode, legacy)
}

fn read_char_widths(
    face: &ttf_parser::Face,
    char_map: &HashMap<u32, u16>,
    default_width: u16,
) -> Vec<u16> {
    let slots = char_map
        .keys()
        .copied()
        .filter(|&code| code <= MAX_WIDTH_SLOT)
        .max()
        .map_or(0, |code| code as usize + 1);

    let mut widths = vec![default_width; slots];
    for (&code, &gid) in char_map {
        if let Some(slot) = widths.get_mut(code as usize) {
            *slot = face.glyph_hor_advance(GlyphId(gid)).unwrap_or(default_width);
        }
    }
    widths
}

fn read_name(face: &ttf_parser::Face) -> Option<String> {
    let find = |name_id: u16| {
        face.names()
            .into_iter()
            .filter(|n| n.name_id == name_id)
            .find_map(|n| n.to_string())
    };
    find(ttf_parser::name_id::POST_SCRIPT_NAME).or_else(|| find(ttf_parser::name_id::FULL_NAME))
}

// ─── Loca / Glyf ────────────────────────────────────────────────

/// Decode `numGlyphs + 1` glyph offsets. A truncated table yields what is there.
fn parse_loca(loca: &[u8], long_offsets: bool, num_glyphs: u16) -> Vec<u32> {
    let count = num_glyphs as usize + 1;
    let mut offsets = Vec::with_capacity(count);
    for i in 0..count {
        let offset = if long_offsets {
            read_u32(loca, i * 4)
        } else {
            // Short format stores offset / 2
            read_u16(loca, i * 2).map(|v| u32::from(v) * 2)
        };
        match offset {
            Some(offset) => offsets.push(offset),
            None => break,
        }
    }
    offsets
}

/// Direct component glyph IDs for every composite glyph in `glyf`.
fn composite_components(glyf: &[u8], loca: &[u32]) -> Vec<(u16, Vec<i32>)> {
    let mut found = Vec::new();
    for (gid, window) in loca.windows(2).enumerate() {
        let (start, end) = (window[0] as usize, window[1] as usize);
        if start >= end || end > glyf.len() || end - start < 10 {
            continue;
        }
        let glyph = &glyf[start..end];
        if read_i16(glyph, 0).unwrap_or(0) >= 0 {
            continue; // simple glyph
        }
        let components = walk_components(glyph);
        if !components.is_empty() {
            found.push((gid as u16, components));
        }
    }
    found
}

fn walk_components(glyph: &[u8]) -> Vec<i32> {
    let mut components = Vec::new();
    let mut pos = 10; // numberOfContours + bbox

    while let (Some(flags), Some(component_gid)) = (read_u16(glyph, pos), read_u16(glyph, pos + 2)) {
        components.push(i32::from(component_gid));
        pos += 4;

        // ARG_1_AND_2_ARE_WORDS
        pos += if flags & 0x0001 != 0 { 4 } else { 2 };

        if flags & 0x0008 != 0 {
            pos += 2; // WE_HAVE_A_SCALE
        } else if flags & 0x0040 != 0 {
            pos += 4; // WE_HAVE_AN_X_AND_Y_SCALE
        } else if flags & 0x0080 != 0 {
            pos += 8; // WE_HAVE_A_TWO_BY_TWO
        }

        if flags & 0x0020 == 0 {
            break; // no MORE_COMPONENTS
        }
    }
    components
}

// ─── Byte Helpers ───────────────────────────────────────────────

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
}

fn read_i16(data: &[u8], offset: usize) -> Option<i16> {
    read_u16(data, offset).map(|v| v as i16)
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

// ─── Tests ──────────────────────────────────────────────────────
