//! # Sample TrueType Font
//!
//! Builds a tiny but valid TrueType file: `.notdef`, `A`, `B` and a
//! composite `Å` made of `A` and `B`. It carries a Windows Unicode cmap
//! (format 4) and a Mac Roman cmap (format 0), horizontal metrics, a `loca`
//! table in short format and a `name` table with a PostScript name.
//!
//! Written with correct table checksums and `checkSumAdjustment`, so the
//! output passes through `ttf-parser` and any other sfnt reader.

/// PostScript name stored in the sample font's `name` table.
pub const SAMPLE_POSTSCRIPT_NAME: &str = "FontCacheSample-Regular";

pub const SAMPLE_UNITS_PER_EM: u16 = 1000;
pub const SAMPLE_ASCENDER: i16 = 800;
pub const SAMPLE_DESCENDER: i16 = -200;

/// Advance widths by glyph ID: `.notdef`, `A`, `B`, `Å`.
pub const SAMPLE_ADVANCES: [u16; 4] = [500, 600, 650, 600];
const SAMPLE_LSBS: [i16; 4] = [0, 10, 20, 10];

/// Unicode → glyph ID mapping of the sample font.
pub const SAMPLE_UNICODE_MAP: [(u16, u16); 3] = [(0x41, 1), (0x42, 2), (0xC5, 3)];
/// Mac Roman → glyph ID mapping. `Å` is 0x81 in Mac Roman.
pub const SAMPLE_MAC_ROMAN_MAP: [(u8, u8); 3] = [(0x41, 1), (0x42, 2), (0x81, 3)];

/// Build the sample font file.
pub fn sample_font() -> Vec<u8> {
    let glyphs = vec![
        Vec::new(),
        simple_triangle(0, 0, 580, 700),
        simple_triangle(20, 0, 630, 700),
        composite(&[(1, 0, 0), (2, 0, 200)]),
    ];
    let (glyf, loca_offsets) = build_glyf(&glyphs);

    let mut tables: Vec<(u32, Vec<u8>)> = vec![
        (tag_u32(b"cmap"), build_cmap()),
        (tag_u32(b"glyf"), glyf),
        (tag_u32(b"head"), build_head(0)),
        (tag_u32(b"hhea"), build_hhea(SAMPLE_ADVANCES.len() as u16)),
        (tag_u32(b"hmtx"), build_hmtx()),
        (tag_u32(b"loca"), build_loca(&loca_offsets)),
        (tag_u32(b"maxp"), build_maxp(glyphs.len() as u16)),
        (tag_u32(b"name"), build_name(SAMPLE_POSTSCRIPT_NAME)),
        (tag_u32(b"post"), build_post_format3()),
    ];
    write_sfnt(&mut tables)
}

// ─── Glyphs ─────────────────────────────────────────────────────

/// One contour, three on-curve points, word coordinates.
fn simple_triangle(x_min: i16, y_min: i16, x_max: i16, y_max: i16) -> Vec<u8> {
    let mut data = Vec::new();
    push_i16(&mut data, 1); // numberOfContours
    push_i16(&mut data, x_min);
    push_i16(&mut data, y_min);
    push_i16(&mut data, x_max);
    push_i16(&mut data, y_max);
    push_u16(&mut data, 2); // endPtsOfContours[0]
    push_u16(&mut data, 0); // instructionLength
    data.extend_from_slice(&[0x01, 0x01, 0x01]); // ON_CURVE_POINT
    // x deltas, then y deltas
    let mid = (x_max - x_min) / 2;
    for dx in [x_min, mid, mid] {
        push_i16(&mut data, dx);
    }
    for dy in [y_min, y_max - y_min, y_min - y_max] {
        push_i16(&mut data, dy);
    }
    data
}

/// Composite glyph from `(glyph_id, dx, dy)` components.
fn composite(components: &[(u16, i16, i16)]) -> Vec<u8> {
    let mut data = Vec::new();
    push_i16(&mut data, -1);
    for v in [0i16, 0, 650, 900] {
        push_i16(&mut data, v);
    }
    for (i, &(gid, dx, dy)) in components.iter().enumerate() {
        // ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES
        let mut flags = 0x0003u16;
        if i + 1 < components.len() {
            flags |= 0x0020; // MORE_COMPONENTS
        }
        push_u16(&mut data, flags);
        push_u16(&mut data, gid);
        push_i16(&mut data, dx);
        push_i16(&mut data, dy);
    }
    data
}

fn build_glyf(glyphs: &[Vec<u8>]) -> (Vec<u8>, Vec<u32>) {
    let mut glyf = Vec::new();
    let mut offsets = Vec::with_capacity(glyphs.len() + 1);
    for glyph in glyphs {
        offsets.push(glyf.len() as u32);
        glyf.extend_from_slice(glyph);
        // Pad to 4-byte boundary so short loca offsets stay exact
        while glyf.len() % 4 != 0 {
            glyf.push(0);
        }
    }
    offsets.push(glyf.len() as u32);
    (glyf, offsets)
}

// ─── Tables ─────────────────────────────────────────────────────

fn build_loca(offsets: &[u32]) -> Vec<u8> {
    let mut data = Vec::new();
    for &offset in offsets {
        push_u16(&mut data, (offset / 2) as u16);
    }
    data
}

fn build_head(index_to_loc_format: i16) -> Vec<u8> {
    let mut data = vec![0u8; 54];
    write_u32(&mut data, 0, 0x00010000); // version
    write_u32(&mut data, 4, 0x00010000); // fontRevision
    // checkSumAdjustment (offset 8) is fixed after assembly
    write_u32(&mut data, 12, 0x5F0F3CF5); // magicNumber
    write_u16(&mut data, 16, 0x000B); // flags
    write_u16(&mut data, 18, SAMPLE_UNITS_PER_EM);
    write_i16(&mut data, 36, 0); // xMin
    write_i16(&mut data, 38, SAMPLE_DESCENDER); // yMin
    write_i16(&mut data, 40, 650); // xMax
    write_i16(&mut data, 42, 900); // yMax
    write_u16(&mut data, 46, 8); // lowestRecPPEM
    write_i16(&mut data, 48, 2); // fontDirectionHint
    write_i16(&mut data, 50, index_to_loc_format);
    data
}

fn build_hhea(num_h_metrics: u16) -> Vec<u8> {
    let mut data = vec![0u8; 36];
    write_u32(&mut data, 0, 0x00010000);
    write_i16(&mut data, 4, SAMPLE_ASCENDER);
    write_i16(&mut data, 6, SAMPLE_DESCENDER);
    write_u16(&mut data, 10, 650); // advanceWidthMax
    write_i16(&mut data, 18, 1); // caretSlopeRise
    write_u16(&mut data, 34, num_h_metrics);
    data
}

fn build_hmtx() -> Vec<u8> {
    let mut data = Vec::new();
    for (advance, lsb) in SAMPLE_ADVANCES.iter().zip(SAMPLE_LSBS.iter()) {
        push_u16(&mut data, *advance);
        push_i16(&mut data, *lsb);
    }
    data
}

fn build_maxp(num_glyphs: u16) -> Vec<u8> {
    let mut data = vec![0u8; 32];
    write_u32(&mut data, 0, 0x00010000);
    write_u16(&mut data, 4, num_glyphs);
    write_u16(&mut data, 6, 256); // maxPoints
    write_u16(&mut data, 8, 64); // maxContours
    write_u16(&mut data, 10, 256); // maxCompositePoints
    write_u16(&mut data, 12, 64); // maxCompositeContours
    write_u16(&mut data, 14, 1); // maxZones
    write_u16(&mut data, 28, 2); // maxComponentElements
    write_u16(&mut data, 30, 1); // maxComponentDepth
    data
}

fn build_post_format3() -> Vec<u8> {
    let mut data = vec![0u8; 32];
    write_u32(&mut data, 0, 0x00030000);
    data
}

/// A `name` table holding only the PostScript name (nameID 6).
fn build_name(postscript_name: &str) -> Vec<u8> {
    let name_bytes: Vec<u8> = postscript_name
        .encode_utf16()
        .flat_map(|c| c.to_be_bytes())
        .collect();

    let mut data = Vec::new();
    push_u16(&mut data, 0); // format
    push_u16(&mut data, 1); // count
    push_u16(&mut data, 6 + 12); // stringOffset
    push_u16(&mut data, 3); // platformID = Windows
    push_u16(&mut data, 1); // encodingID = Unicode BMP
    push_u16(&mut data, 0x0409); // languageID
    push_u16(&mut data, 6); // nameID = PostScript name
    push_u16(&mut data, name_bytes.len() as u16);
    push_u16(&mut data, 0);
    data.extend_from_slice(&name_bytes);
    data
}

/// cmap with a Mac Roman format 0 subtable and a Windows Unicode format 4 subtable.
fn build_cmap() -> Vec<u8> {
    let mac = build_cmap_format0(&SAMPLE_MAC_ROMAN_MAP);
    let unicode = build_cmap_format4(&SAMPLE_UNICODE_MAP);

    let header_len = 4 + 2 * 8;
    let mut cmap = Vec::new();
    push_u16(&mut cmap, 0); // version
    push_u16(&mut cmap, 2); // numTables
    // Encoding records sorted by platform, then encoding
    push_u16(&mut cmap, 1); // Macintosh
    push_u16(&mut cmap, 0); // Roman
    cmap.extend_from_slice(&(header_len as u32).to_be_bytes());
    push_u16(&mut cmap, 3); // Windows
    push_u16(&mut cmap, 1); // Unicode BMP
    cmap.extend_from_slice(&((header_len + mac.len()) as u32).to_be_bytes());
    cmap.extend_from_slice(&mac);
    cmap.extend_from_slice(&unicode);
    cmap
}

fn build_cmap_format0(code_to_gid: &[(u8, u8)]) -> Vec<u8> {
    let mut glyph_ids = [0u8; 256];
    for &(code, gid) in code_to_gid {
        glyph_ids[code as usize] = gid;
    }
    let mut data = Vec::with_capacity(262);
    push_u16(&mut data, 0); // format
    push_u16(&mut data, 262); // length
    push_u16(&mut data, 0); // language
    data.extend_from_slice(&glyph_ids);
    data
}

fn build_cmap_format4(char_to_gid: &[(u16, u16)]) -> Vec<u8> {
    let mut sorted = char_to_gid.to_vec();
    sorted.sort_by_key(|(ch, _)| *ch);

    // (start, end, gids) runs of contiguous code points
    let mut segments: Vec<(u16, u16, Vec<u16>)> = Vec::new();
    for &(ch, gid) in &sorted {
        if let Some(last) = segments.last_mut() {
            if ch == last.1 + 1 {
                last.1 = ch;
                last.2.push(gid);
                continue;
            }
        }
        segments.push((ch, ch, vec![gid]));
    }
    segments.push((0xFFFF, 0xFFFF, vec![0]));

    let seg_count = segments.len() as u16;
    let seg_count_x2 = seg_count * 2;
    let entry_selector = 15 - seg_count.leading_zeros() as u16;
    let search_range = (1u16 << entry_selector) * 2;
    let range_shift = seg_count_x2.saturating_sub(search_range);

    let mut glyph_id_array: Vec<u16> = Vec::new();
    let mut id_deltas: Vec<i16> = Vec::new();
    let mut id_range_offsets: Vec<u16> = Vec::new();

    for (i, (start, _, gids)) in segments.iter().enumerate() {
        if *start == 0xFFFF {
            id_deltas.push(1);
            id_range_offsets.push(0);
        } else if gids.len() == 1 {
            id_deltas.push((gids[0] as i32 - *start as i32) as i16);
            id_range_offsets.push(0);
        } else {
            // Distance from this idRangeOffset slot to the segment's glyphIdArray run
            id_deltas.push(0);
            let remaining_offsets = (segments.len() - i) as u16;
            id_range_offsets.push((remaining_offsets + glyph_id_array.len() as u16) * 2);
            glyph_id_array.extend_from_slice(gids);
        }
    }

    let subtable_len = 16 + seg_count as usize * 8 + glyph_id_array.len() * 2;
    let mut data = Vec::with_capacity(subtable_len);
    push_u16(&mut data, 4); // format
    push_u16(&mut data, subtable_len as u16);
    push_u16(&mut data, 0); // language
    push_u16(&mut data, seg_count_x2);
    push_u16(&mut data, search_range);
    push_u16(&mut data, entry_selector);
    push_u16(&mut data, range_shift);
    for (_, end, _) in &segments {
        push_u16(&mut data, *end);
    }
    push_u16(&mut data, 0); // reservedPad
    for (start, _, _) in &segments {
        push_u16(&mut data, *start);
    }
    for &d in &id_deltas {
        push_i16(&mut data, d);
    }
    for &r in &id_range_offsets {
        push_u16(&mut data, r);
    }
    for &g in &glyph_id_array {
        push_u16(&mut data, g);
    }
    data
}

// ─── sfnt Writer ────────────────────────────────────────────────

/// Assemble `(tag, data)` tables into an sfnt file.
///
/// Tables are sorted by tag, recorded with their unpadded length and padded
/// to 4 bytes in the file body. `head.checkSumAdjustment` is filled in last.
pub fn write_sfnt(tables: &mut [(u32, Vec<u8>)]) -> Vec<u8> {
    tables.sort_by_key(|(tag, _)| *tag);

    let num_tables = tables.len() as u16;
    let entry_selector = if num_tables > 0 {
        15 - num_tables.leading_zeros() as u16
    } else {
        0
    };
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = (num_tables * 16).saturating_sub(search_range);

    let mut output: Vec<u8> = Vec::new();
    output.extend_from_slice(&0x00010000u32.to_be_bytes()); // sfntVersion
    push_u16(&mut output, num_tables);
    push_u16(&mut output, search_range);
    push_u16(&mut output, entry_selector);
    push_u16(&mut output, range_shift);

    let mut table_offset = 12 + tables.len() * 16;
    let mut head_offset = None;
    for (tag, data) in tables.iter() {
        if *tag == tag_u32(b"head") {
            head_offset = Some(table_offset);
        }
        output.extend_from_slice(&tag.to_be_bytes());
        output.extend_from_slice(&table_checksum(data).to_be_bytes());
        output.extend_from_slice(&(table_offset as u32).to_be_bytes());
        output.extend_from_slice(&(data.len() as u32).to_be_bytes());
        table_offset += padded_len(data.len());
    }

    for (_, data) in tables.iter() {
        output.extend_from_slice(data);
        output.resize(padded_len(output.len()), 0);
    }

    if let Some(offset) = head_offset {
        let adjustment = 0xB1B0AFBAu32.wrapping_sub(table_checksum(&output));
        write_u32(&mut output, offset + 8, adjustment);
    }

    output
}

/// Sum of big-endian `u32` words, last word zero-padded.
pub fn table_checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

pub fn tag_u32(tag: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*tag)
}

fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

// ─── Byte Helpers ───────────────────────────────────────────────

fn push_u16(data: &mut Vec<u8>, val: u16) {
    data.extend_from_slice(&val.to_be_bytes());
}

fn push_i16(data: &mut Vec<u8>, val: i16) {
    data.extend_from_slice(&val.to_be_bytes());
}

fn write_u16(data: &mut [u8], offset: usize, val: u16) {
    data[offset..offset + 2].copy_from_slice(&val.to_be_bytes());
}

fn write_i16(data: &mut [u8], offset: usize, val: i16) {
    data[offset..offset + 2].copy_from_slice(&val.to_be_bytes());
}

fn write_u32(data: &mut [u8], offset: usize, val: u32) {
    data[offset..offset + 4].copy_from_slice(&val.to_be_bytes());
}

// ─── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u16(data: &[u8], offset: usize) -> u16 {
        u16::from_be_bytes([data[offset], data[offset + 1]])
    }

    fn read_u32(data: &[u8], offset: usize) -> u32 {
        u32::from_be_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ])
    }

    #[test]
    fn test_tag_u32() {
        assert_eq!(tag_u32(b"glyf"), 0x676C7966);
        assert_eq!(tag_u32(b"head"), 0x68656164);
    }

    #[test]
    fn test_table_checksum() {
        assert_eq!(table_checksum(b"ABCD"), 0x41424344);
        // Trailing bytes are zero-padded
        assert_eq!(table_checksum(b"ABCDE"), 0x41424344 + 0x45000000);
    }

    #[test]
    fn test_whole_file_checksum_is_magic() {
        let font = sample_font();
        assert_eq!(font.len() % 4, 0);
        assert_eq!(table_checksum(&font), 0xB1B0AFBA);
    }

    #[test]
    fn test_directory_is_sorted() {
        let font = sample_font();
        let num_tables = read_u16(&font, 4) as usize;
        assert_eq!(num_tables, 9);
        let tags: Vec<u32> = (0..num_tables)
            .map(|i| read_u32(&font, 12 + i * 16))
            .collect();
        let mut sorted = tags.clone();
        sorted.sort();
        assert_eq!(tags, sorted);
    }

    #[test]
    fn test_ttf_parser_accepts_sample() {
        let font = sample_font();
        let face = ttf_parser::Face::parse(&font, 0).expect("sample font should parse");
        assert_eq!(face.units_per_em(), SAMPLE_UNITS_PER_EM);
        assert_eq!(face.number_of_glyphs(), 4);
        assert_eq!(face.glyph_index('A'), Some(ttf_parser::GlyphId(1)));
        assert_eq!(face.glyph_index('Å'), Some(ttf_parser::GlyphId(3)));
        assert_eq!(face.glyph_hor_advance(ttf_parser::GlyphId(2)), Some(650));
    }

    #[test]
    fn test_cmap_format4_header() {
        let cmap = build_cmap_format4(&[(65, 1)]);
        assert_eq!(read_u16(&cmap, 0), 4);
        assert_eq!(read_u16(&cmap, 2) as usize, cmap.len());
        // Two segments: 'A' and the 0xFFFF sentinel
        assert_eq!(read_u16(&cmap, 6), 4);
    }
}
