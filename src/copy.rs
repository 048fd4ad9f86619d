//! # Deep Copy of Parsed Fonts
//!
//! The store keeps one parsed font per path and gives every caller its own
//! copy. Callers mutate what they get (subsetting drops tables from
//! `out_tables_data`, embedding rewrites `code_symbol_dictionary`), so the copy
//! must not share a single container with the cached original.
//!
//! Each field is copied by an explicit rule. `ParsedFont` is destructured
//! exhaustively, so adding a field without deciding how to copy it is a
//! compile error rather than a silent alias.

use std::collections::HashMap;
use std::hash::Hash;

use crate::font::{FontReader, ParsedFont, TableDescription};

/// Copy a font that may be absent. `None` in, `None` out.
pub fn copy_font(src: Option<&ParsedFont>) -> Option<ParsedFont> {
    src.map(deep_copy)
}

/// Produce a structurally equal font that shares no container with `src`.
pub fn deep_copy(src: &ParsedFont) -> ParsedFont {
    let ParsedFont {
        original_size,
        reader,
        table_descriptions,
        out_tables_data,
        symbol_position,
        char_symbol_dictionary,
        char_widths,
        symbol_data,
        code_symbol_dictionary,
        metrics,
        name,
    } = src;

    ParsedFont {
        original_size: *original_size,
        reader: copy_reader(reader),
        table_descriptions: copy_map_with(table_descriptions, copy_table_description),
        out_tables_data: copy_map_with(out_tables_data, |bytes| copy_seq(bytes)),
        symbol_position: copy_seq(symbol_position),
        char_symbol_dictionary: copy_map_with(char_symbol_dictionary, |gid| *gid),
        char_widths: copy_seq(char_widths),
        symbol_data: copy_map_with(symbol_data, |groups| {
            copy_map_with(groups, |values| copy_seq(values))
        }),
        code_symbol_dictionary: copy_map_with(code_symbol_dictionary, |gid| *gid),
        metrics: *metrics,
        name: name.clone(),
    }
}

/// The copy gets its own buffer and its own cursor at the same position.
fn copy_reader(reader: &FontReader) -> FontReader {
    FontReader::from_parts(copy_seq(reader.data()), reader.position())
}

fn copy_table_description(desc: &TableDescription) -> TableDescription {
    TableDescription {
        offset: desc.offset,
        length: desc.length,
        checksum: copy_seq(&desc.checksum),
    }
}

fn copy_seq<T: Copy>(src: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(src.len());
    out.extend_from_slice(src);
    out
}

fn copy_map_with<K, V, F>(src: &HashMap<K, V>, mut copy_value: F) -> HashMap<K, V>
where
    K: Clone + Eq + Hash,
    F: FnMut(&V) -> V,
{
    let mut out = HashMap::with_capacity(src.len());
    for (key, value) in src {
        out.insert(key.clone(), copy_value(value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontMetrics, COMPONENTS_GROUP, METRICS_GROUP};
    use pretty_assertions::assert_eq;

    fn populated_font() -> ParsedFont {
        let mut table_descriptions = HashMap::new();
        table_descriptions.insert(
            "glyf".to_string(),
            TableDescription {
                offset: 128,
                length: 64,
                checksum: vec![0x1234, 0x5678],
            },
        );
        let mut out_tables_data = HashMap::new();
        out_tables_data.insert("glyf".to_string(), vec![1, 2, 3, 4]);

        let mut groups = HashMap::new();
        groups.insert(METRICS_GROUP.to_string(), vec![600, 20]);
        groups.insert(COMPONENTS_GROUP.to_string(), vec![1, 2]);
        let mut symbol_data = HashMap::new();
        symbol_data.insert(3u16, groups);

        let mut reader = FontReader::new(vec![9, 8, 7, 6]);
        reader.skip(2).unwrap();

        ParsedFont {
            original_size: 10_000,
            reader,
            table_descriptions,
            out_tables_data,
            symbol_position: vec![0, 0, 20, 40],
            char_symbol_dictionary: [(65, 1), (66, 2)].into_iter().collect(),
            char_widths: vec![500; 67],
            symbol_data,
            code_symbol_dictionary: [(0x41, 1)].into_iter().collect(),
            metrics: FontMetrics {
                units_per_em: 1000,
                default_width: 500,
                ..Default::default()
            },
            name: Some("Sample-Regular".to_string()),
        }
    }

    #[test]
    fn test_copy_is_equal() {
        let src = populated_font();
        let copy = deep_copy(&src);
        assert_eq!(copy, src);
        assert_eq!(copy.reader.position(), 2);
    }

    #[test]
    fn test_copy_shares_no_buffers() {
        let src = populated_font();
        let copy = deep_copy(&src);

        assert_ne!(copy.reader.data().as_ptr(), src.reader.data().as_ptr());
        assert_ne!(copy.symbol_position.as_ptr(), src.symbol_position.as_ptr());
        assert_ne!(copy.char_widths.as_ptr(), src.char_widths.as_ptr());
        assert_ne!(
            copy.out_tables_data["glyf"].as_ptr(),
            src.out_tables_data["glyf"].as_ptr()
        );
        assert_ne!(
            copy.table_descriptions["glyf"].checksum.as_ptr(),
            src.table_descriptions["glyf"].checksum.as_ptr()
        );
        assert_ne!(
            copy.symbol_data[&3][METRICS_GROUP].as_ptr(),
            src.symbol_data[&3][METRICS_GROUP].as_ptr()
        );
    }

    #[test]
    fn test_mutating_copy_leaves_source_alone() {
        let src = populated_font();
        let mut copy = deep_copy(&src);

        copy.out_tables_data.get_mut("glyf").unwrap()[0] = 0xFF;
        copy.out_tables_data.remove("glyf");
        copy.table_descriptions.get_mut("glyf").unwrap().checksum[0] = 0;
        copy.symbol_data
            .get_mut(&3)
            .unwrap()
            .get_mut(COMPONENTS_GROUP)
            .unwrap()
            .push(99);
        copy.char_symbol_dictionary.insert(67, 3);
        copy.code_symbol_dictionary.clear();
        copy.char_widths[65] = 0;
        copy.symbol_position.truncate(1);
        copy.reader.seek(0).unwrap();

        assert_eq!(src, populated_font());
    }

    #[test]
    fn test_copy_round_trip() {
        let src = populated_font();
        let once = deep_copy(&src);
        let twice = deep_copy(&once);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_copy_absent_is_absent() {
        assert!(copy_font(None).is_none());
        let src = populated_font();
        assert_eq!(copy_font(Some(&src)), Some(populated_font()));
    }

    #[test]
    fn test_clone_is_deep() {
        let src = populated_font();
        let mut cloned = src.clone();
        cloned.char_widths.clear();
        assert_eq!(src.char_widths.len(), 67);
    }
}
