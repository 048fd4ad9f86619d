//! # fontcache CLI
//!
//! Usage:
//!   fontcache font.ttf [more.ttf ...]
//!   fontcache --config fonts.json DejaVuSans.ttf
//!   fontcache --sample sample.ttf
//!
//! Loads each font through the process-wide cache twice (the second time
//! is a cache hit) and prints a JSON summary per font.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Instant;

use fontcache::{global, install_global, FontFileLoader, FontFileStore, ParsedFont, StoreConfig};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FontSummary<'a> {
    path: &'a str,
    name: Option<&'a str>,
    original_size: u64,
    tables: Vec<&'a str>,
    glyphs: usize,
    mapped_chars: usize,
    legacy_codes: usize,
    composite_glyphs: usize,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    load_micros: u64,
    cached_micros: u64,
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();

    // Handle --sample flag
    if let Some(pos) = args.iter().position(|a| a == "--sample") {
        let output_path = args.get(pos + 1).map(String::as_str).unwrap_or("sample.ttf");
        let bytes = fontcache::sample::sample_font();
        match fs::write(output_path, &bytes) {
            Ok(()) => eprintln!("✓ Written {} bytes to {}", bytes.len(), output_path),
            Err(e) => {
                eprintln!("✗ Failed to write {}: {}", output_path, e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Split --config <file> from the font paths
    let mut config_path = None;
    let mut fonts = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            config_path = iter.next();
        } else {
            fonts.push(arg.as_str());
        }
    }

    if fonts.is_empty() && config_path.is_none() {
        eprintln!("Usage: fontcache [--config fonts.json] FONT... | --sample OUT.ttf");
        std::process::exit(2);
    }

    if let Some(config_path) = config_path {
        if let Err(e) = install_configured_store(config_path) {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    }

    let mut failed = false;
    for path in fonts {
        match summarize(path) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("✗ {}", e);
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
}

fn install_configured_store(config_path: &str) -> Result<(), String> {
    let json = fs::read_to_string(config_path)
        .map_err(|e| format!("Failed to read config '{}': {}", config_path, e))?;
    let config = StoreConfig::from_json(&json).map_err(|e| e.to_string())?;
    let preloaded = config.preload.len();
    let store = FontFileStore::with_config(FontFileLoader::default(), config)
        .map_err(|e| e.to_string())?;
    install_global(store).map_err(|_| "font store was already initialised".to_string())?;
    eprintln!("✓ Preloaded {} font(s) from {}", preloaded, config_path);
    Ok(())
}

fn summarize(path: &str) -> Result<String, String> {
    let start = Instant::now();
    let (font, original_size) = global().get(path).map_err(|e| e.to_string())?;
    let load_micros = start.elapsed().as_micros() as u64;

    let start = Instant::now();
    global().get(path).map_err(|e| e.to_string())?;
    let cached_micros = start.elapsed().as_micros() as u64;

    let summary = build_summary(path, &font, original_size, load_micros, cached_micros);
    let json = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
    eprintln!(
        "✓ {} ({} bytes)",
        Path::new(path).display(),
        original_size
    );
    Ok(json)
}

fn build_summary<'a>(
    path: &'a str,
    font: &'a ParsedFont,
    original_size: u64,
    load_micros: u64,
    cached_micros: u64,
) -> FontSummary<'a> {
    let mut tables: Vec<&str> = font.table_descriptions.keys().map(String::as_str).collect();
    tables.sort_unstable();
    let composite_glyphs = font
        .symbol_data
        .keys()
        .filter(|&&gid| font.components(gid).is_some())
        .count();

    FontSummary {
        path,
        name: font.name.as_deref(),
        original_size,
        tables,
        glyphs: font.glyph_count(),
        mapped_chars: font.char_symbol_dictionary.len(),
        legacy_codes: font.code_symbol_dictionary.len(),
        composite_glyphs,
        units_per_em: font.metrics.units_per_em,
        ascender: font.metrics.ascender,
        descender: font.metrics.descender,
        load_micros,
        cached_micros,
    }
}
