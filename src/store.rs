//! # Font File Store
//!
//! A keyed cache from font path to parsed font. The first successful load
//! of a path is kept for the life of the store; every caller gets a deep
//! copy, never a reference into the map.
//!
//! Lookups share a read lock just long enough to clone the entry's `Arc`;
//! the deep copy runs after the guard is dropped. Inserts take the write lock
//! for a single `HashMap::insert`, so no reader ever sees a half-written
//! entry. Lookup and
//! insert are separate critical sections: two threads missing on the same
//! new path both load it, and the later insert replaces the earlier one.
//! Both results are equal, so the duplicate work is tolerated rather than
//! serialized.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info, warn};

use crate::config::StoreConfig;
use crate::copy::deep_copy;
use crate::error::FontError;
use crate::font::ParsedFont;
use crate::loader::FontFileLoader;

/// A parsed font as stored in the cache. Never mutated after insertion.
#[derive(Debug)]
struct CacheEntry {
    parsed_font: ParsedFont,
    original_size: u64,
}

/// Process-wide cache of parsed font files.
#[derive(Debug, Default)]
pub struct FontFileStore {
    loader: FontFileLoader,
    config: StoreConfig,
    entries: RwLock<HashMap<PathBuf, Arc<CacheEntry>>>,
}

impl FontFileStore {
    pub fn new(loader: FontFileLoader) -> Self {
        Self {
            loader,
            config: StoreConfig::default(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Build a store and load every font listed in `config.preload`.
    pub fn with_config(loader: FontFileLoader, config: StoreConfig) -> Result<Self, FontError> {
        let preload = config.preload.clone();
        let store = Self {
            config,
            ..Self::new(loader)
        };
        store.preload(&preload)?;
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get an independent copy of the font at `path` and its original file size.
    ///
    /// A hit performs no I/O. A miss loads the file, caches it and returns a
    /// copy of what was cached. Failed loads are not cached, so the next call
    /// tries again.
    pub fn get(&self, path: impl AsRef<Path>) -> Result<(ParsedFont, u64), FontError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(FontError::InvalidArgument);
        }
        let key = self.config.resolve(path);

        if let Some(hit) = self.lookup(&key) {
            debug!("font cache hit: {}", key.display());
            return Ok(hit);
        }
        self.load_and_insert(key)
    }

    /// Load each path that is not already cached.
    pub fn preload<P: AsRef<Path>>(&self, paths: &[P]) -> Result<(), FontError> {
        for path in paths {
            let path = path.as_ref();
            if path.as_os_str().is_empty() {
                return Err(FontError::InvalidArgument);
            }
            let key = self.config.resolve(path);
            if !self.contains_key(&key) {
                self.load_and_insert(key)?;
            }
        }
        Ok(())
    }

    /// True if a font is cached for `path`.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.contains_key(&self.config.resolve(path.as_ref()))
    }

    fn contains_key(&self, key: &Path) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop every cached font. Copies already handed out are unaffected.
    pub fn clear(&self) {
        let mut entries = self.write();
        info!("clearing font cache ({} entries)", entries.len());
        entries.clear();
    }

    fn lookup(&self, key: &Path) -> Option<(ParsedFont, u64)> {
        let entry = self.entry(key)?;
        Some((deep_copy(&entry.parsed_font), entry.original_size))
    }

    // The read guard is released here, before the caller copies.
    fn entry(&self, key: &Path) -> Option<Arc<CacheEntry>> {
        self.read().get(key).cloned()
    }

    fn load_and_insert(&self, key: PathBuf) -> Result<(ParsedFont, u64), FontError> {
        let (parsed_font, original_size) = self.loader.load(&key).map_err(|e| {
            debug!("font load failed: {}", e);
            e
        })?;
        if parsed_font.table_descriptions.is_empty() {
            debug!("font {} parsed to an empty table directory", key.display());
            return Err(FontError::LoadFailed { path: key });
        }

        info!(
            "loaded font {} ({} bytes, {} tables)",
            key.display(),
            original_size,
            parsed_font.table_descriptions.len()
        );

        let entry = Arc::new(CacheEntry {
            parsed_font,
            original_size,
        });
        // Same copy path as a hit, taken before the write lock
        let result = (deep_copy(&entry.parsed_font), entry.original_size);

        let mut entries = self.write();
        if entries.insert(key.clone(), entry).is_some() {
            warn!(
                "font {} was loaded concurrently; replacing the earlier entry",
                key.display()
            );
        }
        Ok(result)
    }

    // Entries are replaced by a single insert, so a poisoned lock still
    // guards a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, Arc<CacheEntry>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, Arc<CacheEntry>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

static GLOBAL: OnceLock<FontFileStore> = OnceLock::new();

/// The process-wide store, created on first use with a disk loader.
pub fn global() -> &'static FontFileStore {
    GLOBAL.get_or_init(FontFileStore::default)
}

/// Install `store` as the process-wide store.
///
/// Fails, handing the store back, if the global store already exists.
pub fn install_global(store: FontFileStore) -> Result<(), FontFileStore> {
    GLOBAL.set(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontParser, FontReader, TtfParser};
    use crate::error::ParseError;
    use crate::loader::MemorySource;
    use crate::loader::FontSource;
    use crate::sample::sample_font;
    use pretty_assertions::assert_eq;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn memory_store() -> FontFileStore {
        FontFileStore::new(FontFileLoader::new(
            MemorySource::new()
                .with_file("/fonts/a.ttf", sample_font())
                .with_file("/fonts/bad.ttf", b"garbage".to_vec()),
            TtfParser,
        ))
    }

    #[test]
    fn test_hit_and_miss_return_equal_copies() {
        let store = memory_store();
        let (first, size1) = store.get("/fonts/a.ttf").unwrap();
        let (second, size2) = store.get("/fonts/a.ttf").unwrap();
        assert_eq!(size1, size2);
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_copies_are_independent() {
        let store = memory_store();
        let (mut first, _) = store.get("/fonts/a.ttf").unwrap();
        first.out_tables_data.clear();
        first.char_symbol_dictionary.insert(0x43, 9);

        let (second, _) = store.get("/fonts/a.ttf").unwrap();
        assert!(second.out_tables_data.contains_key("glyf"));
        assert_eq!(second.glyph_id('C'), None);
    }

    #[test]
    fn test_empty_path() {
        let store = memory_store();
        assert!(matches!(store.get(""), Err(FontError::InvalidArgument)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_failures_are_not_cached() {
        let store = memory_store();
        assert!(matches!(
            store.get("/fonts/missing.ttf"),
            Err(FontError::NotFound { .. })
        ));
        assert!(matches!(
            store.get("/fonts/bad.ttf"),
            Err(FontError::Parse { .. })
        ));
        assert!(!store.contains("/fonts/missing.ttf"));
        assert!(!store.contains("/fonts/bad.ttf"));
        assert!(store.is_empty());
    }

    struct EmptyParser;

    impl FontParser for EmptyParser {
        fn parse(&self, _reader: FontReader) -> Result<ParsedFont, ParseError> {
            Ok(ParsedFont::default())
        }
    }

    #[test]
    fn test_empty_parse_is_load_failed() {
        let store = FontFileStore::new(FontFileLoader::new(
            MemorySource::new().with_file("/fonts/empty.ttf", vec![0; 16]),
            EmptyParser,
        ));
        match store.get("/fonts/empty.ttf") {
            Err(FontError::LoadFailed { path }) => assert_eq!(path, Path::new("/fonts/empty.ttf")),
            other => panic!("expected LoadFailed, got {:?}", other),
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear() {
        let store = memory_store();
        store.get("/fonts/a.ttf").unwrap();
        assert!(store.contains("/fonts/a.ttf"));
        store.clear();
        assert!(store.is_empty());
        // Reloads after a clear
        store.get("/fonts/a.ttf").unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_font_dir_resolution() {
        let config = StoreConfig {
            font_dir: Some(PathBuf::from("/fonts")),
            preload: vec![PathBuf::from("a.ttf")],
        };
        let store = FontFileStore::with_config(
            FontFileLoader::new(
                MemorySource::new().with_file("/fonts/a.ttf", sample_font()),
                TtfParser,
            ),
            config,
        )
        .unwrap();
        assert!(store.contains("a.ttf"));
        assert!(store.contains("/fonts/a.ttf"));
        let (font, _) = store.get("a.ttf").unwrap();
        assert_eq!(font.glyph_id('B'), Some(2));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_preload_failure_is_reported() {
        let config = StoreConfig {
            font_dir: None,
            preload: vec![PathBuf::from("/fonts/missing.ttf")],
        };
        let result = FontFileStore::with_config(
            FontFileLoader::new(MemorySource::new(), TtfParser),
            config,
        );
        assert!(matches!(result, Err(FontError::NotFound { .. })));
    }

    struct CountingReads {
        inner: MemorySource,
        reads: Arc<AtomicUsize>,
    }

    impl FontSource for CountingReads {
        fn stat(&self, path: &Path) -> io::Result<u64> {
            self.inner.stat(path)
        }

        fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read_all(path)
        }
    }

    #[test]
    fn test_relative_font_dir_preloads_once() {
        let reads = Arc::new(AtomicUsize::new(0));
        let source = CountingReads {
            inner: MemorySource::new().with_file("fonts/a.ttf", sample_font()),
            reads: Arc::clone(&reads),
        };
        let config = StoreConfig {
            font_dir: Some(PathBuf::from("fonts")),
            preload: vec![PathBuf::from("a.ttf"), PathBuf::from("a.ttf")],
        };
        let store = FontFileStore::with_config(FontFileLoader::new(source, TtfParser), config)
            .unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 1);

        store.preload(&["a.ttf"]).unwrap();
        store.get("a.ttf").unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert!(store.contains("a.ttf"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_writers_proceed_while_a_hit_is_copied() {
        let store = memory_store();
        store.get("/fonts/a.ttf").unwrap();

        // A hit between releasing the read lock and finishing its copy
        let entry = store.entry(Path::new("/fonts/a.ttf")).unwrap();
        assert!(store.entries.try_write().is_ok());

        let other = FontFileStore::new(FontFileLoader::new(
            MemorySource::new().with_file("/fonts/b.ttf", sample_font()),
            TtfParser,
        ));
        // Insert of another path and a clear both complete
        thread::scope(|s| {
            s.spawn(|| {
                store.clear();
                other.get("/fonts/b.ttf").unwrap();
            });
        });
        assert!(store.is_empty());

        let copy = deep_copy(&entry.parsed_font);
        assert_eq!(copy.glyph_id('A'), Some(1));
        assert_eq!(entry.original_size, sample_font().len() as u64);
    }

    #[test]
    fn test_concurrent_hits_share_the_read_lock() {
        const THREADS: usize = 8;
        let store = memory_store();
        store.get("/fonts/a.ttf").unwrap();

        // With a reader already inside, every hit still completes
        let held = store.read();
        let fonts: Vec<ParsedFont> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| s.spawn(|| store.get("/fonts/a.ttf").unwrap().0))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        drop(held);

        for font in &fonts {
            assert_eq!(font, &fonts[0]);
        }
    }
}
