use filetime::{set_file_mtime, FileTime};
use romsearch::cache::CacheStore;
use romsearch::config::{Source, SourceSet, SourceSpec};
use romsearch::matcher::MatchConfig;
use romsearch::scanner::{
    Fingerprint, FsScanner, InventoryScanner, ScanConfig, ScanError, SourceScan,
};
use romsearch::search::{SearchEngine, SearchRequest};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Filesystem scanner recording how often each source is fully scanned.
struct CountingScanner {
    inner: FsScanner,
    scans: Mutex<HashMap<String, usize>>,
}

impl CountingScanner {
    fn new() -> Self {
        Self {
            inner: FsScanner::new(ScanConfig::default()),
            scans: Mutex::new(HashMap::new()),
        }
    }

    fn scans_of(&self, source: &str) -> usize {
        self.scans.lock().unwrap().get(source).copied().unwrap_or(0)
    }

    fn total_scans(&self) -> usize {
        self.scans.lock().unwrap().values().sum()
    }

    fn reset(&self) {
        self.scans.lock().unwrap().clear();
    }
}

impl InventoryScanner for CountingScanner {
    fn fingerprint(&self, source: &Source, system: &str) -> Result<Fingerprint, ScanError> {
        self.inner.fingerprint(source, system)
    }

    fn scan(&self, source: &Source, system: &str) -> SourceScan {
        *self
            .scans
            .lock()
            .unwrap()
            .entry(source.name().to_string())
            .or_default() += 1;
        self.inner.scan(source, system)
    }
}

fn touch(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn setup() -> (TempDir, SearchEngine<CountingScanner>) {
    let dir = TempDir::new().unwrap();
    let base = dir.path();
    touch(&base.join("Official/SNES/Super Mario World.zip"), b"official");
    touch(&base.join("Official/SNES/Donkey Kong Country.zip"), b"dkc");
    touch(
        &base.join("Translations/SNES/Super Mario World (Spanish).zip"),
        b"es",
    );

    let sources = SourceSet::resolve(
        base,
        &[
            SourceSpec::new("Official", "Official", 100),
            SourceSpec::new("Translations", "Translations", 200),
        ],
    )
    .unwrap();
    let engine = SearchEngine::new(sources, CountingScanner::new())
        .with_cache(CacheStore::new(base.join(".rom_cache")))
        .with_match_config(MatchConfig::new(15.0, 10));
    (dir, engine)
}

fn request() -> SearchRequest {
    SearchRequest::new("Super Mario World", "SNES")
}

#[test]
fn test_cache_round_trip_skips_scanning() {
    let (dir, engine) = setup();

    let fresh = engine.search(&request()).unwrap();
    assert_eq!(engine.scanner().total_scans(), 2);
    assert!(dir.path().join(".rom_cache/SNES.json").is_file());

    let cached = engine.search(&request()).unwrap();
    assert_eq!(engine.scanner().total_scans(), 2);
    assert_eq!(fresh, cached);
}

#[test]
fn test_empty_system_folder_is_cached() {
    let (dir, engine) = setup();
    fs::remove_file(dir.path().join("Translations/SNES/Super Mario World (Spanish).zip")).unwrap();

    let first = engine.search_with_stats(&request()).unwrap();
    assert_eq!(first.stats.sources_scanned, 2);
    assert!(first.stats.degraded_sources.is_empty());
    assert!(first.stats.cache_written);

    engine.scanner().reset();
    for _ in 0..2 {
        let report = engine.search_with_stats(&request()).unwrap();
        assert_eq!(report.stats.sources_cached, 2);
        assert!(!report.stats.cache_written);
        assert_eq!(report.outcome, first.outcome);
    }
    assert_eq!(engine.scanner().total_scans(), 0);

    // A file appearing in the empty folder is still picked up
    touch(
        &dir.path().join("Translations/SNES/Super Mario World (French).zip"),
        b"fr",
    );
    let results = engine.search(&request()).unwrap();
    assert_eq!(engine.scanner().scans_of("Translations"), 1);
    assert_eq!(results[0].source, "Translations");
}

#[test]
fn test_cached_inventory_equals_fresh_scan() {
    let (_dir, engine) = setup();
    engine.search(&request()).unwrap();

    let store = engine.store().unwrap();
    let record = store.load("SNES").unwrap();
    for source in engine.sources().iter() {
        let scan = engine.scanner().inner.scan(source, "SNES");
        assert_eq!(record.source_entries(source.name()).unwrap(), scan.entries.as_slice());
        assert_eq!(record.fingerprint(source.name()), Some(&scan.fingerprint));
    }
}

#[test]
fn test_added_file_rescans_only_that_source() {
    let (dir, engine) = setup();
    engine.search(&request()).unwrap();
    engine.scanner().reset();

    touch(
        &dir.path().join("Official/SNES/Super Mario World 2 - Yoshi's Island.zip"),
        b"yoshi",
    );
    let results = engine.search(&request()).unwrap();

    assert_eq!(engine.scanner().scans_of("Official"), 1);
    assert_eq!(engine.scanner().scans_of("Translations"), 0);
    assert!(results
        .iter()
        .any(|r| r.display_name == "Super Mario World 2 - Yoshi's Island.zip"));

    // The merged record is now current for both sources
    engine.scanner().reset();
    engine.search(&request()).unwrap();
    assert_eq!(engine.scanner().total_scans(), 0);
}

#[test]
fn test_removed_file_rescans_and_disappears() {
    let (dir, engine) = setup();
    engine.search(&request()).unwrap();
    engine.scanner().reset();

    fs::remove_file(dir.path().join("Translations/SNES/Super Mario World (Spanish).zip")).unwrap();
    let results = engine.search(&request()).unwrap();

    assert_eq!(engine.scanner().scans_of("Translations"), 1);
    assert_eq!(engine.scanner().scans_of("Official"), 0);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source, "Official");
}

#[test]
fn test_modified_size_invalidates_source() {
    let (dir, engine) = setup();
    engine.search(&request()).unwrap();
    engine.scanner().reset();

    fs::write(
        dir.path().join("Official/SNES/Donkey Kong Country.zip"),
        b"a bigger donkey kong country dump",
    )
    .unwrap();
    engine.search(&request()).unwrap();

    assert_eq!(engine.scanner().scans_of("Official"), 1);
    assert_eq!(engine.scanner().scans_of("Translations"), 0);
}

#[test]
fn test_modified_mtime_invalidates_source() {
    let (dir, engine) = setup();
    engine.search(&request()).unwrap();
    engine.scanner().reset();

    let path = dir.path().join("Translations/SNES/Super Mario World (Spanish).zip");
    set_file_mtime(&path, FileTime::from_unix_time(1_000_000_000, 0)).unwrap();
    engine.search(&request()).unwrap();

    assert_eq!(engine.scanner().scans_of("Translations"), 1);
    assert_eq!(engine.scanner().scans_of("Official"), 0);
}

#[test]
fn test_fingerprint_of_unrelated_source_unaffected() {
    let (dir, engine) = setup();
    let sources = engine.sources();
    let official = sources.get("official").unwrap();
    let translations = sources.get("TRANSLATIONS").unwrap();
    let scanner = FsScanner::new(ScanConfig::default());

    let official_before = scanner.fingerprint(official, "SNES").unwrap();
    let translations_before = scanner.fingerprint(translations, "SNES").unwrap();

    touch(&dir.path().join("Official/SNES/Star Fox.sfc"), b"arwing");

    assert_ne!(scanner.fingerprint(official, "SNES").unwrap(), official_before);
    assert_eq!(scanner.fingerprint(translations, "SNES").unwrap(), translations_before);
}

#[test]
fn test_deleted_cache_file_triggers_full_rescan() {
    let (dir, engine) = setup();
    let cache_file = dir.path().join(".rom_cache/SNES.json");

    let first = engine.search(&request()).unwrap();
    fs::remove_file(&cache_file).unwrap();
    engine.scanner().reset();

    let second = engine.search_with_stats(&request()).unwrap();
    assert_eq!(engine.scanner().total_scans(), 2);
    assert!(second.stats.cache_written);
    assert!(cache_file.is_file());

    engine.scanner().reset();
    let third = engine.search_with_stats(&request()).unwrap();
    assert_eq!(engine.scanner().total_scans(), 0);
    assert_eq!(third.stats.sources_cached, 2);

    assert_eq!(first, second.outcome.clone().into_results());
    assert_eq!(second.outcome, third.outcome);
}

#[test]
fn test_cache_is_per_system() {
    let (dir, engine) = setup();
    touch(&dir.path().join("Official/NES/Super Mario Bros.nes"), b"smb");

    engine.search(&request()).unwrap();
    engine
        .search(&SearchRequest::new("super mario bros", "NES"))
        .unwrap();

    let store = engine.store().unwrap();
    assert_eq!(store.cached_systems().unwrap(), vec!["NES", "SNES"]);

    assert_eq!(engine.clear_cache(Some("NES")).unwrap(), 1);
    assert_eq!(store.cached_systems().unwrap(), vec!["SNES"]);
}

#[test]
fn test_removed_source_keeps_others_cached() {
    let (dir, engine) = setup();
    engine.search(&request()).unwrap();

    let only_official = SourceSet::resolve(
        dir.path(),
        &[SourceSpec::new("Official", "Official", 100)],
    )
    .unwrap();
    let narrowed = SearchEngine::new(only_official, CountingScanner::new())
        .with_cache(CacheStore::new(dir.path().join(".rom_cache")))
        .with_match_config(MatchConfig::new(15.0, 10));

    let results = narrowed.search(&request()).unwrap();
    assert_eq!(narrowed.scanner().total_scans(), 0);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source, "Official");
}

#[test]
fn test_disabled_cache_writes_nothing() {
    let (dir, _) = setup();
    let sources = SourceSet::resolve(
        dir.path(),
        &[SourceSpec::new("Official", "Official", 100)],
    )
    .unwrap();
    let engine = SearchEngine::new(sources, CountingScanner::new());

    let report = engine.search_with_stats(&request()).unwrap();

    assert!(!report.stats.cache_written);
    assert!(!dir.path().join(".rom_cache").exists());
}
