use romsearch::config::{Config, SourceSpec};
use romsearch::error::ExitCode;
use romsearch::output::{JsonOutput, TextOutput};
use romsearch::search::{SearchEngine, SearchOutcome, SearchRequest};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn touch(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Base dir with the default Official/Translations layout.
fn library() -> TempDir {
    let dir = TempDir::new().unwrap();
    let base = dir.path();
    touch(&base.join("Official/SNES/Super Mario World.zip"), b"official smw");
    touch(&base.join("Official/SNES/Chrono Trigger (USA).sfc"), b"chrono");
    touch(&base.join("Official/SNES/Secret of Mana [!].smc"), b"mana");
    touch(&base.join("Official/SNES/readme.txt"), b"not a rom");
    touch(
        &base.join("Translations/SNES/Super Mario World (Spanish).zip"),
        b"es",
    );
    touch(&base.join("Official/GBA/Mario Kart - Super Circuit.gba"), b"mk");
    touch(&base.join("Translations/NES/Mother (Eng).nes"), b"mother");
    dir
}

fn config(threshold: f64, max_results: usize) -> Config {
    Config {
        threshold,
        max_results,
        ..Config::default()
    }
}

#[test]
fn test_translations_rank_above_official() {
    let dir = library();
    let engine = SearchEngine::from_config(&config(15.0, 10), dir.path()).unwrap();

    let results = engine
        .search(&SearchRequest::new("Super Mario World", "SNES"))
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].display_name, "Super Mario World (Spanish).zip");
    assert_eq!(results[0].source, "Translations");
    assert_eq!(results[0].priority, 200);
    assert_eq!(results[1].display_name, "Super Mario World.zip");
    assert_eq!(results[1].source, "Official");
    assert!(results[0]
        .path
        .ends_with("Translations/SNES/Super Mario World (Spanish).zip"));
}

#[test]
fn test_nonsense_query_returns_nothing() {
    let dir = library();
    let engine = SearchEngine::from_config(&config(15.0, 10), dir.path()).unwrap();

    let report = engine
        .search_with_stats(&SearchRequest::new("zzzznonexistentgame", "SNES"))
        .unwrap();

    assert_eq!(report.outcome, SearchOutcome::NoResults);
    assert_eq!(ExitCode::from_search(false, &report.stats), ExitCode::NoMatches);
}

#[test]
fn test_empty_query_returns_nothing() {
    let dir = library();
    let engine = SearchEngine::from_config(&config(0.0, 10), dir.path()).unwrap();

    for query in ["", "   ", "(USA)", "[!]", "-_-"] {
        let results = engine.search(&SearchRequest::new(query, "SNES")).unwrap();
        assert!(results.is_empty(), "query {query:?} matched {results:?}");
    }
}

#[test]
fn test_only_candidate_extensions_considered() {
    let dir = library();
    let engine = SearchEngine::from_config(&config(0.0, 50), dir.path()).unwrap();

    let report = engine
        .search_with_stats(&SearchRequest::new("readme", "SNES"))
        .unwrap();

    assert_eq!(report.stats.candidates, 4);
    assert!(report
        .outcome
        .results()
        .iter()
        .all(|r| r.display_name != "readme.txt"));
}

#[test]
fn test_configured_extensions_narrow_candidates() {
    let dir = library();
    let config = Config {
        extensions: vec!["sfc".to_string(), ".SMC".to_string()],
        ..config(0.0, 50)
    };
    let engine = SearchEngine::from_config(&config, dir.path()).unwrap();

    let report = engine
        .search_with_stats(&SearchRequest::new("chrono", "SNES"))
        .unwrap();

    assert_eq!(report.stats.candidates, 2);
    assert_eq!(report.outcome.results()[0].display_name, "Chrono Trigger (USA).sfc");
}

#[test]
fn test_tags_do_not_affect_matching() {
    let dir = library();
    let engine = SearchEngine::from_config(&config(90.0, 10), dir.path()).unwrap();

    let results = engine
        .search(&SearchRequest::new("secret of mana", "SNES"))
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].display_name, "Secret of Mana [!].smc");
    assert_eq!(results[0].score, 100.0);
}

#[test]
fn test_results_are_capped_and_above_threshold() {
    let dir = TempDir::new().unwrap();
    for i in 0..30 {
        touch(
            &dir.path().join(format!("Official/NES/Mega Man {i}.nes")),
            &vec![0u8; i],
        );
    }
    let engine = SearchEngine::from_config(&config(50.0, 7), dir.path()).unwrap();

    let results = engine.search(&SearchRequest::new("mega man", "NES")).unwrap();

    assert_eq!(results.len(), 7);
    assert!(results.iter().all(|r| r.score >= 50.0));
    // Same priority and score: larger files first
    assert!(results.windows(2).all(|w| w[0].size >= w[1].size));
}

#[test]
fn test_repeated_searches_are_identical() {
    let dir = library();
    let engine = SearchEngine::from_config(&config(0.0, 50), dir.path()).unwrap();
    let request = SearchRequest::new("mario", "SNES");

    let first = engine.search(&request).unwrap();
    let second = engine.search(&request).unwrap();
    let third = engine.search(&request).unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);
}

#[test]
fn test_custom_sources_with_absolute_path() {
    let dir = library();
    let hacks = TempDir::new().unwrap();
    touch(&hacks.path().join("SNES/Super Mario World Kaizo.smc"), b"kaizo");

    let config = Config {
        sources: vec![
            SourceSpec::new("Official", "Official", 100),
            SourceSpec::new("Hacks", hacks.path(), 300),
        ],
        ..config(15.0, 10)
    };
    let engine = SearchEngine::from_config(&config, dir.path()).unwrap();

    let results = engine
        .search(&SearchRequest::new("super mario world", "SNES"))
        .unwrap();

    assert_eq!(results[0].source, "Hacks");
    assert_eq!(results[1].source, "Official");
    assert_eq!(results.len(), 2);
}

#[test]
fn test_list_systems_across_sources() {
    let dir = library();
    fs::create_dir_all(dir.path().join("Official/.hidden")).unwrap();
    let engine = SearchEngine::from_config(&Config::default(), dir.path()).unwrap();

    assert_eq!(engine.list_systems(), vec!["GBA", "NES", "SNES"]);
}

#[test]
fn test_text_output_lines() {
    let dir = library();
    let engine = SearchEngine::from_config(&config(15.0, 10), dir.path()).unwrap();
    let report = engine
        .search_with_stats(&SearchRequest::new("Super Mario World", "SNES"))
        .unwrap();

    let mut buf = Vec::new();
    TextOutput::new(&report.outcome).write_to(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<_> = text.lines().collect();

    assert_eq!(lines.len(), 2);
    let (name, path) = lines[0].split_once('|').unwrap();
    assert_eq!(name, "Super Mario World (Spanish).zip");
    assert!(Path::new(path).is_file());
}

#[test]
fn test_json_output_document() {
    let dir = library();
    let engine = SearchEngine::from_config(&config(15.0, 10), dir.path()).unwrap();
    let report = engine
        .search_with_stats(&SearchRequest::new("Chrono Trigger", "SNES"))
        .unwrap();
    let exit_code = ExitCode::from_search(report.outcome.has_matches(), &report.stats);

    let json = JsonOutput::new(&report.outcome, &report.stats, exit_code)
        .to_json()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["outcome"], "matches");
    assert_eq!(value["results"][0]["display_name"], "Chrono Trigger (USA).sfc");
    assert_eq!(value["stats"]["sources_total"], 2);
    assert_eq!(value["stats"]["exit_code"], 0);
}
