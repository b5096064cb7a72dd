use figment::providers::Serialized;
use figment::Jail;
use romsearch::config::{Config, ConfigError, SourceSet, SourceSpec, DEFAULT_CACHE_DIR_NAME};
use std::path::{Path, PathBuf};

fn load(path: &str) -> figment::Result<Config> {
    Config::load(Some(Path::new(path))).map_err(|e| figment::Error::from(e.to_string()))
}

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from the host
    let figment = figment::Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();

    assert_eq!(config.threshold, 40.0);
    assert_eq!(config.max_results, 50);
    assert!(config.use_cache);
    assert!(config.cache_dir.is_none());
    assert_eq!(
        config.sources,
        vec![
            SourceSpec::new("Official", "Official", 100),
            SourceSpec::new("Translations", "Translations", 200),
        ]
    );
    assert!(config.extensions.iter().any(|e| e == "sfc"));
}

#[test]
fn test_config_load_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "romsearch.toml",
            r#"
threshold = 70.0
max_results = 5
cache_dir = "/var/cache/roms"
extensions = ["sfc", "smc"]

[[sources]]
name = "Main"
path = "Main"
priority = 10

[[sources]]
name = "Patches"
path = "/srv/patches"
priority = 20
"#,
        )?;

        let config = load("romsearch.toml")?;
        assert_eq!(config.threshold, 70.0);
        assert_eq!(config.max_results, 5);
        assert_eq!(config.cache_dir, Some(PathBuf::from("/var/cache/roms")));
        assert_eq!(config.extensions, vec!["sfc", "smc"]);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1], SourceSpec::new("Patches", "/srv/patches", 20));
        // Untouched keys keep their defaults
        assert!(config.use_cache);
        Ok(())
    });
}

#[test]
fn test_env_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_file("romsearch.toml", "threshold = 70.0\nmax_results = 5\n")?;
        jail.set_env("ROMSEARCH_MAX_RESULTS", "7");
        jail.set_env("ROMSEARCH_USE_CACHE", "false");

        let config = load("romsearch.toml")?;
        assert_eq!(config.threshold, 70.0);
        assert_eq!(config.max_results, 7);
        assert!(!config.use_cache);
        Ok(())
    });
}

#[test]
fn test_missing_config_file_is_an_error() {
    Jail::expect_with(|_jail| {
        let err = Config::load(Some(Path::new("nope.toml"))).unwrap_err();
        assert_eq!(err, ConfigError::ConfigFileNotFound(PathBuf::from("nope.toml")));
        Ok(())
    });
}

#[test]
fn test_malformed_config_file_is_an_error() {
    Jail::expect_with(|jail| {
        jail.create_file("romsearch.toml", "max_results = \"lots\"\n")?;
        let err = Config::load(Some(Path::new("romsearch.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
        Ok(())
    });
}

#[test]
fn test_validate_ranges() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.threshold = 100.5;
    assert_eq!(config.validate(), Err(ConfigError::InvalidThreshold(100.5)));

    config.threshold = 0.0;
    config.max_results = 0;
    assert_eq!(config.validate(), Err(ConfigError::InvalidMaxResults));

    config.max_results = 1;
    config.extensions = vec![" ".to_string()];
    assert_eq!(config.validate(), Err(ConfigError::NoExtensions));
}

#[test]
fn test_duplicate_names_rejected_case_insensitively() {
    let err = SourceSet::resolve(
        Path::new("/roms"),
        &[
            SourceSpec::new("Official", "A", 1),
            SourceSpec::new("OFFICIAL", "B", 2),
        ],
    )
    .unwrap_err();
    assert_eq!(err, ConfigError::DuplicateSourceName("OFFICIAL".to_string()));
}

#[test]
fn test_duplicate_paths_rejected() {
    let err = SourceSet::resolve(
        Path::new("/roms"),
        &[
            SourceSpec::new("One", "Official", 1),
            SourceSpec::new("Two", "/roms/official/", 2),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateSourcePath(_)));
}

#[test]
fn test_negative_priority_rejected() {
    let err = SourceSet::resolve(Path::new("/roms"), &[SourceSpec::new("One", "One", -1)])
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidPriority { .. }));
}

#[test]
fn test_empty_source_list_rejected() {
    assert_eq!(
        SourceSet::resolve(Path::new("/roms"), &[]).unwrap_err(),
        ConfigError::NoSources
    );
}

#[test]
fn test_cache_dir_defaults_under_base() {
    let config = Config::default();
    assert_eq!(
        config.cache_dir_for(Path::new("/roms")),
        Path::new("/roms").join(DEFAULT_CACHE_DIR_NAME)
    );

    let custom = Config {
        cache_dir: Some(PathBuf::from("/tmp/rs")),
        ..Config::default()
    };
    assert_eq!(custom.cache_dir_for(Path::new("/roms")), Path::new("/tmp/rs"));
}
