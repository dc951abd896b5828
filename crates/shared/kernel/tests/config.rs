use factgate_kernel::config::{ConfigError, load_config, load_config_str};
use factgate_kernel::domain::config::FactsConfig;
use factgate_kernel::domain::module::{Preset, ValidationMode};
use std::fs;

const SAMPLE: &str = r#"
[modules]
preset = "none"
enabled = ["hardware", "hardware.memory"]

[cache]
default_ttl_ms = 750
max_concurrent = 2

[snapshot]
enabled = true
refresh_interval_ms = 2000

[validation]
mode = "warn"
native_strict = true
"#;

#[test]
fn inline_toml_populates_facts_config() -> Result<(), ConfigError> {
    let cfg: FactsConfig = load_config_str(SAMPLE)?;

    assert_eq!(cfg.modules.preset, Preset::None);
    assert_eq!(cfg.modules.enabled, vec!["hardware".to_owned(), "hardware.memory".to_owned()]);
    assert_eq!(cfg.cache.default_ttl_ms, 750);
    assert_eq!(cfg.cache.max_concurrent, 2);
    assert_eq!(cfg.cache.compute_timeout_ms, 10_000, "unset keys keep their defaults");
    assert!(cfg.snapshot.enabled);
    assert_eq!(cfg.validation.mode, ValidationMode::Warn);
    assert!(cfg.validation.native_strict);
    Ok(())
}

#[test]
fn file_source_is_loaded_by_extension() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("factgate.toml");
    fs::write(&path, SAMPLE)?;

    let cfg: FactsConfig = load_config(Some(&path))?;
    assert_eq!(cfg.snapshot.refresh_interval_ms, 2000);
    Ok(())
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result: Result<FactsConfig, _> = load_config(Some(dir.path().join("absent.toml")));

    let err = result.expect_err("missing file must fail");
    assert!(matches!(err, ConfigError::Config { context: Some(_), .. }));
}

#[test]
fn malformed_values_are_rejected() {
    let result: Result<FactsConfig, _> = load_config_str("[validation]\nmode = \"sometimes\"\n");
    assert!(result.is_err());
}
