//! Preset and settings files driving a live engine.

use std::time::Duration;

use tempfile::TempDir;
use tonechain_config::{
    ConfigError, EffectConfig, ImportPolicy, Preset, PresetLibrary, Settings, ValidationError,
    factory_presets, get_factory_preset,
};
use tonechain_effects::EffectType;
use tonechain_engine::{Engine, EngineConfig, FixedClock, OfflineDriver};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("tonechain_config=debug,tonechain_engine=info")
        .try_init();
}

#[test]
fn preset_file_round_trip() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/dir/ambient.toml");

    let preset = get_factory_preset("ambient_lead").unwrap();
    preset.save(&path).unwrap();
    assert!(path.exists());

    let loaded = Preset::load(&path).unwrap();
    assert_eq!(loaded, preset);
}

#[test]
fn invalid_preset_is_not_saved() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    let preset = Preset::new("Broken")
        .with_effect(EffectConfig::new("delay").with_param("feedback", "2"));

    let err = preset.save(&path).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Validation(ValidationError::OutOfRange { .. })
    ));
    assert!(!path.exists());
}

#[test]
fn hand_written_preset_with_bad_tag_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tagged.toml");
    std::fs::write(
        &path,
        r#"
name = "Tagged"
tags = ["ok", "not ok"]

[[effects]]
type = "boost"
"#,
    )
    .unwrap();

    assert!(matches!(
        Preset::load(&path),
        Err(ConfigError::Validation(ValidationError::InvalidTag(_)))
    ));
}

#[test]
fn malformed_toml_reports_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.toml");
    std::fs::write(&path, "name = [unterminated").unwrap();
    assert!(matches!(Preset::load(&path), Err(ConfigError::TomlParse(_))));
}

#[test]
fn preset_drives_engine_chain() {
    init_tracing();
    let (engine, controller) = Engine::new(EngineConfig::default()).unwrap();
    controller.start().unwrap();
    let mut driver =
        OfflineDriver::new(engine.with_clock(FixedClock::new(Duration::from_millis(1))));

    let crunch = get_factory_preset("crunch").unwrap();
    assert!(crunch.apply(&controller).unwrap());
    assert_eq!(controller.generation(), 1);

    let input: Vec<f32> = (0..4096)
        .map(|i| 0.2 * (std::f32::consts::TAU * i as f32 / 100.0).sin())
        .collect();
    let output = driver.render(&input);
    assert!(output.iter().all(|s| s.is_finite()));
    assert!(output.iter().any(|s| s.abs() > 0.01));
    assert_eq!(driver.engine().generation(), 1);
    assert_eq!(driver.engine().chain_len(), 3);

    let captured = Preset::capture("Captured", &controller);
    assert_eq!(
        captured.to_chain().unwrap().effect_types(),
        [EffectType::Boost, EffectType::Distortion, EffectType::Reverb]
    );
    assert_eq!(captured.effect_types(), ["boost", "distortion", "!reverb"]);
    assert_eq!(captured.to_chain().unwrap(), crunch.to_chain().unwrap());
}

#[test]
fn every_factory_preset_loads_into_engine() {
    let (_engine, controller) = Engine::new(EngineConfig::default()).unwrap();
    for preset in factory_presets() {
        assert!(preset.apply(&controller).unwrap(), "{}", preset.name);
        assert_eq!(controller.len(), preset.len());
    }
}

#[test]
fn json_interchange_survives_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("slapback.json");
    let preset = get_factory_preset("slapback").unwrap();
    std::fs::write(&path, preset.to_json().unwrap()).unwrap();

    let json = std::fs::read_to_string(&path).unwrap();
    assert_eq!(Preset::from_json(&json).unwrap(), preset);
}

#[test]
fn settings_file_configures_engine() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");

    let mut settings = Settings::default();
    settings.engine.block_size = 64;
    settings.engine.sample_rate = 44100;
    settings.log_level = "debug".into();
    settings.save(&path).unwrap();

    let loaded = Settings::load(&path).unwrap();
    assert_eq!(loaded, settings);

    let (engine, _controller) = Engine::new(loaded.engine).unwrap();
    assert_eq!(engine.config().block_size, 64);
    assert_eq!(engine.config().sample_rate, 44100);
}

#[test]
fn settings_with_bad_engine_table_fail_to_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "[engine]\nsample_rate = 22050\n").unwrap();
    assert!(matches!(Settings::load(&path), Err(ConfigError::Engine(_))));
}

#[test]
fn library_stores_captured_chains() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let library = PresetLibrary::open(dir.path().join("presets")).unwrap();
    for preset in factory_presets() {
        library.save(&preset).unwrap();
    }

    let (_engine, controller) = Engine::new(EngineConfig::default()).unwrap();
    let lead = library.list(&["lead"], None);
    assert_eq!(lead.len(), 1);
    assert!(lead[0].apply(&controller).unwrap());

    let mine = Preset::capture("My Lead", &controller).with_tag("lead");
    library.save(&mine).unwrap();
    assert!(matches!(library.save(&mine), Err(ConfigError::DuplicatePreset(_))));
    assert_eq!(library.list(&["lead"], None).len(), 2);

    let (_other_engine, other) = Engine::new(EngineConfig::default()).unwrap();
    assert!(library.get("My Lead").unwrap().apply(&other).unwrap());
    assert_eq!(other.export_state(), controller.export_state());

    let backup = TempDir::new().unwrap();
    let restored = PresetLibrary::open(backup.path()).unwrap();
    let report = restored
        .import_json(&library.export_json(&[]).unwrap(), ImportPolicy::Reject)
        .unwrap();
    assert_eq!(report.imported, library.len());
    assert!(report.errors.is_empty());
    assert_eq!(restored.names(), library.names());
}
