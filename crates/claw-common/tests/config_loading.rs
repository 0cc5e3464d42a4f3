//! ---
//! claw_section: "01-core-functionality"
//! claw_subsection: "tests"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Configuration loading tests."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use std::fs;
use std::time::Duration;

use claw_common::config::{AppConfig, ConfigSource};
use claw_common::LogFormat;
use tempfile::tempdir;

#[test]
fn loads_first_existing_candidate() {
    let dir = tempdir().expect("tempdir");
    let missing = dir.path().join("missing.toml");
    let present = dir.path().join("claw.toml");
    fs::write(
        &present,
        r#"
        [cluster]
        namespace = "agents"

        [reconciler]
        poll_interval_ms = 100
        ready_timeout_secs = 10

        [images]
        baseline = "registry.local/claw-base"

        [images.fallback]
        OpenClaw = "registry.local/openclaw"

        [logging]
        format = "pretty"
        "#,
    )
    .unwrap();

    let loaded = AppConfig::load_with_source(&[missing, present.clone()]).expect("config loads");
    assert_eq!(loaded.source, ConfigSource::Candidate(present.clone()));
    assert_eq!(loaded.source.path(), present.as_path());
    let config = loaded.config;
    assert_eq!(config.cluster.namespace, "agents");
    assert_eq!(config.reconciler.poll_interval, Duration::from_millis(100));
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert_eq!(
        config.images.base_image_for("OpenClaw"),
        "registry.local/openclaw"
    );
    assert_eq!(
        config.images.base_image_for("NanoClaw"),
        "registry.local/claw-base"
    );
}

#[test]
fn missing_candidates_are_reported() {
    let dir = tempdir().expect("tempdir");
    let candidate = dir.path().join("nowhere.toml");
    let err = AppConfig::load(&[candidate.clone()]).expect_err("nothing to load");
    assert!(err
        .to_string()
        .contains(&candidate.display().to_string()));
}

#[test]
fn invalid_file_surfaces_parse_context() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[cluster\nnamespace = 1").unwrap();
    let err = AppConfig::load(&[path.clone()]).expect_err("parse failure");
    assert!(format!("{err:#}").contains("invalid configuration in"));
}
