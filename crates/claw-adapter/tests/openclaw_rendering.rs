//! ---
//! claw_section: "02-config-adapters"
//! claw_subsection: "tests"
//! claw_type: "test"
//! claw_scope: "code"
//! claw_description: "OpenClaw rendering through the adapter registry."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use std::collections::BTreeMap;
use std::sync::Arc;

use claw_adapter::{
    AdapterRegistry, ConfigAdapter, OpenClawAdapter, UnifiedConfig, NANO_CLAW, OPEN_CLAW,
};
use serde_json::json;

fn caller_config() -> UnifiedConfig {
    let mut config = UnifiedConfig::default();
    config.model.name = "claude-3-5-sonnet".into();
    config.model.api_key = "sk-test".into();
    config.model.base_url = "https://api.example.invalid".into();
    config.memory.limit = 2048;
    config.server.port = 9090;
    config.server.headers = BTreeMap::from([("x-tenant".to_owned(), "acme".to_owned())]);
    config.plugins.enabled = vec!["browser".into(), "shell".into()];
    config
        .plugins
        .config
        .insert("browser".into(), json!({"headless": true}));
    config
}

#[test]
fn unset_fields_keep_defaults() {
    let registry = AdapterRegistry::with_builtin();
    let mut adapter = registry.create(OPEN_CLAW).unwrap();
    let defaults = adapter.default_config();

    let mut input = UnifiedConfig::default();
    input.model.name = "claude-3-opus".into();
    adapter.parse_config(&input).unwrap();

    let merged = adapter.config();
    assert_eq!(merged.model.name, "claude-3-opus");
    assert_eq!(merged.model.max_tokens, defaults.model.max_tokens);
    assert_eq!(merged.model.temperature, defaults.model.temperature);
    assert_eq!(merged.memory, defaults.memory);
    assert_eq!(merged.server, defaults.server);
    assert_eq!(merged.logging, defaults.logging);
    assert_eq!(merged.plugins, defaults.plugins);
}

#[test]
fn rendered_document_reads_back_to_merged_state() {
    let registry = AdapterRegistry::with_builtin();
    let mut adapter = registry.create(OPEN_CLAW).unwrap();
    adapter.parse_config(&caller_config()).unwrap();
    adapter.validate().unwrap();

    let rendered = adapter.generate_config().unwrap();
    let restored = adapter.load_rendered(&rendered).unwrap();
    assert_eq!(&restored, adapter.config());

    let reseeded = OpenClawAdapter::with_config(restored);
    assert_eq!(reseeded.generate_config().unwrap(), rendered);
}

#[test]
fn each_create_returns_fresh_state() {
    let registry = AdapterRegistry::with_builtin();
    let mut first = registry.create(OPEN_CLAW).unwrap();
    first.parse_config(&caller_config()).unwrap();

    let second = registry.create(OPEN_CLAW).unwrap();
    assert_eq!(second.config(), &second.default_config());
}

#[test]
fn late_registration_extends_the_registry() {
    let registry = AdapterRegistry::with_builtin();
    assert!(registry.create(NANO_CLAW).is_err());

    registry.register(
        NANO_CLAW,
        Arc::new(|| Box::new(OpenClawAdapter::new()) as Box<dyn ConfigAdapter>),
    );
    assert!(registry.is_supported(NANO_CLAW));
    assert_eq!(registry.supported_types().len(), 2);
}

#[test]
fn image_tracks_requested_version() {
    let adapter = OpenClawAdapter::new();
    assert_eq!(adapter.image(""), "openclaw/openclaw:latest");
    assert_eq!(adapter.image("2024.6"), "openclaw/openclaw:2024.6");
}
