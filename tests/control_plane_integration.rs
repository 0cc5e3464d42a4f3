//! ---
//! claw_section: "15-testing-qa-runbook"
//! claw_subsection: "integration-tests"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Integration and validation tests for the Claw control plane."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use claw_adapter::{AdapterRegistry, ConfigAdapter, OpenClawAdapter};
use claw_common::config::AppConfig;
use claw_core::{
    CreateInstanceRequest, InMemoryInstanceRepository, InstanceOrchestrator, InstanceStatus,
    OrchestratorSettings, ReconcileOutcome,
};
use claw_runtime::{config_object_name, pod_name, InMemoryGateway, CONFIG_DATA_KEY};

fn read(path: &str) -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let full = Path::new(manifest_dir).join("..").join(path);
    fs::read_to_string(&full)
        .unwrap_or_else(|err| panic!("failed to read {}: {}", full.display(), err))
}

fn example_config() -> AppConfig {
    AppConfig::from_str(&read("configs/claw.example.toml")).expect("example config is valid")
}

#[test]
fn example_config_parses() {
    let config = example_config();
    assert_eq!(config.cluster.namespace, "claw-instances");
    assert_eq!(config.reconciler.poll_interval, Duration::from_secs(1));
    assert_eq!(config.reconciler.ready_timeout, Duration::from_secs(300));
    assert_eq!(config.images.base_image_for("NanoClaw"), "nanoclaw/nanoclaw");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn instance_lifecycle_with_example_config() {
    let mut settings = OrchestratorSettings::from(&example_config());
    settings.reconciler.poll_interval = Duration::from_millis(10);
    let gateway = InMemoryGateway::new();
    let orchestrator = InstanceOrchestrator::new(
        settings,
        Arc::new(InMemoryInstanceRepository::new()),
        Arc::new(gateway.clone()),
        Arc::new(AdapterRegistry::with_builtin()),
        None,
    );

    let instance = orchestrator
        .create(CreateInstanceRequest {
            name: "support-agent".into(),
            tenant_id: "acme".into(),
            project_id: "helpdesk".into(),
            kind: "OpenClaw".into(),
            version: "1.2.0".into(),
            ..CreateInstanceRequest::default()
        })
        .await
        .unwrap();
    let pod = pod_name(&instance.id);
    let spec = gateway.pod_spec(&pod).unwrap();
    assert_eq!(spec.namespace, "claw-instances");
    assert_eq!(spec.image, "openclaw/openclaw:1.2.0");

    let stored = gateway
        .config_object(&config_object_name(&instance.id))
        .unwrap();
    let rendered = &stored.entries()[CONFIG_DATA_KEY];
    let restored = OpenClawAdapter::new().load_rendered(rendered).unwrap();
    assert_eq!(restored, OpenClawAdapter::defaults());

    gateway.mark_ready(&pod);
    assert_eq!(
        orchestrator.reconciler().join(&instance.id).await,
        Some(ReconcileOutcome::Ready)
    );
    assert_eq!(
        orchestrator.get(&instance.id).await.unwrap().status,
        InstanceStatus::Running
    );

    orchestrator.restart(&instance.id).await.unwrap();
    gateway.mark_ready(&pod);
    orchestrator.reconciler().join(&instance.id).await;
    orchestrator.stop(&instance.id).await.unwrap();
    orchestrator.delete(&instance.id).await.unwrap();

    assert!(gateway.pod_names().is_empty());
    assert!(gateway.config_object_names().is_empty());
    assert!(orchestrator.list("acme", "", 0, 0).await.unwrap().is_empty());
}
