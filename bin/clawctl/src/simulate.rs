//! ---
//! claw_section: "05-operator-interfaces"
//! claw_subsection: "binary"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Operator CLI for the Claw control plane."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
//! Drive one instance through create, stop, start and delete against the
//! in-memory gateway and repository, printing each observed status.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;
use claw_adapter::AdapterRegistry;
use claw_common::config::AppConfig;
use claw_core::{
    CreateInstanceRequest, InMemoryInstanceRepository, InstanceOrchestrator, InstanceRepository,
    OrchestratorSettings, ReconcileOutcome,
};
use claw_metrics::{encode_text, new_registry, InstanceMetrics};
use claw_runtime::{pod_name, GatewayOperation, InMemoryGateway};
use serde::Serialize;
use tracing::{info, warn};

use crate::render::read_unified;

#[derive(Debug, Args)]
pub struct SimulateCommand {
    #[arg(long = "type", value_name = "TYPE", default_value = "OpenClaw")]
    kind: String,

    #[arg(long, default_value = "demo")]
    name: String,

    #[arg(long, default_value = "tenant-demo")]
    tenant: String,

    #[arg(long, default_value = "project-demo")]
    project: String,

    #[arg(long, default_value = "")]
    version: String,

    /// Caller configuration (YAML or JSON) passed to create.
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Report the pod as failed instead of ready.
    #[arg(long)]
    fail_pod: bool,

    /// Make config object upserts fail.
    #[arg(long)]
    fail_config_object: bool,
}

#[derive(Debug, Serialize)]
struct Step<'a> {
    step: &'a str,
    instance_id: &'a str,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

fn report(step: &str, instance_id: &str, status: impl ToString, detail: Option<String>) -> Result<()> {
    let line = Step {
        step,
        instance_id,
        status: status.to_string(),
        detail,
    };
    println!("{}", serde_json::to_string(&line)?);
    Ok(())
}

impl SimulateCommand {
    pub async fn execute(self, config: AppConfig) -> Result<()> {
        let gateway = InMemoryGateway::new();
        if self.fail_config_object {
            gateway.fail(GatewayOperation::UpsertConfigObject);
        }
        let repository: Arc<dyn InstanceRepository> = Arc::new(InMemoryInstanceRepository::new());
        let metrics = if config.metrics.enabled {
            Some(InstanceMetrics::new(new_registry())?)
        } else {
            None
        };
        let orchestrator = InstanceOrchestrator::new(
            OrchestratorSettings::from(&config),
            repository,
            Arc::new(gateway.clone()),
            Arc::new(AdapterRegistry::with_builtin()),
            metrics.clone(),
        );

        let request = CreateInstanceRequest {
            name: self.name.clone(),
            tenant_id: self.tenant.clone(),
            project_id: self.project.clone(),
            kind: self.kind.clone(),
            version: self.version.clone(),
            config: self.input.as_deref().map(read_unified).transpose()?,
            resources: None,
            storage: None,
        };
        let instance = orchestrator.create(request).await?;
        let id = instance.id.clone();
        let pod = pod_name(&id);
        let image = gateway.pod_spec(&pod).map(|spec| spec.image);
        report("create", &id, instance.status, image)?;

        if !self.settle_pod(&orchestrator, &gateway, &id).await? {
            orchestrator.delete(&id).await?;
            report("delete", &id, "Destroyed", None)?;
            return self.finish(&orchestrator, metrics.as_ref()).await;
        }

        orchestrator.stop(&id).await?;
        report("stop", &id, orchestrator.get(&id).await?.status, None)?;

        orchestrator.start(&id).await?;
        report("start", &id, orchestrator.get(&id).await?.status, None)?;
        self.settle_pod(&orchestrator, &gateway, &id).await?;

        gateway.append_log(&pod, format!("{} serving on 0.0.0.0:8080", self.kind));
        let logs = orchestrator.logs(&id, None).await?;
        report("logs", &id, orchestrator.get(&id).await?.status, Some(logs))?;

        orchestrator.stop(&id).await?;
        orchestrator.delete(&id).await?;
        report("delete", &id, "Destroyed", None)?;
        self.finish(&orchestrator, metrics.as_ref()).await
    }

    /// Resolve the pending pod and wait for the reconciler. Returns whether the
    /// instance ended up running.
    async fn settle_pod(
        &self,
        orchestrator: &InstanceOrchestrator,
        gateway: &InMemoryGateway,
        id: &str,
    ) -> Result<bool> {
        let pod = pod_name(id);
        if self.fail_pod {
            gateway.mark_failed(&pod, "simulated failure");
        } else {
            gateway.mark_ready(&pod);
        }
        let outcome = orchestrator.reconciler().join(id).await;
        let status = orchestrator.get(id).await?.status;
        let detail = outcome.as_ref().map(|outcome| outcome.label().to_owned());
        report("reconcile", id, status, detail)?;
        match outcome {
            Some(ReconcileOutcome::Ready) => Ok(true),
            Some(ReconcileOutcome::Failed(reason)) => {
                warn!(instance_id = %id, reason = %reason, "simulated pod failed");
                Ok(false)
            }
            Some(other) => bail!("reconciliation ended unexpectedly: {}", other.label()),
            None => bail!("no reconciliation was running for instance {id}"),
        }
    }

    async fn finish(
        &self,
        orchestrator: &InstanceOrchestrator,
        metrics: Option<&InstanceMetrics>,
    ) -> Result<()> {
        orchestrator.reconciler().shutdown().await;
        if let Some(metrics) = metrics {
            print!("{}", encode_text(&metrics.registry())?);
        }
        info!(kind = %self.kind, "simulation finished");
        Ok(())
    }
}
