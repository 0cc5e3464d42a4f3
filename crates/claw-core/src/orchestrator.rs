//! ---
//! claw_section: "01-core-functionality"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Instance lifecycle orchestration."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
//! Instance state machine and the sequencing of adapter, gateway and
//! repository calls behind each lifecycle operation.

use std::sync::Arc;

use chrono::Utc;
use claw_adapter::{AdapterRegistry, UnifiedConfig};
use claw_common::{AppConfig, ClusterConfig, ImageConfig, ReconcilerConfig};
use claw_metrics::InstanceMetrics;
use claw_runtime::{
    config_object_name, instance_labels, pod_name, ClusterGateway, ConfigObjectData, PodSpec,
    PodStatus,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{OrchestratorError, Result};
use crate::image::resolve_image;
use crate::model::{
    CreateInstanceRequest, Instance, InstanceStatus, UpdateInstanceRequest,
};
use crate::policy::{settle, Step};
use crate::reconciler::Reconciler;
use crate::repository::InstanceRepository;

/// Lines returned by [`InstanceOrchestrator::logs`] when the caller does not say.
pub const DEFAULT_LOG_TAIL: usize = 100;

/// Static settings the orchestrator reads from [`AppConfig`].
#[derive(Debug, Clone, Default)]
pub struct OrchestratorSettings {
    pub cluster: ClusterConfig,
    pub reconciler: ReconcilerConfig,
    pub images: ImageConfig,
}

impl From<&AppConfig> for OrchestratorSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            cluster: config.cluster.clone(),
            reconciler: config.reconciler.clone(),
            images: config.images.clone(),
        }
    }
}

#[derive(Clone)]
pub struct InstanceOrchestrator {
    settings: Arc<OrchestratorSettings>,
    repository: Arc<dyn InstanceRepository>,
    gateway: Arc<dyn ClusterGateway>,
    adapters: Arc<AdapterRegistry>,
    reconciler: Reconciler,
    metrics: Option<InstanceMetrics>,
}

impl std::fmt::Debug for InstanceOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceOrchestrator")
            .field("settings", &self.settings)
            .field("adapters", &self.adapters)
            .field("reconciler", &self.reconciler)
            .finish()
    }
}

impl InstanceOrchestrator {
    pub fn new(
        settings: OrchestratorSettings,
        repository: Arc<dyn InstanceRepository>,
        gateway: Arc<dyn ClusterGateway>,
        adapters: Arc<AdapterRegistry>,
        metrics: Option<InstanceMetrics>,
    ) -> Self {
        let reconciler = Reconciler::new(
            settings.reconciler.clone(),
            Arc::clone(&gateway),
            Arc::clone(&repository),
            metrics.clone(),
        );
        Self {
            settings: Arc::new(settings),
            repository,
            gateway,
            adapters,
            reconciler,
            metrics,
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    #[instrument(skip(self, request), fields(tenant_id = %request.tenant_id, name = %request.name))]
    pub async fn create(&self, request: CreateInstanceRequest) -> Result<Instance> {
        request.validate()?;
        let name = request.name.trim().to_owned();
        if self
            .repository
            .get_by_name(&request.tenant_id, &name)
            .await?
            .is_some()
        {
            return Err(OrchestratorError::Validation(format!(
                "instance name '{}' already exists in tenant '{}'",
                name, request.tenant_id
            )));
        }

        let now = Utc::now();
        let mut instance = Instance {
            id: Uuid::new_v4().to_string(),
            name,
            tenant_id: request.tenant_id,
            project_id: request.project_id,
            kind: request.kind.trim().to_owned(),
            version: request.version.trim().to_owned(),
            status: InstanceStatus::Creating,
            resources: request.resources.unwrap_or_default(),
            storage: request.storage.unwrap_or_default(),
            rendered_config: None,
            created_at: now,
            updated_at: now,
        };
        self.persist(&instance.id, self.repository.create(&instance).await)?;
        self.record_transition(InstanceStatus::Creating);
        info!(instance_id = %instance.id, kind = %instance.kind, "instance record created");

        instance.rendered_config = self.render(&instance.id, &instance.kind, request.config.as_ref());
        if instance.rendered_config.is_some() {
            instance.updated_at = Utc::now();
            self.persist(&instance.id, self.repository.update(&instance).await)?;
        }

        self.launch(&mut instance).await?;
        Ok(instance)
    }

    pub async fn get(&self, id: &str) -> Result<Instance> {
        Ok(self.repository.get_by_id(id).await?)
    }

    /// Instances newest first; blank tenant or project matches any.
    pub async fn list(
        &self,
        tenant_id: &str,
        project_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Instance>> {
        Ok(self
            .repository
            .list(tenant_id, project_id, limit, offset)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update(&self, id: &str, request: UpdateInstanceRequest) -> Result<Instance> {
        let mut instance = self.repository.get_by_id(id).await?;

        if let Some(name) = request.name {
            let name = name.trim().to_owned();
            if name.is_empty() {
                return Err(OrchestratorError::Validation("name is required".to_owned()));
            }
            instance.name = name;
        }
        if let Some(resources) = request.resources {
            instance.resources = resources;
        }
        let mut config_changed = false;
        if let Some(config) = request.config {
            let rendered = self.render(&instance.id, &instance.kind, Some(&config));
            if rendered.is_some() && rendered != instance.rendered_config {
                instance.rendered_config = rendered;
                config_changed = true;
            }
        }

        // Record first; the config object only follows a persisted update.
        instance.updated_at = Utc::now();
        self.persist(&instance.id, self.repository.update(&instance).await)?;
        if config_changed {
            self.sync_config_object(&instance).await;
        }
        info!(instance_id = %instance.id, config_changed, "instance updated");
        Ok(instance)
    }

    #[instrument(skip(self))]
    pub async fn start(&self, id: &str) -> Result<()> {
        let mut instance = self.repository.get_by_id(id).await?;
        ensure(&instance, "start", instance.status.can_start())?;
        let previous = instance.status;

        self.reconciler.cancel(id).await;
        self.write_status(id, InstanceStatus::Creating).await?;
        instance.status = InstanceStatus::Creating;

        if previous == InstanceStatus::Failed {
            settle(
                Step::CleanupPod,
                id,
                self.gateway.delete_pod(&pod_name(id)).await,
                self.metrics.as_ref(),
            )?;
        }

        self.launch(&mut instance).await
    }

    #[instrument(skip(self))]
    pub async fn stop(&self, id: &str) -> Result<()> {
        let instance = self.repository.get_by_id(id).await?;
        ensure(&instance, "stop", instance.status.can_stop())?;

        self.reconciler.cancel(id).await;
        settle(
            Step::StopPod,
            id,
            self.gateway.delete_pod(&pod_name(id)).await,
            self.metrics.as_ref(),
        )?;
        self.write_status(id, InstanceStatus::Stopped).await?;
        info!(instance_id = %id, "instance stopped");
        Ok(())
    }

    /// Stop then start; start is not attempted when stop fails.
    pub async fn restart(&self, id: &str) -> Result<()> {
        self.stop(id).await?;
        self.start(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let instance = self.repository.get_by_id(id).await?;
        ensure(&instance, "delete", instance.status.can_delete())?;

        self.reconciler.cancel(id).await;
        settle(
            Step::CleanupPod,
            id,
            self.gateway.delete_pod(&pod_name(id)).await,
            self.metrics.as_ref(),
        )?;
        settle(
            Step::DeleteConfigObject,
            id,
            self.gateway
                .delete_config_object(&config_object_name(id))
                .await,
            self.metrics.as_ref(),
        )?;
        self.persist(id, self.repository.delete(id).await)?;
        self.record_transition(InstanceStatus::Destroyed);
        info!(instance_id = %id, "instance deleted");
        Ok(())
    }

    /// Last `tail_lines` lines of the instance's pod output.
    pub async fn logs(&self, id: &str, tail_lines: Option<usize>) -> Result<String> {
        self.repository.get_by_id(id).await?;
        let tail = tail_lines.unwrap_or(DEFAULT_LOG_TAIL);
        let logs = settle(
            Step::FetchLogs,
            id,
            self.gateway.logs(&pod_name(id), tail).await,
            self.metrics.as_ref(),
        )?;
        Ok(logs.unwrap_or_default())
    }

    pub async fn pod_status(&self, id: &str) -> Result<PodStatus> {
        self.repository.get_by_id(id).await?;
        Ok(self.gateway.pod_status(&pod_name(id)).await?)
    }

    /// Render `config` for `kind` without touching any instance.
    pub fn render_config(&self, kind: &str, config: Option<&UnifiedConfig>) -> Result<String> {
        let mut adapter = self.adapters.create(kind)?;
        if let Some(config) = config {
            adapter.parse_config(config)?;
        }
        adapter.validate()?;
        Ok(adapter.generate_config()?)
    }

    fn render(&self, id: &str, kind: &str, config: Option<&UnifiedConfig>) -> Option<String> {
        settle(
            Step::RenderConfig,
            id,
            self.render_config(kind, config),
            self.metrics.as_ref(),
        )
        .ok()
        .flatten()
    }

    /// Push the stored rendered config to the cluster. Returns whether the
    /// object can be mounted.
    async fn sync_config_object(&self, instance: &Instance) -> bool {
        let Some(rendered) = &instance.rendered_config else {
            return false;
        };
        let env = self
            .adapters
            .create(&instance.kind)
            .map(|adapter| adapter.env_vars())
            .unwrap_or_default();
        let data = ConfigObjectData {
            rendered_config: rendered.clone(),
            env,
        };
        let labels = instance_labels(&instance.id, &instance.tenant_id, &instance.project_id);
        let result = self
            .gateway
            .upsert_config_object(&config_object_name(&instance.id), &labels, &data)
            .await;
        matches!(
            settle(Step::UpsertConfigObject, &instance.id, result, self.metrics.as_ref()),
            Ok(Some(()))
        )
    }

    fn pod_spec(&self, instance: &Instance, mount_config: bool) -> PodSpec {
        let env = self
            .adapters
            .create(&instance.kind)
            .map(|adapter| adapter.env_vars())
            .unwrap_or_default();
        let quantities = instance.resources.quantities();
        PodSpec {
            name: pod_name(&instance.id),
            namespace: self.settings.cluster.namespace.clone(),
            labels: instance_labels(&instance.id, &instance.tenant_id, &instance.project_id),
            image: resolve_image(
                &self.adapters,
                &self.settings.images,
                &instance.kind,
                &instance.version,
            ),
            command: Vec::new(),
            args: Vec::new(),
            env,
            config_object: mount_config.then(|| config_object_name(&instance.id)),
            config_mount_path: mount_config
                .then(|| self.settings.cluster.config_mount_path.clone()),
            requests: quantities.clone(),
            limits: quantities,
        }
    }

    /// Config object, pod, reconciliation: the tail shared by create and start.
    async fn launch(&self, instance: &mut Instance) -> Result<()> {
        let mounted = self.sync_config_object(instance).await;
        if !mounted {
            debug!(instance_id = %instance.id, "starting pod without config mount");
        }
        let spec = self.pod_spec(instance, mounted);

        let created = settle(
            Step::CreatePod,
            &instance.id,
            self.gateway.create_pod(&spec).await,
            self.metrics.as_ref(),
        );
        if let Err(err) = created {
            if let Err(write_err) = self
                .repository
                .update_status(&instance.id, InstanceStatus::Failed)
                .await
            {
                warn!(instance_id = %instance.id, error = %write_err, "failed to record pod creation failure");
            } else {
                self.record_transition(InstanceStatus::Failed);
            }
            instance.status = InstanceStatus::Failed;
            return Err(err.into());
        }

        info!(instance_id = %instance.id, pod = %spec.name, image = %spec.image, "pod requested");
        self.reconciler.spawn(&instance.id);
        Ok(())
    }

    async fn write_status(&self, id: &str, status: InstanceStatus) -> Result<()> {
        self.persist(id, self.repository.update_status(id, status).await)?;
        self.record_transition(status);
        Ok(())
    }

    fn persist<T>(
        &self,
        id: &str,
        result: std::result::Result<T, crate::repository::RepositoryError>,
    ) -> Result<()> {
        settle(Step::PersistRecord, id, result, self.metrics.as_ref())?;
        Ok(())
    }

    fn record_transition(&self, status: InstanceStatus) {
        if let Some(metrics) = &self.metrics {
            metrics.record_transition(status.as_ref());
        }
    }
}

fn ensure(instance: &Instance, operation: &'static str, allowed: bool) -> Result<()> {
    if allowed {
        return Ok(());
    }
    Err(OrchestratorError::InvalidStatus {
        id: instance.id.clone(),
        operation,
        status: instance.status,
    })
}
