//! ---
//! claw_section: "03-cluster-runtime"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Cluster resource gateway and workload naming."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
//! In-memory cluster used by tests and the `clawctl simulate` command.
//!
//! Pods never progress on their own unless auto-ready is enabled; callers
//! drive them with [`InMemoryGateway::mark_ready`] and
//! [`InMemoryGateway::mark_failed`]. Individual operations can be switched to
//! fail with [`InMemoryGateway::fail`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use strum::Display;
use tracing::debug;

use crate::error::{GatewayError, Result};
use crate::gateway::ClusterGateway;
use crate::spec::{
    ConfigObjectData, ContainerState, ContainerStatus, PodEvent, PodHandle, PodPhase, PodSpec,
    PodStatus,
};

const CONTAINER_NAME: &str = "claw";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum GatewayOperation {
    CreatePod,
    DeletePod,
    GetPod,
    PodStatus,
    Logs,
    UpsertConfigObject,
    DeleteConfigObject,
}

#[derive(Debug, Clone)]
struct SimulatedPod {
    spec: PodSpec,
    phase: PodPhase,
    ready: bool,
    reason: Option<String>,
    events: Vec<PodEvent>,
    logs: Vec<String>,
}

impl SimulatedPod {
    fn handle(&self) -> PodHandle {
        PodHandle {
            name: self.spec.name.clone(),
            namespace: self.spec.namespace.clone(),
            labels: self.spec.labels.clone(),
            image: self.spec.image.clone(),
            phase: self.phase,
        }
    }

    fn status(&self) -> PodStatus {
        let state = match self.phase {
            PodPhase::Running => ContainerState::Running,
            PodPhase::Failed | PodPhase::Succeeded => ContainerState::Terminated,
            PodPhase::Pending | PodPhase::Unknown => ContainerState::Waiting,
        };
        PodStatus {
            phase: self.phase,
            ready: self.ready,
            restart_count: 0,
            containers: vec![ContainerStatus {
                name: CONTAINER_NAME.to_owned(),
                ready: self.ready,
                restart_count: 0,
                state,
                message: self.reason.clone(),
            }],
            events: self.events.clone(),
            reason: self.reason.clone(),
        }
    }

    fn record(&mut self, kind: &str, reason: &str, message: String) {
        self.events.push(PodEvent {
            kind: kind.to_owned(),
            reason: reason.to_owned(),
            message,
            timestamp: Utc::now(),
        });
    }
}

#[derive(Debug, Clone)]
struct StoredConfigObject {
    labels: BTreeMap<String, String>,
    data: ConfigObjectData,
}

#[derive(Debug, Default)]
struct ClusterState {
    pods: HashMap<String, SimulatedPod>,
    config_objects: HashMap<String, StoredConfigObject>,
    failing: HashSet<GatewayOperation>,
    auto_ready: bool,
    calls: Vec<(GatewayOperation, String)>,
}

impl ClusterState {
    fn enter(&mut self, operation: GatewayOperation, name: &str) -> Result<()> {
        self.calls.push((operation, name.to_owned()));
        if self.failing.contains(&operation) {
            return Err(GatewayError::backend(
                operation.to_string(),
                format!("injected failure for '{name}'"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<Mutex<ClusterState>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway whose pods report ready as soon as they are created.
    pub fn with_auto_ready() -> Self {
        let gateway = Self::new();
        gateway.set_auto_ready(true);
        gateway
    }

    pub fn set_auto_ready(&self, enabled: bool) {
        self.state.lock().auto_ready = enabled;
    }

    /// Make every subsequent call of `operation` fail with a backend error.
    pub fn fail(&self, operation: GatewayOperation) {
        self.state.lock().failing.insert(operation);
    }

    pub fn recover(&self, operation: GatewayOperation) {
        self.state.lock().failing.remove(&operation);
    }

    /// Flip a pod to Running and ready. Returns `false` when the pod is absent.
    pub fn mark_ready(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let Some(pod) = state.pods.get_mut(name) else {
            return false;
        };
        pod.phase = PodPhase::Running;
        pod.ready = true;
        pod.reason = None;
        pod.record("Normal", "Started", format!("started container {CONTAINER_NAME}"));
        true
    }

    /// Flip a pod to the Failed phase. Returns `false` when the pod is absent.
    pub fn mark_failed(&self, name: &str, reason: impl Into<String>) -> bool {
        let mut state = self.state.lock();
        let Some(pod) = state.pods.get_mut(name) else {
            return false;
        };
        let reason = reason.into();
        pod.phase = PodPhase::Failed;
        pod.ready = false;
        pod.record("Warning", "Failed", reason.clone());
        pod.reason = Some(reason);
        true
    }

    pub fn append_log(&self, name: &str, line: impl Into<String>) -> bool {
        let mut state = self.state.lock();
        match state.pods.get_mut(name) {
            Some(pod) => {
                pod.logs.push(line.into());
                true
            }
            None => false,
        }
    }

    /// Spec the pod was created with.
    pub fn pod_spec(&self, name: &str) -> Option<PodSpec> {
        self.state.lock().pods.get(name).map(|pod| pod.spec.clone())
    }

    pub fn pod_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.lock().pods.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn config_object(&self, name: &str) -> Option<ConfigObjectData> {
        self.state
            .lock()
            .config_objects
            .get(name)
            .map(|object| object.data.clone())
    }

    pub fn config_object_labels(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.state
            .lock()
            .config_objects
            .get(name)
            .map(|object| object.labels.clone())
    }

    pub fn config_object_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.lock().config_objects.keys().cloned().collect();
        names.sort();
        names
    }

    /// Every call made so far, in order, including failed ones.
    pub fn calls(&self) -> Vec<(GatewayOperation, String)> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, operation: GatewayOperation) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(op, _)| *op == operation)
            .count()
    }
}

#[async_trait]
impl ClusterGateway for InMemoryGateway {
    async fn create_pod(&self, spec: &PodSpec) -> Result<PodHandle> {
        let mut state = self.state.lock();
        state.enter(GatewayOperation::CreatePod, &spec.name)?;
        if let Some(existing) = state.pods.get(&spec.name) {
            debug!(pod = %spec.name, "pod already exists");
            return Ok(existing.handle());
        }
        let auto_ready = state.auto_ready;
        let mut pod = SimulatedPod {
            spec: spec.clone(),
            phase: PodPhase::Pending,
            ready: false,
            reason: None,
            events: Vec::new(),
            logs: Vec::new(),
        };
        pod.record("Normal", "Scheduled", format!("assigned {} to node", spec.name));
        if auto_ready {
            pod.phase = PodPhase::Running;
            pod.ready = true;
            pod.record("Normal", "Started", format!("started container {CONTAINER_NAME}"));
        }
        let handle = pod.handle();
        state.pods.insert(spec.name.clone(), pod);
        debug!(pod = %spec.name, image = %spec.image, "pod created");
        Ok(handle)
    }

    async fn delete_pod(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.enter(GatewayOperation::DeletePod, name)?;
        if state.pods.remove(name).is_some() {
            debug!(pod = %name, "pod deleted");
        }
        Ok(())
    }

    async fn get_pod(&self, name: &str) -> Result<PodHandle> {
        let mut state = self.state.lock();
        state.enter(GatewayOperation::GetPod, name)?;
        state
            .pods
            .get(name)
            .map(SimulatedPod::handle)
            .ok_or_else(|| GatewayError::pod_not_found(name))
    }

    async fn pod_status(&self, name: &str) -> Result<PodStatus> {
        let mut state = self.state.lock();
        state.enter(GatewayOperation::PodStatus, name)?;
        state
            .pods
            .get(name)
            .map(SimulatedPod::status)
            .ok_or_else(|| GatewayError::pod_not_found(name))
    }

    async fn logs(&self, name: &str, tail_lines: usize) -> Result<String> {
        let mut state = self.state.lock();
        state.enter(GatewayOperation::Logs, name)?;
        let pod = state
            .pods
            .get(name)
            .ok_or_else(|| GatewayError::pod_not_found(name))?;
        let skip = pod.logs.len().saturating_sub(tail_lines);
        Ok(pod.logs[skip..].join("\n"))
    }

    async fn upsert_config_object(
        &self,
        name: &str,
        labels: &BTreeMap<String, String>,
        data: &ConfigObjectData,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.enter(GatewayOperation::UpsertConfigObject, name)?;
        state.config_objects.insert(
            name.to_owned(),
            StoredConfigObject {
                labels: labels.clone(),
                data: data.clone(),
            },
        );
        Ok(())
    }

    async fn delete_config_object(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.enter(GatewayOperation::DeleteConfigObject, name)?;
        state.config_objects.remove(name);
        Ok(())
    }
}
