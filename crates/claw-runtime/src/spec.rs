//! ---
//! claw_section: "03-cluster-runtime"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Cluster resource gateway and workload naming."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Key under which the rendered configuration is stored in a config object.
pub const CONFIG_DATA_KEY: &str = "config.yaml";

/// Quantity strings applied to the workload container (`"500m"`, `"1Gi"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuantities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

/// Everything the gateway needs to start the single container of an instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSpec {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub image: String,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Config object to mount; absent when the upsert did not succeed.
    #[serde(default)]
    pub config_object: Option<String>,
    #[serde(default)]
    pub config_mount_path: Option<String>,
    #[serde(default)]
    pub requests: ResourceQuantities,
    #[serde(default)]
    pub limits: ResourceQuantities,
}

impl PodSpec {
    /// Mount target when both the object and the path are present.
    pub fn config_mount(&self) -> Option<(&str, &str)> {
        match (&self.config_object, &self.config_mount_path) {
            (Some(object), Some(path)) if !object.is_empty() && !path.is_empty() => {
                Some((object.as_str(), path.as_str()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

/// Reference to a pod as the cluster currently reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodHandle {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub image: String,
    pub phase: PodPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum ContainerState {
    Waiting,
    Running,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
    pub restart_count: u32,
    pub state: ContainerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodEvent {
    pub kind: String,
    pub reason: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Observed state of a pod, including recent events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodStatus {
    pub phase: PodPhase,
    pub ready: bool,
    /// Sum of the restart counts of all containers.
    pub restart_count: u32,
    #[serde(default)]
    pub containers: Vec<ContainerStatus>,
    #[serde(default)]
    pub events: Vec<PodEvent>,
    /// Reason reported with a terminal failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Payload of a config object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigObjectData {
    pub rendered_config: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl ConfigObjectData {
    /// Flattened key/value view as stored in the cluster.
    pub fn entries(&self) -> BTreeMap<String, String> {
        let mut entries = self.env.clone();
        entries.insert(CONFIG_DATA_KEY.to_owned(), self.rendered_config.clone());
        entries
    }
}
