//! ---
//! claw_section: "03-cluster-runtime"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Cluster resource gateway and workload naming."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
//! Capability boundary between the control plane and the container cluster.
//!
//! Resources are addressed purely by name derived from the instance ID, so no
//! side index is needed to find the pod or config object of an instance.

use std::collections::BTreeMap;

pub mod error;
pub mod gateway;
pub mod memory;
pub mod spec;

pub use error::{GatewayError, Result};
pub use gateway::{ClusterGateway, READY_POLL_INTERVAL};
pub use memory::{GatewayOperation, InMemoryGateway};
pub use spec::{
    ConfigObjectData, ContainerState, ContainerStatus, PodEvent, PodHandle, PodPhase, PodSpec,
    PodStatus, ResourceQuantities, CONFIG_DATA_KEY,
};

const RESOURCE_PREFIX: &str = "claw";

/// Pod name for an instance: `claw-<id>`.
pub fn pod_name(instance_id: &str) -> String {
    format!("{RESOURCE_PREFIX}-{instance_id}")
}

/// Config object name for an instance: `claw-config-<id>`.
pub fn config_object_name(instance_id: &str) -> String {
    format!("{RESOURCE_PREFIX}-config-{instance_id}")
}

/// Labels attached to every resource owned by an instance.
pub fn instance_labels(
    instance_id: &str,
    tenant_id: &str,
    project_id: &str,
) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_owned(), RESOURCE_PREFIX.to_owned()),
        ("instanceId".to_owned(), instance_id.to_owned()),
        ("tenantId".to_owned(), tenant_id.to_owned()),
        ("projectId".to_owned(), project_id.to_owned()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_derived_from_instance_id() {
        assert_eq!(pod_name("abc-123"), "claw-abc-123");
        assert_eq!(config_object_name("abc-123"), "claw-config-abc-123");
    }

    #[test]
    fn labels_carry_ownership() {
        let labels = instance_labels("i-1", "t-1", "p-1");
        assert_eq!(labels.len(), 4);
        assert_eq!(labels["app"], "claw");
        assert_eq!(labels["instanceId"], "i-1");
        assert_eq!(labels["tenantId"], "t-1");
        assert_eq!(labels["projectId"], "p-1");
    }
}
