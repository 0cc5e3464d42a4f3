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
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{GatewayError, Result};
use crate::spec::{ConfigObjectData, PodHandle, PodPhase, PodSpec, PodStatus};

/// Interval used by [`ClusterGateway::wait_for_ready`].
pub const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Operations the control plane needs from the container cluster.
///
/// Implementations must be idempotent where noted: creating a pod that already
/// exists returns the existing handle, and deleting something that is already
/// gone succeeds.
#[async_trait]
pub trait ClusterGateway: Send + Sync {
    async fn create_pod(&self, spec: &PodSpec) -> Result<PodHandle>;

    async fn delete_pod(&self, name: &str) -> Result<()>;

    async fn get_pod(&self, name: &str) -> Result<PodHandle>;

    async fn pod_status(&self, name: &str) -> Result<PodStatus>;

    /// Last `tail_lines` lines of the workload container output.
    async fn logs(&self, name: &str, tail_lines: usize) -> Result<String>;

    async fn upsert_config_object(
        &self,
        name: &str,
        labels: &BTreeMap<String, String>,
        data: &ConfigObjectData,
    ) -> Result<()>;

    async fn delete_config_object(&self, name: &str) -> Result<()>;

    /// Block until the pod reports ready, fails, or `timeout` elapses.
    async fn wait_for_ready(&self, name: &str, timeout: Duration) -> Result<()> {
        self.wait_for_ready_every(name, timeout, READY_POLL_INTERVAL)
            .await
    }

    /// [`ClusterGateway::wait_for_ready`] with an explicit poll interval.
    ///
    /// Errors while reading the pod are logged and retried on the next tick.
    async fn wait_for_ready_every(
        &self,
        name: &str,
        timeout: Duration,
        interval: Duration,
    ) -> Result<()> {
        let poll = async {
            loop {
                match self.pod_status(name).await {
                    Ok(status) if status.ready => return Ok(()),
                    Ok(status) if status.phase == PodPhase::Failed => {
                        return Err(GatewayError::PodFailed {
                            name: name.to_owned(),
                            reason: status
                                .reason
                                .unwrap_or_else(|| "pod entered Failed phase".to_owned()),
                        });
                    }
                    Ok(status) => {
                        debug!(pod = %name, phase = %status.phase, "pod not ready yet");
                    }
                    Err(err) => {
                        debug!(pod = %name, error = %err, "pod status read failed; retrying");
                    }
                }
                tokio::time::sleep(interval).await;
            }
        };
        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout {
                name: name.to_owned(),
                timeout,
            }),
        }
    }
}
