//! ---
//! claw_section: "03-cluster-runtime"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Cluster resource gateway and workload naming."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
    #[error("pod '{name}' not ready after {timeout:?}")]
    Timeout { name: String, timeout: Duration },
    #[error("pod '{name}' failed: {reason}")]
    PodFailed { name: String, reason: String },
    #[error("cluster backend error during {operation}: {message}")]
    Backend { operation: String, message: String },
}

impl GatewayError {
    pub fn pod_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "pod",
            name: name.into(),
        }
    }

    pub fn config_object_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "config object",
            name: name.into(),
        }
    }

    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
