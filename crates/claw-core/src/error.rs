//! ---
//! claw_section: "01-core-functionality"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Instance lifecycle orchestration."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use claw_adapter::AdapterError;
use claw_runtime::GatewayError;
use thiserror::Error;

use crate::model::InstanceStatus;
use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Every orchestrator operation fails with exactly one of these.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("instance '{0}' not found")]
    NotFound(String),
    #[error("cannot {operation} instance '{id}' while it is {status}")]
    InvalidStatus {
        id: String,
        operation: &'static str,
        status: InstanceStatus,
    },
    #[error("cluster gateway error: {0}")]
    Gateway(#[source] GatewayError),
    #[error("timed out waiting for pod '{0}'")]
    Timeout(String),
    #[error("repository error: {0}")]
    Repository(#[source] RepositoryError),
}

impl From<GatewayError> for OrchestratorError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Timeout { name, .. } => Self::Timeout(name),
            other => Self::Gateway(other),
        }
    }
}

impl From<RepositoryError> for OrchestratorError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::NotFound(id),
            RepositoryError::Conflict { .. } => Self::Validation(err.to_string()),
            other => Self::Repository(other),
        }
    }
}

impl From<AdapterError> for OrchestratorError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::NotFound(kind) => Self::NotFound(kind),
            other => Self::Validation(other.to_string()),
        }
    }
}
