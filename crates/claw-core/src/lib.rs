//! ---
//! claw_section: "01-core-functionality"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Instance lifecycle orchestration."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
//! Instance lifecycle orchestration for the Claw control plane.

pub mod error;
pub mod image;
pub mod model;
pub mod orchestrator;
pub mod policy;
pub mod reconciler;
pub mod repository;

pub use error::{OrchestratorError, Result};
pub use image::resolve_image;
pub use model::{
    CreateInstanceRequest, Instance, InstanceStatus, ResourceSpec, StorageSpec,
    UpdateInstanceRequest,
};
pub use orchestrator::{InstanceOrchestrator, OrchestratorSettings, DEFAULT_LOG_TAIL};
pub use policy::{settle, FailurePolicy, Step};
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use repository::{InMemoryInstanceRepository, InstanceRepository, RepositoryError};
