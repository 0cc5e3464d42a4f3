//! ---
//! claw_section: "02-config-adapters"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Configuration adapters and adapter registry."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdapterError>;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("invalid configuration: {0}")]
    Validation(String),
    #[error("adapter not found: {0}")]
    NotFound(String),
    #[error("failed to render {kind} configuration: {source}")]
    Render {
        kind: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to parse rendered {kind} configuration: {source}")]
    Parse {
        kind: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unsupported {kind} document version '{version}'")]
    UnsupportedVersion { kind: String, version: String },
}

impl AdapterError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
