//! ---
//! claw_section: "01-core-functionality"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Instance lifecycle orchestration."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use claw_adapter::UnifiedConfig;
use claw_runtime::ResourceQuantities;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::OrchestratorError;

/// Lifecycle status of an instance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum InstanceStatus {
    Creating,
    Running,
    Stopped,
    Failed,
    /// Reported for removed records only; never persisted.
    Destroyed,
}

impl InstanceStatus {
    pub fn can_start(self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }

    pub fn can_stop(self) -> bool {
        self == Self::Running
    }

    pub fn can_delete(self) -> bool {
        !matches!(self, Self::Running | Self::Destroyed)
    }
}

/// CPU and memory quantity strings; blank means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    #[serde(default)]
    pub cpu: String,
    #[serde(default)]
    pub memory: String,
}

impl ResourceSpec {
    /// Quantities applied as both request and limit.
    pub fn quantities(&self) -> ResourceQuantities {
        fn present(value: &str) -> Option<String> {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_owned())
        }
        ResourceQuantities {
            cpu: present(&self.cpu),
            memory: present(&self.memory),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSpec {
    #[serde(default)]
    pub config_dir: String,
    #[serde(default)]
    pub data_dir: String,
    #[serde(default)]
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub tenant_id: String,
    pub project_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub status: InstanceStatus,
    #[serde(default)]
    pub resources: ResourceSpec,
    #[serde(default)]
    pub storage: StorageSpec,
    /// Rendered configuration document as produced by the type's adapter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_config: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateInstanceRequest {
    pub name: String,
    pub tenant_id: String,
    pub project_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub config: Option<UnifiedConfig>,
    #[serde(default)]
    pub resources: Option<ResourceSpec>,
    #[serde(default)]
    pub storage: Option<StorageSpec>,
}

impl CreateInstanceRequest {
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        for (field, value) in [
            ("name", &self.name),
            ("tenant_id", &self.tenant_id),
            ("project_id", &self.project_id),
            ("type", &self.kind),
        ] {
            if value.trim().is_empty() {
                return Err(OrchestratorError::Validation(format!("{field} is required")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateInstanceRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub config: Option<UnifiedConfig>,
    #[serde(default)]
    pub resources: Option<ResourceSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_spellings_are_stable() {
        for (status, text) in [
            (InstanceStatus::Creating, "Creating"),
            (InstanceStatus::Running, "Running"),
            (InstanceStatus::Stopped, "Stopped"),
            (InstanceStatus::Failed, "Failed"),
            (InstanceStatus::Destroyed, "Destroyed"),
        ] {
            assert_eq!(status.to_string(), text);
            assert_eq!(InstanceStatus::from_str(text).unwrap(), status);
            assert_eq!(serde_json::to_string(&status).unwrap(), format!("\"{text}\""));
        }
    }

    #[test]
    fn guards_match_transition_table() {
        use InstanceStatus::*;
        assert_eq!(
            [Creating, Running, Stopped, Failed].map(InstanceStatus::can_start),
            [false, false, true, true]
        );
        assert_eq!(
            [Creating, Running, Stopped, Failed].map(InstanceStatus::can_stop),
            [false, true, false, false]
        );
        assert_eq!(
            [Creating, Running, Stopped, Failed].map(InstanceStatus::can_delete),
            [true, false, true, true]
        );
    }

    #[test]
    fn blank_request_fields_are_rejected() {
        let request = CreateInstanceRequest {
            name: "agent".into(),
            tenant_id: "t".into(),
            project_id: " ".into(),
            kind: "OpenClaw".into(),
            ..CreateInstanceRequest::default()
        };
        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("project_id"));
    }

    #[test]
    fn kind_serialises_as_type() {
        let request: CreateInstanceRequest = serde_json::from_str(
            r#"{"name":"a","tenant_id":"t","project_id":"p","type":"OpenClaw"}"#,
        )
        .unwrap();
        assert_eq!(request.kind, "OpenClaw");
        assert!(request.version.is_empty());
    }

    #[test]
    fn blank_quantities_are_unset() {
        let spec = ResourceSpec {
            cpu: "500m".into(),
            memory: "  ".into(),
        };
        let quantities = spec.quantities();
        assert_eq!(quantities.cpu.as_deref(), Some("500m"));
        assert!(quantities.memory.is_none());
    }
}
