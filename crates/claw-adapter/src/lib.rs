//! ---
//! claw_section: "02-config-adapters"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Configuration adapters and adapter registry."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
//! Translation from the vendor-neutral [`UnifiedConfig`] into the configuration
//! document each Claw instance type understands.

use std::collections::BTreeMap;

pub mod error;
pub mod openclaw;
pub mod registry;
pub mod unified;

pub use error::{AdapterError, Result};
pub use openclaw::OpenClawAdapter;
pub use registry::{AdapterConstructor, AdapterRegistry};
pub use unified::{
    LoggingConfig, MemoryConfig, ModelConfig, PluginConfig, ServerConfig, UnifiedConfig,
    VolumeMount,
};

/// Instance type served by [`OpenClawAdapter`].
pub const OPEN_CLAW: &str = "OpenClaw";
/// Instance type reserved for the lightweight runtime; no adapter ships for it yet.
pub const NANO_CLAW: &str = "NanoClaw";

/// Tag used when the caller does not pin a version.
pub const DEFAULT_IMAGE_TAG: &str = "latest";

/// Unified interface implemented by instance-type specific adapters.
///
/// An adapter is created fresh for every render and carries a working copy of
/// the merged configuration through `parse_config -> validate -> generate_config`.
pub trait ConfigAdapter: Send + Sync {
    /// Instance type this adapter renders for.
    fn kind(&self) -> &str;

    /// Merge caller-supplied fields over the defaults captured at construction.
    fn parse_config(&mut self, unified: &UnifiedConfig) -> Result<()>;

    /// Render the merged state into the adapter's native document.
    fn generate_config(&self) -> Result<String>;

    /// Check the merged state before it is rendered.
    fn validate(&self) -> Result<()>;

    /// Read a document produced by [`ConfigAdapter::generate_config`] back into
    /// the vendor-neutral tree.
    fn load_rendered(&self, rendered: &str) -> Result<UnifiedConfig>;

    /// Current merged configuration.
    fn config(&self) -> &UnifiedConfig;

    /// Fully qualified container image for the given version.
    fn image(&self, version: &str) -> String;

    /// Environment entries the workload container expects.
    fn env_vars(&self) -> BTreeMap<String, String>;

    /// Volumes the workload container expects.
    fn volume_mounts(&self) -> Vec<VolumeMount>;

    /// Defaults this instance type starts from.
    fn default_config(&self) -> UnifiedConfig;
}

/// Build `<base>:<version>`, substituting [`DEFAULT_IMAGE_TAG`] for a blank version.
pub fn image_reference(base: &str, version: &str) -> String {
    let version = version.trim();
    let tag = if version.is_empty() {
        DEFAULT_IMAGE_TAG
    } else {
        version
    };
    format!("{base}:{tag}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_version_resolves_to_latest() {
        assert_eq!(image_reference("openclaw/openclaw", ""), "openclaw/openclaw:latest");
        assert_eq!(image_reference("openclaw/openclaw", "  "), "openclaw/openclaw:latest");
        assert_eq!(image_reference("openclaw/openclaw", "1.4.2"), "openclaw/openclaw:1.4.2");
    }
}
