//! ---
//! claw_section: "01-core-functionality"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Instance lifecycle orchestration."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use claw_adapter::{image_reference, AdapterRegistry};
use claw_common::ImageConfig;

/// Container image for an instance type and version.
///
/// The registered adapter decides when there is one; otherwise the configured
/// fallback table, then the baseline image. A blank version becomes `latest`.
pub fn resolve_image(
    adapters: &AdapterRegistry,
    images: &ImageConfig,
    kind: &str,
    version: &str,
) -> String {
    match adapters.create(kind) {
        Ok(adapter) => adapter.image(version),
        Err(_) => image_reference(images.base_image_for(kind.trim()), version),
    }
}
