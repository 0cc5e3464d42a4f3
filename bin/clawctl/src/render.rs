//! ---
//! claw_section: "05-operator-interfaces"
//! claw_subsection: "binary"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Operator CLI for the Claw control plane."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use claw_adapter::{AdapterRegistry, UnifiedConfig};
use claw_common::config::AppConfig;
use claw_core::resolve_image;

pub fn list_types(config: &AppConfig) -> Result<()> {
    let registry = AdapterRegistry::with_builtin();
    println!("adapters:");
    for kind in registry.supported_types() {
        println!("  {kind}");
    }
    println!("image fallback (baseline {}):", config.images.baseline);
    for (kind, image) in &config.images.fallback {
        println!("  {kind} -> {image}");
    }
    Ok(())
}

/// Read a caller configuration tree from YAML or JSON.
pub fn read_unified(path: &Path) -> Result<UnifiedConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("unable to read input file {}", path.display()))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse input file {}", path.display()))
}

#[derive(Debug, Args)]
pub struct RenderCommand {
    /// Instance type, e.g. OpenClaw.
    #[arg(long = "type", value_name = "TYPE", default_value = "OpenClaw")]
    kind: String,

    /// Caller configuration (YAML or JSON); defaults apply when omitted.
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Print the merged configuration tree as JSON instead of the rendered document.
    #[arg(long)]
    merged: bool,
}

impl RenderCommand {
    pub fn execute(self) -> Result<()> {
        let registry = AdapterRegistry::with_builtin();
        let mut adapter = registry
            .create(&self.kind)
            .with_context(|| format!("no adapter for instance type '{}'", self.kind))?;
        if let Some(path) = &self.input {
            adapter.parse_config(&read_unified(path)?)?;
        }
        adapter.validate()?;
        if self.merged {
            println!("{}", serde_json::to_string_pretty(adapter.config())?);
        } else {
            print!("{}", adapter.generate_config()?);
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct ImageCommand {
    #[arg(long = "type", value_name = "TYPE")]
    kind: String,

    /// Image tag; blank resolves to `latest`.
    #[arg(long, value_name = "TAG", default_value = "")]
    version: String,
}

impl ImageCommand {
    pub fn execute(self, config: &AppConfig) -> Result<()> {
        let registry = AdapterRegistry::with_builtin();
        println!(
            "{}",
            resolve_image(&registry, &config.images, &self.kind, &self.version)
        );
        Ok(())
    }
}
