//! ---
//! claw_section: "02-config-adapters"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Configuration adapters and adapter registry."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
//! Vendor-neutral configuration tree accepted from callers.
//!
//! A [`UnifiedConfig`] only lives for the duration of one render; adapters
//! translate it into their own document and only that output is persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnifiedConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub plugins: PluginConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub max_tokens: i64,
    #[serde(default)]
    pub temperature: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub storage_type: String,
    #[serde(default)]
    pub persist_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Signed so out-of-range caller input survives deserialisation and is
    /// rejected by adapter validation instead.
    #[serde(default)]
    pub port: i64,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub output: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Plugin names to enable; rendered as skills by adapters that support them.
    #[serde(default)]
    pub enabled: Vec<String>,
    #[serde(default)]
    pub config: BTreeMap<String, Value>,
}

/// Additional volume a given instance type expects inside its pod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    pub read_only: bool,
}

impl UnifiedConfig {
    /// Overlay the caller-provided fields of `input` onto `self`.
    ///
    /// A field counts as provided when it is a non-empty string, a positive
    /// number, or a non-empty collection. Everything else keeps the value
    /// already present in `self`.
    pub fn overlay(&mut self, input: &UnifiedConfig) {
        overlay_str(&mut self.model.name, &input.model.name);
        overlay_str(&mut self.model.api_key, &input.model.api_key);
        overlay_str(&mut self.model.base_url, &input.model.base_url);
        overlay_positive(&mut self.model.max_tokens, input.model.max_tokens);
        if input.model.temperature > 0.0 {
            self.model.temperature = input.model.temperature;
        }

        overlay_positive(&mut self.memory.limit, input.memory.limit);
        overlay_str(&mut self.memory.storage_type, &input.memory.storage_type);
        overlay_str(&mut self.memory.persist_path, &input.memory.persist_path);

        overlay_positive(&mut self.server.port, input.server.port);
        overlay_str(&mut self.server.host, &input.server.host);
        if !input.server.cors_origins.is_empty() {
            self.server.cors_origins = input.server.cors_origins.clone();
        }
        if !input.server.headers.is_empty() {
            self.server.headers = input.server.headers.clone();
        }

        overlay_str(&mut self.logging.level, &input.logging.level);
        overlay_str(&mut self.logging.format, &input.logging.format);
        overlay_str(&mut self.logging.output, &input.logging.output);

        if !input.plugins.enabled.is_empty() {
            self.plugins.enabled = input.plugins.enabled.clone();
        }
        if !input.plugins.config.is_empty() {
            self.plugins.config = input.plugins.config.clone();
        }
    }
}

fn overlay_str(target: &mut String, value: &str) {
    if !value.is_empty() {
        *target = value.to_owned();
    }
}

fn overlay_positive(target: &mut i64, value: i64) {
    if value > 0 {
        *target = value;
    }
}
