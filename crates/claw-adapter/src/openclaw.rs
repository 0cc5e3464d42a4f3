//! ---
//! claw_section: "02-config-adapters"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Configuration adapters and adapter registry."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{AdapterError, Result};
use crate::unified::{
    LoggingConfig, MemoryConfig, ModelConfig, PluginConfig, ServerConfig, UnifiedConfig,
    VolumeMount,
};
use crate::{image_reference, ConfigAdapter, OPEN_CLAW};

const DOCUMENT_VERSION: &str = "1.0";
const MODEL_PROVIDER: &str = "anthropic";
const IMAGE_BASE: &str = "openclaw/openclaw";
const CONFIG_DIR: &str = "/etc/claw/config";
const DATA_DIR: &str = "/var/lib/claw";

/// Adapter rendering the OpenClaw YAML document.
#[derive(Debug, Clone)]
pub struct OpenClawAdapter {
    config: UnifiedConfig,
}

impl OpenClawAdapter {
    /// Adapter seeded with [`OpenClawAdapter::defaults`].
    pub fn new() -> Self {
        Self {
            config: Self::defaults(),
        }
    }

    /// Adapter whose working state is exactly `config`; no merge with defaults.
    pub fn with_config(config: UnifiedConfig) -> Self {
        Self { config }
    }

    pub fn defaults() -> UnifiedConfig {
        UnifiedConfig {
            model: ModelConfig {
                name: "claude-3-haiku".to_owned(),
                max_tokens: 4096,
                temperature: 0.7,
                ..ModelConfig::default()
            },
            memory: MemoryConfig {
                limit: 100_000,
                storage_type: "sqlite".to_owned(),
                persist_path: format!("{DATA_DIR}/memory.db"),
            },
            server: ServerConfig {
                port: 8080,
                host: "0.0.0.0".to_owned(),
                cors_origins: vec!["*".to_owned()],
                headers: BTreeMap::new(),
            },
            logging: LoggingConfig {
                level: "info".to_owned(),
                format: "json".to_owned(),
                output: "stdout".to_owned(),
            },
            plugins: PluginConfig::default(),
        }
    }

    fn document(&self) -> OpenClawDocument {
        let config = &self.config;
        OpenClawDocument {
            version: DOCUMENT_VERSION.to_owned(),
            model: OpenClawModel {
                provider: MODEL_PROVIDER.to_owned(),
                name: config.model.name.clone(),
                api_key: config.model.api_key.clone(),
                base_url: config.model.base_url.clone(),
                max_tokens: config.model.max_tokens,
                temperature: config.model.temperature,
            },
            memory: OpenClawMemory {
                kind: config.memory.storage_type.clone(),
                limit: config.memory.limit,
                persist_path: config.memory.persist_path.clone(),
                ttl: None,
            },
            server: OpenClawServer {
                port: config.server.port,
                host: config.server.host.clone(),
                cors_origins: config.server.cors_origins.clone(),
                headers: config.server.headers.clone(),
            },
            logging: OpenClawLogging {
                level: config.logging.level.clone(),
                format: config.logging.format.clone(),
                output: config.logging.output.clone(),
            },
            plugins: config.plugins.config.clone(),
            skills: config
                .plugins
                .enabled
                .iter()
                .map(|name| OpenClawSkill {
                    name: name.clone(),
                    enabled: true,
                    config: BTreeMap::new(),
                })
                .collect(),
        }
    }
}

impl Default for OpenClawAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigAdapter for OpenClawAdapter {
    fn kind(&self) -> &str {
        OPEN_CLAW
    }

    fn parse_config(&mut self, unified: &UnifiedConfig) -> Result<()> {
        self.config.overlay(unified);
        debug!(kind = OPEN_CLAW, model = %self.config.model.name, port = self.config.server.port, "merged caller configuration");
        Ok(())
    }

    fn generate_config(&self) -> Result<String> {
        serde_yaml::to_string(&self.document()).map_err(|source| AdapterError::Render {
            kind: OPEN_CLAW.to_owned(),
            source,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.config.model.name.trim().is_empty() {
            return Err(AdapterError::validation("model name is required"));
        }
        if self.config.memory.limit <= 0 {
            return Err(AdapterError::validation("memory limit must be positive"));
        }
        if !(1..=65_535).contains(&self.config.server.port) {
            return Err(AdapterError::validation(format!(
                "invalid server port {}",
                self.config.server.port
            )));
        }
        Ok(())
    }

    fn load_rendered(&self, rendered: &str) -> Result<UnifiedConfig> {
        let document: OpenClawDocument =
            serde_yaml::from_str(rendered).map_err(|source| AdapterError::Parse {
                kind: OPEN_CLAW.to_owned(),
                source,
            })?;
        if document.version != DOCUMENT_VERSION {
            return Err(AdapterError::UnsupportedVersion {
                kind: OPEN_CLAW.to_owned(),
                version: document.version,
            });
        }
        Ok(UnifiedConfig {
            model: ModelConfig {
                name: document.model.name,
                api_key: document.model.api_key,
                base_url: document.model.base_url,
                max_tokens: document.model.max_tokens,
                temperature: document.model.temperature,
            },
            memory: MemoryConfig {
                limit: document.memory.limit,
                storage_type: document.memory.kind,
                persist_path: document.memory.persist_path,
            },
            server: ServerConfig {
                port: document.server.port,
                host: document.server.host,
                cors_origins: document.server.cors_origins,
                headers: document.server.headers,
            },
            logging: LoggingConfig {
                level: document.logging.level,
                format: document.logging.format,
                output: document.logging.output,
            },
            plugins: PluginConfig {
                enabled: document
                    .skills
                    .into_iter()
                    .filter(|skill| skill.enabled)
                    .map(|skill| skill.name)
                    .collect(),
                config: document.plugins,
            },
        })
    }

    fn config(&self) -> &UnifiedConfig {
        &self.config
    }

    fn image(&self, version: &str) -> String {
        image_reference(IMAGE_BASE, version)
    }

    fn env_vars(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("CLAW_TYPE".to_owned(), "openclaw".to_owned()),
            (
                "CLAW_CONFIG_PATH".to_owned(),
                format!("{CONFIG_DIR}/config.yaml"),
            ),
        ])
    }

    fn volume_mounts(&self) -> Vec<VolumeMount> {
        vec![
            VolumeMount {
                name: "config".to_owned(),
                mount_path: CONFIG_DIR.to_owned(),
                read_only: true,
            },
            VolumeMount {
                name: "data".to_owned(),
                mount_path: DATA_DIR.to_owned(),
                read_only: false,
            },
        ]
    }

    fn default_config(&self) -> UnifiedConfig {
        Self::defaults()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenClawDocument {
    version: String,
    model: OpenClawModel,
    memory: OpenClawMemory,
    server: OpenClawServer,
    logging: OpenClawLogging,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    plugins: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    skills: Vec<OpenClawSkill>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenClawModel {
    provider: String,
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    api_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    base_url: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    max_tokens: i64,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenClawMemory {
    #[serde(rename = "type")]
    kind: String,
    limit: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    persist_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ttl: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenClawServer {
    port: i64,
    host: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    cors_origins: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenClawLogging {
    level: String,
    format: String,
    output: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenClawSkill {
    name: String,
    enabled: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    config: BTreeMap<String, Value>,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn is_zero_f64(value: &f64) -> bool {
    *value == 0.0
}
