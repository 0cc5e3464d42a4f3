//! ---
//! claw_section: "01-core-functionality"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Shared primitives and utilities for the control plane."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds};
use tracing::debug;

use crate::logging::{LogFormat, LogTarget};

fn default_namespace() -> String {
    "default".to_owned()
}

fn default_config_mount_path() -> String {
    "/etc/claw/config".to_owned()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_ready_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_baseline_image() -> String {
    "claw/base".to_owned()
}

fn default_fallback_images() -> IndexMap<String, String> {
    let mut table = IndexMap::new();
    table.insert("OpenClaw".to_owned(), "openclaw/openclaw".to_owned());
    table.insert("NanoClaw".to_owned(), "nanoclaw/nanoclaw".to_owned());
    table
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn enabled() -> bool {
    true
}

/// Primary configuration object for the control plane.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub images: ImageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Where the effective configuration file was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Named by `CLAW_CONFIG`.
    Environment(PathBuf),
    /// First existing entry of the candidate list.
    Candidate(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Environment(path) | Self::Candidate(path) => path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: ConfigSource,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "CLAW_CONFIG";

    /// `CLAW_CONFIG` when set and non-blank, else the first candidate on disk.
    pub fn locate<P: AsRef<Path>>(candidates: &[P]) -> Option<ConfigSource> {
        let from_env = std::env::var(Self::ENV_CONFIG_PATH)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|value| ConfigSource::Environment(PathBuf::from(value)));
        from_env.or_else(|| {
            candidates
                .iter()
                .map(AsRef::as_ref)
                .find(|path| path.exists())
                .map(|path| ConfigSource::Candidate(path.to_path_buf()))
        })
    }

    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        let source = Self::locate(candidates).ok_or_else(|| {
            let inspected = candidates
                .iter()
                .map(|candidate| candidate.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            anyhow!(
                "no claw configuration found; set {} or create one of: {inspected}",
                Self::ENV_CONFIG_PATH
            )
        })?;
        let config = Self::from_path(source.path())?;
        Ok(LoadedAppConfig { config, source })
    }

    /// Read one file, ignoring `CLAW_CONFIG`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading claw configuration");
        let raw = fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration {}", path.display()))?;
        raw.parse::<Self>()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.cluster.validate()?;
        self.reconciler.validate()?;
        self.images.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config = toml::from_str::<Self>(content).context("malformed configuration TOML")?;
        config.validate()?;
        Ok(config)
    }
}

/// Where instance workloads land inside the cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Directory inside the pod where the config object is mounted.
    #[serde(default = "default_config_mount_path")]
    pub config_mount_path: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            config_mount_path: default_config_mount_path(),
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(anyhow!("cluster namespace cannot be empty"));
        }
        if !self.config_mount_path.starts_with('/') {
            return Err(anyhow!(
                "config mount path '{}' must be absolute",
                self.config_mount_path
            ));
        }
        Ok(())
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    #[serde(rename = "poll_interval_ms", default = "default_poll_interval")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub poll_interval: Duration,
    #[serde(rename = "ready_timeout_secs", default = "default_ready_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub ready_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            ready_timeout: default_ready_timeout(),
        }
    }
}

impl ReconcilerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(anyhow!("reconciler poll interval must be positive"));
        }
        if self.ready_timeout < self.poll_interval {
            return Err(anyhow!(
                "reconciler ready timeout ({:?}) is shorter than the poll interval ({:?})",
                self.ready_timeout,
                self.poll_interval
            ));
        }
        Ok(())
    }
}

/// Image lookup used when no adapter is registered for an instance type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_fallback_images")]
    pub fallback: IndexMap<String, String>,
    #[serde(default = "default_baseline_image")]
    pub baseline: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            fallback: default_fallback_images(),
            baseline: default_baseline_image(),
        }
    }
}

impl ImageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.baseline.trim().is_empty() {
            return Err(anyhow!("baseline image cannot be empty"));
        }
        if let Some((kind, _)) = self.fallback.iter().find(|(_, image)| image.trim().is_empty()) {
            return Err(anyhow!("fallback image for type '{}' is empty", kind));
        }
        Ok(())
    }

    /// Base image (without tag) for the given instance type.
    pub fn base_image_for(&self, kind: &str) -> &str {
        self.fallback
            .get(kind)
            .map(String::as_str)
            .unwrap_or(self.baseline.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
    /// Filter directive used when neither `CLAW_LOG` nor `RUST_LOG` is set.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "enabled")]
    pub file_output: bool,
    #[serde(default)]
    pub target: LogTarget,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            format: default_log_format(),
            file_prefix: None,
            level: default_log_level(),
            file_output: enabled(),
            target: LogTarget::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::from_str("").expect("defaults are valid");
        assert_eq!(config.cluster.namespace, "default");
        assert_eq!(config.cluster.config_mount_path, "/etc/claw/config");
        assert_eq!(config.reconciler.poll_interval, Duration::from_secs(1));
        assert_eq!(config.reconciler.ready_timeout, Duration::from_secs(300));
        assert_eq!(config.images.base_image_for("OpenClaw"), "openclaw/openclaw");
        assert_eq!(config.images.base_image_for("Unknown"), "claw/base");
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file_output);
    }

    #[test]
    fn reconciler_durations_use_explicit_units() {
        let config = AppConfig::from_str(
            r#"
            [reconciler]
            poll_interval_ms = 250
            ready_timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.reconciler.poll_interval, Duration::from_millis(250));
        assert_eq!(config.reconciler.ready_timeout, Duration::from_secs(30));
    }

    #[test]
    fn relative_mount_path_is_rejected() {
        let err = AppConfig::from_str(
            r#"
            [cluster]
            config_mount_path = "etc/claw"
            "#,
        )
        .expect_err("relative mount path");
        assert!(err.to_string().contains("must be absolute"));
    }

    #[test]
    fn timeout_shorter_than_interval_is_rejected() {
        let err = AppConfig::from_str(
            r#"
            [reconciler]
            poll_interval_ms = 5000
            ready_timeout_secs = 1
            "#,
        )
        .expect_err("timeout below interval");
        assert!(err.to_string().contains("shorter than the poll interval"));
    }
}
