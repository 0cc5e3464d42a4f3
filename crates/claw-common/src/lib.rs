//! ---
//! claw_section: "01-core-functionality"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Shared primitives and utilities for the control plane."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
//! Shared primitives for the Claw control plane workspace: configuration
//! loading and tracing initialisation.

pub mod config;
pub mod logging;

pub use config::{
    AppConfig, ClusterConfig, ConfigSource, ImageConfig, LoadedAppConfig, LoggingConfig, MetricsConfig,
    ReconcilerConfig,
};
pub use logging::{init_tracing, resolve_directive, LogFormat, LogTarget, LOG_ENV};
