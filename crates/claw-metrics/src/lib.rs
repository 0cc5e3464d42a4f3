//! ---
//! claw_section: "04-observability"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Metrics collection and export utilities."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use std::sync::Arc;

use anyhow::{Context, Result};
use prometheus::{IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tracing::error;

/// Shared registry type used across the control plane.
pub type SharedRegistry = Arc<Registry>;

/// Produce a new shared registry.
pub fn new_registry() -> SharedRegistry {
    Arc::new(Registry::new())
}

/// Render every family in `registry` in the Prometheus text format.
pub fn encode_text(registry: &Registry) -> Result<String> {
    let families = registry.gather();
    TextEncoder::new()
        .encode_to_string(&families)
        .inspect_err(|err| error!(error = %err, "failed to encode metrics"))
        .context("metrics encoding error")
}

/// Lifecycle metrics recorded by the instance orchestrator and reconciler.
#[derive(Clone, Debug)]
pub struct InstanceMetrics {
    registry: SharedRegistry,
    transitions: IntCounterVec,
    best_effort_failures: IntCounterVec,
    reconcile_outcomes: IntCounterVec,
    reconciles_in_flight: IntGauge,
}

impl InstanceMetrics {
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let transitions = IntCounterVec::new(
            Opts::new(
                "claw_instance_transitions_total",
                "Persisted instance status transitions",
            ),
            &["status"],
        )?;
        registry.register(Box::new(transitions.clone()))?;

        let best_effort_failures = IntCounterVec::new(
            Opts::new(
                "claw_best_effort_failures_total",
                "Failures of best-effort steps that did not abort their operation",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(best_effort_failures.clone()))?;

        let reconcile_outcomes = IntCounterVec::new(
            Opts::new(
                "claw_reconcile_outcomes_total",
                "Completed status reconciliations by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(reconcile_outcomes.clone()))?;

        let reconciles_in_flight = IntGauge::with_opts(Opts::new(
            "claw_reconciles_in_flight",
            "Reconciliation tasks currently polling",
        ))?;
        registry.register(Box::new(reconciles_in_flight.clone()))?;

        Ok(Self {
            registry,
            transitions,
            best_effort_failures,
            reconcile_outcomes,
            reconciles_in_flight,
        })
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    pub fn record_transition(&self, status: &str) {
        self.transitions.with_label_values(&[status]).inc();
    }

    pub fn record_best_effort_failure(&self, operation: &str) {
        self.best_effort_failures
            .with_label_values(&[operation])
            .inc();
    }

    pub fn record_reconcile_outcome(&self, outcome: &str) {
        self.reconcile_outcomes.with_label_values(&[outcome]).inc();
    }

    pub fn reconcile_started(&self) {
        self.reconciles_in_flight.inc();
    }

    pub fn reconcile_finished(&self) {
        self.reconciles_in_flight.dec();
    }

    pub fn transitions(&self, status: &str) -> u64 {
        self.transitions.with_label_values(&[status]).get()
    }

    pub fn best_effort_failures(&self, operation: &str) -> u64 {
        self.best_effort_failures
            .with_label_values(&[operation])
            .get()
    }

    pub fn reconcile_outcomes(&self, outcome: &str) -> u64 {
        self.reconcile_outcomes.with_label_values(&[outcome]).get()
    }

    pub fn in_flight(&self) -> i64 {
        self.reconciles_in_flight.get()
    }
}
