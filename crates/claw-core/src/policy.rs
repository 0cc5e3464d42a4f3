//! ---
//! claw_section: "01-core-functionality"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Instance lifecycle orchestration."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
//! Which lifecycle steps abort their operation on failure and which only log.

use std::fmt::Display;

use claw_metrics::InstanceMetrics;
use strum::{Display as StrumDisplay, EnumIter};
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Step {
    RenderConfig,
    UpsertConfigObject,
    CreatePod,
    /// Pod removal requested by stop.
    StopPod,
    /// Pod removal during delete or leftover cleanup on start.
    CleanupPod,
    DeleteConfigObject,
    PersistRecord,
    FetchLogs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
#[strum(serialize_all = "kebab-case")]
pub enum FailurePolicy {
    Fatal,
    BestEffort,
}

impl Step {
    pub const fn policy(self) -> FailurePolicy {
        match self {
            Step::RenderConfig
            | Step::UpsertConfigObject
            | Step::CleanupPod
            | Step::DeleteConfigObject => FailurePolicy::BestEffort,
            Step::CreatePod | Step::StopPod | Step::PersistRecord | Step::FetchLogs => {
                FailurePolicy::Fatal
            }
        }
    }
}

/// Settle `result` according to the policy of `step`.
///
/// Fatal failures are returned to the caller; best-effort failures are logged,
/// counted and turned into `Ok(None)`.
pub fn settle<T, E: Display>(
    step: Step,
    instance_id: &str,
    result: Result<T, E>,
    metrics: Option<&InstanceMetrics>,
) -> Result<Option<T>, E> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) => match step.policy() {
            FailurePolicy::BestEffort => {
                warn!(instance_id = %instance_id, step = %step, error = %err, "best-effort step failed; continuing");
                if let Some(metrics) = metrics {
                    metrics.record_best_effort_failure(&step.to_string());
                }
                Ok(None)
            }
            FailurePolicy::Fatal => {
                error!(instance_id = %instance_id, step = %step, error = %err, "step failed");
                Err(err)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claw_metrics::new_registry;
    use strum::IntoEnumIterator;

    #[test]
    fn table_matches_lifecycle_contract() {
        let best_effort: Vec<Step> = Step::iter()
            .filter(|step| step.policy() == FailurePolicy::BestEffort)
            .collect();
        assert_eq!(
            best_effort,
            vec![
                Step::RenderConfig,
                Step::UpsertConfigObject,
                Step::CleanupPod,
                Step::DeleteConfigObject
            ]
        );
    }

    #[test]
    fn best_effort_failures_are_swallowed_and_counted() {
        let metrics = InstanceMetrics::new(new_registry()).unwrap();
        let settled: Result<Option<()>, String> = settle(
            Step::UpsertConfigObject,
            "i-1",
            Err("boom".to_owned()),
            Some(&metrics),
        );
        assert_eq!(settled, Ok(None));
        assert_eq!(metrics.best_effort_failures("upsert_config_object"), 1);
    }

    #[test]
    fn fatal_failures_propagate() {
        let settled: Result<Option<()>, String> =
            settle(Step::CreatePod, "i-1", Err("boom".to_owned()), None);
        assert_eq!(settled, Err("boom".to_owned()));
        let settled: Result<Option<u8>, String> = settle(Step::CreatePod, "i-1", Ok(7), None);
        assert_eq!(settled, Ok(Some(7)));
    }
}
