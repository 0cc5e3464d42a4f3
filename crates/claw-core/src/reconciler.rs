//! ---
//! claw_section: "01-core-functionality"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Instance lifecycle orchestration."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
//! Background tasks converging persisted status with observed pod readiness.
//!
//! There is at most one task per instance ID. Spawning for an ID that already
//! has a task supersedes it, and [`Reconciler::cancel`] stops and joins the
//! task so that a caller can write status afterwards without being overwritten.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use claw_common::ReconcilerConfig;
use claw_metrics::InstanceMetrics;
use claw_runtime::{pod_name, ClusterGateway, GatewayError};
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::model::InstanceStatus;
use crate::policy::{settle, Step};
use crate::repository::InstanceRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Ready,
    Failed(String),
    TimedOut,
    /// Stopped by cancel, supersede or shutdown before writing any status.
    Cancelled,
}

impl ReconcileOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Failed(_) => "failed",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }

    fn status(&self) -> Option<InstanceStatus> {
        match self {
            Self::Ready => Some(InstanceStatus::Running),
            Self::Failed(_) | Self::TimedOut => Some(InstanceStatus::Failed),
            Self::Cancelled => None,
        }
    }
}

/// Handle on one spawned task. Clones share the kill switch and the
/// completion signal, so any number of callers can wait for the same exit.
#[derive(Clone, Debug)]
struct ReconcileTask {
    generation: u64,
    kill_tx: Arc<watch::Sender<bool>>,
    done_rx: watch::Receiver<Option<ReconcileOutcome>>,
}

impl ReconcileTask {
    fn kill(&self) {
        let _ = self.kill_tx.send(true);
    }

    async fn wait(&self, instance_id: &str) -> Option<ReconcileOutcome> {
        let mut done_rx = self.done_rx.clone();
        loop {
            let current = done_rx.borrow_and_update().clone();
            if current.is_some() {
                return current;
            }
            if done_rx.changed().await.is_err() {
                let outcome = done_rx.borrow().clone();
                if outcome.is_none() {
                    warn!(instance_id = %instance_id, "reconciliation ended without an outcome");
                }
                return outcome;
            }
        }
    }

    /// A dropped sender without an outcome means the task panicked.
    fn is_finished(&self) -> bool {
        self.done_rx.borrow().is_some() || self.done_rx.has_changed().is_err()
    }
}

struct ReconcilerInner {
    gateway: Arc<dyn ClusterGateway>,
    repository: Arc<dyn InstanceRepository>,
    metrics: Option<InstanceMetrics>,
    config: ReconcilerConfig,
    tasks: Mutex<HashMap<String, ReconcileTask>>,
    generation: AtomicU64,
}

#[derive(Clone)]
pub struct Reconciler {
    inner: Arc<ReconcilerInner>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.inner.config)
            .field("tracked", &self.inner.tasks.lock().len())
            .finish()
    }
}

impl Reconciler {
    pub fn new(
        config: ReconcilerConfig,
        gateway: Arc<dyn ClusterGateway>,
        repository: Arc<dyn InstanceRepository>,
        metrics: Option<InstanceMetrics>,
    ) -> Self {
        Self {
            inner: Arc::new(ReconcilerInner {
                gateway,
                repository,
                metrics,
                config,
                tasks: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Start watching the pod of `instance_id`, superseding any earlier task.
    pub fn spawn(&self, instance_id: &str) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst);
        let (kill_tx, kill_rx) = watch::channel(false);
        let (done_tx, done_rx) = watch::channel(None);
        let inner = Arc::clone(&self.inner);
        let id = instance_id.to_owned();
        tokio::spawn(async move {
            let outcome = run(inner, id, kill_rx).await;
            done_tx.send_replace(Some(outcome));
        });
        let entry = ReconcileTask {
            generation,
            kill_tx: Arc::new(kill_tx),
            done_rx,
        };
        let previous = self
            .inner
            .tasks
            .lock()
            .insert(instance_id.to_owned(), entry);
        if let Some(previous) = previous {
            debug!(instance_id = %instance_id, "superseding in-flight reconciliation");
            previous.kill();
        }
    }

    /// Stop the task for `instance_id` and wait until it has exited.
    pub async fn cancel(&self, instance_id: &str) -> Option<ReconcileOutcome> {
        let entry = self.inner.tasks.lock().remove(instance_id)?;
        entry.kill();
        entry.wait(instance_id).await
    }

    /// Wait for the current task of `instance_id` to finish on its own.
    pub async fn join(&self, instance_id: &str) -> Option<ReconcileOutcome> {
        let entry = self.inner.tasks.lock().get(instance_id).cloned()?;
        let outcome = entry.wait(instance_id).await;
        let mut tasks = self.inner.tasks.lock();
        if tasks
            .get(instance_id)
            .is_some_and(|current| current.generation == entry.generation)
        {
            tasks.remove(instance_id);
        }
        outcome
    }

    /// Whether a task for `instance_id` is still polling.
    pub fn is_active(&self, instance_id: &str) -> bool {
        self.inner
            .tasks
            .lock()
            .get(instance_id)
            .is_some_and(|task| !task.is_finished())
    }

    pub fn active_count(&self) -> usize {
        self.inner
            .tasks
            .lock()
            .values()
            .filter(|task| !task.is_finished())
            .count()
    }

    /// Cancel and join every tracked task.
    pub async fn shutdown(&self) {
        let entries: Vec<(String, ReconcileTask)> =
            self.inner.tasks.lock().drain().collect();
        for (_, entry) in &entries {
            entry.kill();
        }
        join_all(
            entries
                .iter()
                .map(|(instance_id, entry)| entry.wait(instance_id)),
        )
        .await;
    }
}

async fn run(
    inner: Arc<ReconcilerInner>,
    instance_id: String,
    mut kill_rx: watch::Receiver<bool>,
) -> ReconcileOutcome {
    let pod = pod_name(&instance_id);
    if let Some(metrics) = &inner.metrics {
        metrics.reconcile_started();
    }

    let wait = inner.gateway.wait_for_ready_every(
        &pod,
        inner.config.ready_timeout,
        inner.config.poll_interval,
    );
    let mut outcome = tokio::select! {
        _ = killed(&mut kill_rx) => ReconcileOutcome::Cancelled,
        result = wait => match result {
            Ok(()) => ReconcileOutcome::Ready,
            Err(GatewayError::Timeout { .. }) => ReconcileOutcome::TimedOut,
            Err(err) => ReconcileOutcome::Failed(err.to_string()),
        },
    };
    if *kill_rx.borrow() {
        outcome = ReconcileOutcome::Cancelled;
    }

    if let Some(status) = outcome.status() {
        let written = settle(
            Step::PersistRecord,
            &instance_id,
            inner.repository.update_status(&instance_id, status).await,
            None,
        );
        if written.is_ok() {
            info!(instance_id = %instance_id, pod = %pod, status = %status, outcome = outcome.label(), "reconciled instance status");
            if let Some(metrics) = &inner.metrics {
                metrics.record_transition(status.as_ref());
            }
        }
    } else {
        debug!(instance_id = %instance_id, "reconciliation cancelled");
    }

    if let Some(metrics) = &inner.metrics {
        metrics.record_reconcile_outcome(outcome.label());
        metrics.reconcile_finished();
    }
    outcome
}

async fn killed(kill_rx: &mut watch::Receiver<bool>) {
    loop {
        if *kill_rx.borrow() {
            return;
        }
        if kill_rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::Utc;
    use claw_runtime::{InMemoryGateway, PodSpec};

    use crate::model::Instance;
    use crate::repository::InMemoryInstanceRepository;

    fn config() -> ReconcilerConfig {
        ReconcilerConfig {
            poll_interval: Duration::from_millis(10),
            ready_timeout: Duration::from_millis(300),
        }
    }

    async fn seed(repo: &InMemoryInstanceRepository, gateway: &InMemoryGateway, id: &str) {
        let now = Utc::now();
        repo.create(&Instance {
            id: id.into(),
            name: format!("agent-{id}"),
            tenant_id: "t".into(),
            project_id: "p".into(),
            kind: "OpenClaw".into(),
            version: String::new(),
            status: InstanceStatus::Creating,
            resources: Default::default(),
            storage: Default::default(),
            rendered_config: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
        gateway
            .create_pod(&PodSpec {
                name: pod_name(id),
                ..PodSpec::default()
            })
            .await
            .unwrap();
    }

    fn reconciler(
        gateway: &InMemoryGateway,
        repo: &Arc<InMemoryInstanceRepository>,
    ) -> Reconciler {
        Reconciler::new(
            config(),
            Arc::new(gateway.clone()),
            repo.clone() as Arc<dyn InstanceRepository>,
            None,
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn ready_pod_becomes_running() {
        let gateway = InMemoryGateway::new();
        let repo = Arc::new(InMemoryInstanceRepository::new());
        seed(&repo, &gateway, "a").await;
        let reconciler = reconciler(&gateway, &repo);

        reconciler.spawn("a");
        gateway.mark_ready("claw-a");
        assert_eq!(reconciler.join("a").await, Some(ReconcileOutcome::Ready));
        assert_eq!(repo.get_by_id("a").await.unwrap().status, InstanceStatus::Running);
        assert!(!reconciler.is_active("a"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pending_pod_times_out_as_failed() {
        let gateway = InMemoryGateway::new();
        let repo = Arc::new(InMemoryInstanceRepository::new());
        seed(&repo, &gateway, "b").await;
        let reconciler = reconciler(&gateway, &repo);

        reconciler.spawn("b");
        assert_eq!(reconciler.join("b").await, Some(ReconcileOutcome::TimedOut));
        assert_eq!(repo.get_by_id("b").await.unwrap().status, InstanceStatus::Failed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_task_writes_nothing() {
        let gateway = InMemoryGateway::new();
        let repo = Arc::new(InMemoryInstanceRepository::new());
        seed(&repo, &gateway, "c").await;
        let reconciler = reconciler(&gateway, &repo);

        reconciler.spawn("c");
        assert_eq!(reconciler.cancel("c").await, Some(ReconcileOutcome::Cancelled));
        gateway.mark_ready("claw-c");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(repo.get_by_id("c").await.unwrap().status, InstanceStatus::Creating);
        assert_eq!(reconciler.cancel("c").await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_waits_while_another_caller_joins() {
        let gateway = InMemoryGateway::new();
        let repo = Arc::new(InMemoryInstanceRepository::new());
        seed(&repo, &gateway, "e").await;
        let reconciler = reconciler(&gateway, &repo);

        reconciler.spawn("e");
        let joiner = {
            let reconciler = reconciler.clone();
            tokio::spawn(async move { reconciler.join("e").await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(reconciler.is_active("e"));

        assert_eq!(reconciler.cancel("e").await, Some(ReconcileOutcome::Cancelled));
        assert_eq!(joiner.await.unwrap(), Some(ReconcileOutcome::Cancelled));
        gateway.mark_ready("claw-e");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(repo.get_by_id("e").await.unwrap().status, InstanceStatus::Creating);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn respawn_supersedes_previous_task() {
        let gateway = InMemoryGateway::new();
        let repo = Arc::new(InMemoryInstanceRepository::new());
        seed(&repo, &gateway, "d").await;
        let reconciler = reconciler(&gateway, &repo);

        reconciler.spawn("d");
        reconciler.spawn("d");
        assert_eq!(reconciler.active_count(), 1);
        gateway.mark_ready("claw-d");
        assert_eq!(reconciler.join("d").await, Some(ReconcileOutcome::Ready));
        reconciler.shutdown().await;
        assert_eq!(reconciler.active_count(), 0);
    }
}
