//! ---
//! claw_section: "01-core-functionality"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Instance lifecycle orchestration."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use crate::model::{Instance, InstanceStatus};

pub type Result<T> = std::result::Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("instance '{0}' not found")]
    NotFound(String),
    #[error("instance name '{name}' already exists in tenant '{tenant_id}'")]
    Conflict { tenant_id: String, name: String },
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Single-record persistence for instances.
#[async_trait]
pub trait InstanceRepository: Send + Sync {
    /// Insert a new record; `(tenant_id, name)` must be unique.
    async fn create(&self, instance: &Instance) -> Result<()>;

    async fn get_by_id(&self, id: &str) -> Result<Instance>;

    async fn get_by_name(&self, tenant_id: &str, name: &str) -> Result<Option<Instance>>;

    /// Records newest first. An empty tenant or project matches any; a zero
    /// `limit` returns everything after `offset`.
    async fn list(
        &self,
        tenant_id: &str,
        project_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Instance>>;

    /// Replace the stored record with `instance`.
    async fn update(&self, instance: &Instance) -> Result<()>;

    /// Blind single-field status write.
    async fn update_status(&self, id: &str, status: InstanceStatus) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryInstanceRepository {
    records: RwLock<HashMap<String, Instance>>,
    fail_writes: AtomicBool,
}

impl InMemoryInstanceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail with a backend error until switched off.
    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Backend("writes disabled".to_owned()));
        }
        Ok(())
    }
}

fn name_taken(records: &HashMap<String, Instance>, candidate: &Instance) -> bool {
    records.values().any(|existing| {
        existing.id != candidate.id
            && existing.tenant_id == candidate.tenant_id
            && existing.name == candidate.name
    })
}

#[async_trait]
impl InstanceRepository for InMemoryInstanceRepository {
    async fn create(&self, instance: &Instance) -> Result<()> {
        self.check_writable()?;
        let mut records = self.records.write();
        if name_taken(&records, instance) {
            return Err(RepositoryError::Conflict {
                tenant_id: instance.tenant_id.clone(),
                name: instance.name.clone(),
            });
        }
        records.insert(instance.id.clone(), instance.clone());
        debug!(instance_id = %instance.id, "instance record created");
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Instance> {
        self.records
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_owned()))
    }

    async fn get_by_name(&self, tenant_id: &str, name: &str) -> Result<Option<Instance>> {
        Ok(self
            .records
            .read()
            .values()
            .find(|instance| instance.tenant_id == tenant_id && instance.name == name)
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: &str,
        project_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Instance>> {
        let mut matching: Vec<Instance> = self
            .records
            .read()
            .values()
            .filter(|instance| tenant_id.is_empty() || instance.tenant_id == tenant_id)
            .filter(|instance| project_id.is_empty() || instance.project_id == project_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        let take = if limit == 0 { usize::MAX } else { limit };
        Ok(matching.into_iter().skip(offset).take(take).collect())
    }

    async fn update(&self, instance: &Instance) -> Result<()> {
        self.check_writable()?;
        let mut records = self.records.write();
        if !records.contains_key(&instance.id) {
            return Err(RepositoryError::NotFound(instance.id.clone()));
        }
        if name_taken(&records, instance) {
            return Err(RepositoryError::Conflict {
                tenant_id: instance.tenant_id.clone(),
                name: instance.name.clone(),
            });
        }
        records.insert(instance.id.clone(), instance.clone());
        Ok(())
    }

    async fn update_status(&self, id: &str, status: InstanceStatus) -> Result<()> {
        self.check_writable()?;
        let mut records = self.records.write();
        let record = records
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_owned()))?;
        record.status = status;
        record.updated_at = Utc::now();
        debug!(instance_id = %id, status = %status, "instance status written");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.check_writable()?;
        self.records
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn instance(id: &str, tenant: &str, project: &str, name: &str, age_secs: i64) -> Instance {
        let at = Utc::now() - Duration::seconds(age_secs);
        Instance {
            id: id.into(),
            name: name.into(),
            tenant_id: tenant.into(),
            project_id: project.into(),
            kind: "OpenClaw".into(),
            version: String::new(),
            status: InstanceStatus::Creating,
            resources: Default::default(),
            storage: Default::default(),
            rendered_config: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn names_are_unique_per_tenant() {
        let repo = InMemoryInstanceRepository::new();
        repo.create(&instance("1", "t1", "p", "agent", 0)).await.unwrap();
        repo.create(&instance("2", "t2", "p", "agent", 0)).await.unwrap();
        let err = repo
            .create(&instance("3", "t1", "p", "agent", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));
        assert_eq!(
            repo.get_by_name("t2", "agent").await.unwrap().map(|i| i.id),
            Some("2".to_owned())
        );
        assert!(repo.get_by_name("t3", "agent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_filtered() {
        let repo = InMemoryInstanceRepository::new();
        repo.create(&instance("old", "t", "p1", "a", 30)).await.unwrap();
        repo.create(&instance("mid", "t", "p2", "b", 20)).await.unwrap();
        repo.create(&instance("new", "t", "p1", "c", 10)).await.unwrap();
        repo.create(&instance("other", "u", "p1", "d", 5)).await.unwrap();

        let ids = |list: Vec<Instance>| list.into_iter().map(|i| i.id).collect::<Vec<_>>();
        assert_eq!(ids(repo.list("t", "", 0, 0).await.unwrap()), ["new", "mid", "old"]);
        assert_eq!(ids(repo.list("t", "p1", 0, 0).await.unwrap()), ["new", "old"]);
        assert_eq!(ids(repo.list("", "", 2, 1).await.unwrap()), ["new", "mid"]);
    }

    #[tokio::test]
    async fn status_write_and_delete_report_missing_records() {
        let repo = InMemoryInstanceRepository::new();
        assert!(matches!(
            repo.update_status("missing", InstanceStatus::Running).await,
            Err(RepositoryError::NotFound(_))
        ));
        repo.create(&instance("1", "t", "p", "a", 0)).await.unwrap();
        repo.update_status("1", InstanceStatus::Running).await.unwrap();
        assert_eq!(repo.get_by_id("1").await.unwrap().status, InstanceStatus::Running);
        repo.delete("1").await.unwrap();
        assert!(matches!(repo.delete("1").await, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn disabled_writes_fail_with_backend_error() {
        let repo = InMemoryInstanceRepository::new();
        repo.fail_writes(true);
        assert!(matches!(
            repo.create(&instance("1", "t", "p", "a", 0)).await,
            Err(RepositoryError::Backend(_))
        ));
        assert!(repo.is_empty());
    }
}
