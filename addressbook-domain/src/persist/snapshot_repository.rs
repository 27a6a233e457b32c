//! 快照仓储协议与策略
//!
//! 定义聚合快照读写接口，以及按事件数量触发快照的策略：
//! 一次保存跨越了 `Every(n)` 的整数倍版本时写入快照。
//!
use crate::{
    aggregate::Aggregate,
    error::{DomainError, DomainResult as Result},
    persist::SerializedSnapshot,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// 读取聚合最近一次快照
    async fn get_snapshot<A: Aggregate>(
        &self,
        aggregate_id: &str,
    ) -> Result<Option<SerializedSnapshot>>;

    async fn save<A: Aggregate>(&self, aggregate: &A) -> Result<()>;
}

#[async_trait]
impl<T> SnapshotRepository for Arc<T>
where
    T: SnapshotRepository + ?Sized,
{
    async fn get_snapshot<A: Aggregate>(
        &self,
        aggregate_id: &str,
    ) -> Result<Option<SerializedSnapshot>> {
        (**self).get_snapshot::<A>(aggregate_id).await
    }

    async fn save<A: Aggregate>(&self, aggregate: &A) -> Result<()> {
        (**self).save::<A>(aggregate).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotPolicy {
    Never,
    Every(usize),
}

impl SnapshotPolicy {
    /// 从 `previous_version` 保存到 `current_version` 时是否应写入快照
    pub fn should_snapshot(&self, previous_version: usize, current_version: usize) -> bool {
        match self {
            SnapshotPolicy::Never => false,
            SnapshotPolicy::Every(interval) => {
                let interval = (*interval).max(1);
                current_version > previous_version
                    && current_version / interval > previous_version / interval
            }
        }
    }
}

/// SnapshotRepository 的装饰器，根据策略决定是否落盘快照
pub struct SnapshotRepositoryWithPolicy<R> {
    inner: R,
    policy: SnapshotPolicy,
}

impl<R> SnapshotRepositoryWithPolicy<R>
where
    R: SnapshotRepository,
{
    pub fn new(inner: R, policy: SnapshotPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> SnapshotPolicy {
        self.policy
    }

    pub async fn get_snapshot<A: Aggregate>(
        &self,
        aggregate_id: &str,
    ) -> Result<Option<SerializedSnapshot>> {
        self.inner.get_snapshot::<A>(aggregate_id).await
    }

    /// 按策略保存快照，返回是否实际写入
    pub async fn save_if_due<A: Aggregate>(
        &self,
        aggregate: &A,
        previous_version: usize,
    ) -> Result<bool> {
        if !self
            .policy
            .should_snapshot(previous_version, aggregate.version())
        {
            return Ok(false);
        }

        self.inner.save::<A>(aggregate).await?;
        Ok(true)
    }
}

/// 内存快照存储：每个聚合仅保留最新快照
#[derive(Debug, Default)]
pub struct InMemorySnapshotRepository {
    snapshots: DashMap<(String, String), SerializedSnapshot>,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[async_trait]
impl SnapshotRepository for InMemorySnapshotRepository {
    async fn get_snapshot<A: Aggregate>(
        &self,
        aggregate_id: &str,
    ) -> Result<Option<SerializedSnapshot>> {
        let key = (A::TYPE.to_string(), aggregate_id.to_string());
        Ok(self.snapshots.get(&key).map(|s| s.value().clone()))
    }

    async fn save<A: Aggregate>(&self, aggregate: &A) -> Result<()> {
        let snapshot = SerializedSnapshot::from_aggregate(aggregate)?;
        let key = (A::TYPE.to_string(), aggregate.id().to_string());

        let stored_version = self.snapshots.get(&key).map(|s| s.aggregate_version());
        if let Some(stored_version) = stored_version
            && stored_version > snapshot.aggregate_version()
        {
            return Err(DomainError::snapshot_repository(format!(
                "snapshot for {}:{} is already at version {}",
                A::TYPE,
                aggregate.id(),
                stored_version
            )));
        }

        tracing::debug!(
            aggregate_type = A::TYPE,
            aggregate_id = %aggregate.id(),
            version = snapshot.aggregate_version(),
            "snapshot stored"
        );
        self.snapshots.insert(key, snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{Contact, ContactCommand};
    use crate::entity::Entity;

    #[test]
    fn policy_triggers_when_crossing_interval() {
        assert!(!SnapshotPolicy::Never.should_snapshot(4, 5));

        let every_five = SnapshotPolicy::Every(5);
        assert!(!every_five.should_snapshot(0, 4));
        assert!(every_five.should_snapshot(4, 5));
        assert!(every_five.should_snapshot(3, 7));
        assert!(!every_five.should_snapshot(5, 9));
        assert!(every_five.should_snapshot(9, 10));
        assert!(!every_five.should_snapshot(5, 5));
    }

    #[test]
    fn zero_interval_behaves_like_every_event() {
        let policy = SnapshotPolicy::Every(0);
        for v in 1..=4 {
            assert!(policy.should_snapshot(v - 1, v));
        }
    }

    #[tokio::test]
    async fn snapshot_roundtrip_and_type_check() {
        let mut contact = Contact::new("c-1".to_string(), 0);
        for e in contact
            .execute(ContactCommand::Create {
                name: "Alice".into(),
            })
            .unwrap()
        {
            contact.apply(&e);
        }

        let repo = InMemorySnapshotRepository::new();
        repo.save(&contact).await.unwrap();
        assert_eq!(repo.len(), 1);

        let snap = repo.get_snapshot::<Contact>("c-1").await.unwrap().unwrap();
        assert_eq!(snap.aggregate_version(), 1);
        let restored: Contact = snap.to_aggregate().unwrap();
        assert_eq!(restored.name(), "Alice");
        assert_eq!(restored.version(), 1);

        assert!(repo.get_snapshot::<Contact>("c-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn decorator_only_saves_when_due() {
        let repo = SnapshotRepositoryWithPolicy::new(
            Arc::new(InMemorySnapshotRepository::new()),
            SnapshotPolicy::Every(2),
        );
        let mut contact = Contact::new("c-3".to_string(), 0);
        for e in contact
            .execute(ContactCommand::Create { name: "A".into() })
            .unwrap()
        {
            contact.apply(&e);
        }
        assert!(!repo.save_if_due(&contact, 0).await.unwrap());

        for e in contact
            .execute(ContactCommand::ChangeName { name: "B".into() })
            .unwrap()
        {
            contact.apply(&e);
        }
        assert!(repo.save_if_due(&contact, 1).await.unwrap());
        assert!(repo.get_snapshot::<Contact>("c-3").await.unwrap().is_some());
    }
}
