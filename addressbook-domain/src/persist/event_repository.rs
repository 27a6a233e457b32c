//! 事件仓储协议与内存实现
//!
//! 事件按聚合追加保存，追加时校验聚合版本连续性（乐观并发），
//! 并由存储层分配全局递增的事件位点。
//!
use crate::{
    aggregate::Aggregate,
    error::{DomainError, DomainResult as Result},
    persist::SerializedEvent,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// 读取聚合的全部事件（按聚合版本升序）
    async fn get_events<A: Aggregate>(&self, aggregate_id: &str) -> Result<Vec<SerializedEvent>>;

    /// 读取聚合版本大于 `last_version` 的事件
    async fn get_last_events<A: Aggregate>(
        &self,
        aggregate_id: &str,
        last_version: usize,
    ) -> Result<Vec<SerializedEvent>>;

    /// 追加同一聚合的一批事件，返回分配了位点的事件
    async fn save(&self, events: Vec<SerializedEvent>) -> Result<Vec<SerializedEvent>>;
}

#[async_trait]
impl<T> EventRepository for Arc<T>
where
    T: EventRepository + ?Sized,
{
    async fn get_events<A: Aggregate>(&self, aggregate_id: &str) -> Result<Vec<SerializedEvent>> {
        (**self).get_events::<A>(aggregate_id).await
    }

    async fn get_last_events<A: Aggregate>(
        &self,
        aggregate_id: &str,
        last_version: usize,
    ) -> Result<Vec<SerializedEvent>> {
        (**self)
            .get_last_events::<A>(aggregate_id, last_version)
            .await
    }

    async fn save(&self, events: Vec<SerializedEvent>) -> Result<Vec<SerializedEvent>> {
        (**self).save(events).await
    }
}

/// 内存事件存储：单一全局日志，按写入顺序分配位点
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    log: Mutex<Vec<SerializedEvent>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全局日志的只读副本（按位点升序）
    pub fn all_events(&self) -> Result<Vec<SerializedEvent>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<SerializedEvent>>> {
        self.log
            .lock()
            .map_err(|e| DomainError::event_repository(e.to_string()))
    }

    fn select(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        last_version: usize,
    ) -> Result<Vec<SerializedEvent>> {
        let log = self.lock()?;
        Ok(log
            .iter()
            .filter(|e| {
                e.aggregate_type() == aggregate_type
                    && e.aggregate_id() == aggregate_id
                    && e.aggregate_version() > last_version
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn get_events<A: Aggregate>(&self, aggregate_id: &str) -> Result<Vec<SerializedEvent>> {
        self.select(A::TYPE, aggregate_id, 0)
    }

    async fn get_last_events<A: Aggregate>(
        &self,
        aggregate_id: &str,
        last_version: usize,
    ) -> Result<Vec<SerializedEvent>> {
        self.select(A::TYPE, aggregate_id, last_version)
    }

    async fn save(&self, events: Vec<SerializedEvent>) -> Result<Vec<SerializedEvent>> {
        let Some(first) = events.first() else {
            return Ok(Vec::new());
        };
        let aggregate_type = first.aggregate_type().to_string();
        let aggregate_id = first.aggregate_id().to_string();

        if events
            .iter()
            .any(|e| e.aggregate_type() != aggregate_type || e.aggregate_id() != aggregate_id)
        {
            return Err(DomainError::event_repository(
                "a batch must belong to a single aggregate",
            ));
        }

        let mut log = self.lock()?;

        let current = log
            .iter()
            .filter(|e| e.aggregate_type() == aggregate_type && e.aggregate_id() == aggregate_id)
            .map(SerializedEvent::aggregate_version)
            .max()
            .unwrap_or(0);

        for (offset, event) in events.iter().enumerate() {
            if event.aggregate_version() != current + offset + 1 {
                return Err(DomainError::VersionConflict {
                    expected: event.aggregate_version().saturating_sub(1),
                    actual: current + offset,
                });
            }
        }

        let base = log.len() as i64;
        let stored: Vec<SerializedEvent> = events
            .into_iter()
            .enumerate()
            .map(|(i, e)| e.with_sequence_number(base + i as i64 + 1))
            .collect();
        log.extend(stored.iter().cloned());

        tracing::debug!(
            aggregate_type = %aggregate_type,
            aggregate_id = %aggregate_id,
            count = stored.len(),
            "events appended"
        );

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Contact;
    use chrono::Utc;

    fn event(id: &str, version: usize) -> SerializedEvent {
        SerializedEvent::builder()
            .event_id(ulid::Ulid::new().to_string())
            .event_type("ContactEvent.NameChanged".into())
            .event_version(1)
            .aggregate_id(id.to_string())
            .aggregate_type("contact".into())
            .aggregate_version(version)
            .occurred_at(Utc::now())
            .payload(serde_json::json!({
                "NameChanged": { "id": "e", "aggregate_version": version, "name": "n" }
            }))
            .context(serde_json::json!({}))
            .build()
    }

    #[tokio::test]
    async fn append_assigns_global_sequence_numbers() {
        let repo = InMemoryEventRepository::new();
        let a = repo.save(vec![event("a", 1), event("a", 2)]).await.unwrap();
        let b = repo.save(vec![event("b", 1)]).await.unwrap();

        assert_eq!(a[0].sequence_number(), Some(1));
        assert_eq!(a[1].sequence_number(), Some(2));
        assert_eq!(b[0].sequence_number(), Some(3));
        assert_eq!(repo.all_events().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn stale_writer_gets_version_conflict() {
        let repo = InMemoryEventRepository::new();
        repo.save(vec![event("a", 1)]).await.unwrap();

        let err = repo.save(vec![event("a", 1)]).await.unwrap_err();
        match err {
            DomainError::VersionConflict { expected, actual } => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(repo.all_events().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn get_last_events_filters_by_version() {
        let repo = InMemoryEventRepository::new();
        repo.save(vec![event("a", 1), event("a", 2), event("a", 3)])
            .await
            .unwrap();

        let tail = repo.get_last_events::<Contact>("a", 1).await.unwrap();
        assert_eq!(
            tail.iter().map(|e| e.aggregate_version()).collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert!(repo.get_events::<Contact>("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mixed_batch_is_rejected() {
        let repo = InMemoryEventRepository::new();
        let err = repo
            .save(vec![event("a", 1), event("b", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EventRepository { .. }));
    }
}
