//! 聚合仓储组合实现
//!
//! 基于事件溯源（Event Store）与快照（Snapshot）的通用聚合仓储实现。
//! 保存成功的事件会发布到可选的事件总线，以驱动读模型。
//!
use crate::error::DomainError;
use crate::eventing::EventBus;
use crate::{
    aggregate::Aggregate,
    domain_event::{EventContext, EventEnvelope},
    persist::{
        EventRepository, SnapshotRepository, SnapshotRepositoryWithPolicy, deserialize_events,
        serialize_events,
    },
};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait AggregateRepository<A>: Send + Sync
where
    A: Aggregate,
{
    async fn load(&self, aggregate_id: &A::Id) -> Result<Option<A>, A::Error>;

    async fn save(
        &self,
        aggregate: &A,
        events: Vec<A::Event>,
        context: EventContext,
    ) -> Result<Vec<EventEnvelope<A>>, A::Error>;
}

#[async_trait]
impl<A, T> AggregateRepository<A> for Arc<T>
where
    A: Aggregate,
    T: AggregateRepository<A> + ?Sized,
{
    async fn load(&self, aggregate_id: &A::Id) -> Result<Option<A>, A::Error> {
        (**self).load(aggregate_id).await
    }

    async fn save(
        &self,
        aggregate: &A,
        events: Vec<A::Event>,
        context: EventContext,
    ) -> Result<Vec<EventEnvelope<A>>, A::Error> {
        (**self).save(aggregate, events, context).await
    }
}

/// 基于事件存储的通用聚合仓储实现。
/// - 使用 `EventRepository` 读取/保存事件
/// - 保存后将事件发布到 `EventBus`（若已配置）
pub struct EventSourcedRepo<E> {
    event_repo: Arc<E>,
    event_bus: Option<Arc<dyn EventBus>>,
}

impl<E> EventSourcedRepo<E>
where
    E: EventRepository,
{
    pub fn new(event_repo: Arc<E>) -> Self {
        Self {
            event_repo,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: Arc<dyn EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// 在给定聚合状态之上重放其后的事件；聚合从未保存过时返回 `None`
    pub async fn replay<A>(&self, mut aggregate: A) -> Result<Option<A>, DomainError>
    where
        A: Aggregate,
    {
        let serialized = self
            .event_repo
            .get_last_events::<A>(&aggregate.id().to_string(), aggregate.version())
            .await?;

        if serialized.is_empty() && aggregate.version() == 0 {
            return Ok(None);
        }

        let envelopes = deserialize_events::<A>(&serialized)?;

        for env in envelopes {
            aggregate.apply(&env.payload);
        }

        Ok(Some(aggregate))
    }

    async fn append<A>(
        &self,
        aggregate: &A,
        events: Vec<A::Event>,
        context: EventContext,
    ) -> Result<Vec<EventEnvelope<A>>, DomainError>
    where
        A: Aggregate,
    {
        let envelopes: Vec<EventEnvelope<A>> = events
            .into_iter()
            .map(|e| EventEnvelope::new(aggregate.id(), e, context.clone()))
            .collect();

        if envelopes.is_empty() {
            return Ok(envelopes);
        }

        let serialized = serialize_events(&envelopes)?;
        let stored = self.event_repo.save(serialized).await?;

        if let Some(bus) = &self.event_bus {
            bus.publish_batch(&stored).await?;
        }

        Ok(envelopes)
    }
}

#[async_trait]
impl<A, E> AggregateRepository<A> for EventSourcedRepo<E>
where
    A: Aggregate,
    E: EventRepository + Send + Sync,
    A::Error: From<DomainError>,
{
    async fn load(&self, aggregate_id: &A::Id) -> Result<Option<A>, A::Error> {
        let aggregate = self
            .replay(A::new(aggregate_id.clone(), 0))
            .await
            .map_err(A::Error::from)?;

        Ok(aggregate)
    }

    async fn save(
        &self,
        aggregate: &A,
        events: Vec<A::Event>,
        context: EventContext,
    ) -> Result<Vec<EventEnvelope<A>>, A::Error> {
        self.append(aggregate, events, context)
            .await
            .map_err(A::Error::from)
    }
}

/// 基于事件存储 + 快照 的通用聚合仓储实现。
/// - 优先使用快照恢复聚合，再重放快照版本之后的增量事件
/// - 保存事件后按策略写入快照；快照失败只记录日志
pub struct SnapshottingRepo<E, S>
where
    E: EventRepository,
    S: SnapshotRepository,
{
    events: EventSourcedRepo<E>,
    snapshots: Arc<SnapshotRepositoryWithPolicy<S>>,
}

impl<E, S> SnapshottingRepo<E, S>
where
    E: EventRepository,
    S: SnapshotRepository,
{
    pub fn new(events: EventSourcedRepo<E>, snapshots: Arc<SnapshotRepositoryWithPolicy<S>>) -> Self {
        Self { events, snapshots }
    }
}

#[async_trait]
impl<A, E, S> AggregateRepository<A> for SnapshottingRepo<E, S>
where
    A: Aggregate,
    E: EventRepository + Send + Sync,
    S: SnapshotRepository + Send + Sync,
    A::Error: From<DomainError>,
{
    async fn load(&self, aggregate_id: &A::Id) -> Result<Option<A>, A::Error> {
        let start = match self
            .snapshots
            .get_snapshot::<A>(&aggregate_id.to_string())
            .await?
        {
            Some(snapshot) => snapshot.to_aggregate::<A>()?,
            None => A::new(aggregate_id.clone(), 0),
        };

        let aggregate = self.events.replay(start).await?;
        Ok(aggregate)
    }

    async fn save(
        &self,
        aggregate: &A,
        events: Vec<A::Event>,
        context: EventContext,
    ) -> Result<Vec<EventEnvelope<A>>, A::Error> {
        let previous_version = aggregate.version().saturating_sub(events.len());
        let envelopes = self.events.append(aggregate, events, context).await?;

        if let Err(err) = self
            .snapshots
            .save_if_due(aggregate, previous_version)
            .await
        {
            tracing::warn!(
                aggregate_type = A::TYPE,
                aggregate_id = %aggregate.id(),
                error = %err,
                "snapshot not written"
            );
        }

        Ok(envelopes)
    }
}
