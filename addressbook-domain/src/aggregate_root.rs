//! 聚合根编排器（AggregateRoot）
//!
//! 封装“加载聚合 → 执行命令 → 应用事件 → 持久化事件”的标准流程，
//! 以仓储实现（`AggregateRepository`）为依赖，便于在应用层直接调用。
//!
use crate::{
    aggregate::Aggregate, domain_event::EventContext, domain_event::EventEnvelope,
    entity::Entity, persist::AggregateRepository,
};
use std::marker::PhantomData;

/// 面向应用层的聚合根编排器。
///
/// - `A`：聚合类型（实现 `Aggregate`）
/// - `R`：聚合仓储（实现 `AggregateRepository<A>`）
pub struct AggregateRoot<A, R>
where
    A: Aggregate,
    R: AggregateRepository<A>,
{
    repo: R,
    _marker: PhantomData<fn() -> A>,
}

impl<A, R> AggregateRoot<A, R>
where
    A: Aggregate,
    R: AggregateRepository<A>,
{
    /// 创建编排器实例
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            _marker: PhantomData,
        }
    }

    /// 加载聚合，不存在时返回 `None`
    pub async fn load(&self, aggregate_id: &A::Id) -> Result<Option<A>, A::Error> {
        self.repo.load(aggregate_id).await
    }

    /// 在全新的聚合实例上执行命令并持久化。
    ///
    /// 同一标识已存在事件时，由仓储的版本校验拒绝保存。
    pub async fn create(
        &self,
        aggregate_id: &A::Id,
        command: A::Command,
        context: EventContext,
    ) -> Result<(A, Vec<EventEnvelope<A>>), A::Error> {
        let aggregate = <A as Entity>::new(aggregate_id.clone(), 0);
        self.execute(aggregate, command, context).await
    }

    /// 在已加载的聚合上执行命令：
    /// 1. 执行命令得到新事件；
    /// 2. 应用事件到聚合状态；
    /// 3. 调用仓储持久化并返回新状态与事件信封。
    pub async fn execute(
        &self,
        mut aggregate: A,
        command: A::Command,
        context: EventContext,
    ) -> Result<(A, Vec<EventEnvelope<A>>), A::Error> {
        let events = aggregate.execute(command)?;

        for event in &events {
            aggregate.apply(event);
        }

        let envelopes = self.repo.save(&aggregate, events, context).await?;

        Ok((aggregate, envelopes))
    }
}
