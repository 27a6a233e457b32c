//! 持久化与事件溯源（persist）
//!
//! 定义事件仓储、快照仓储及其通用组合实现，支持：
//! - 事件追加与按聚合查询，带乐观版本校验（`EventRepository`）；
//! - 快照读写与按事件数触发的策略（`SnapshotRepository`/`SnapshotPolicy`）；
//! - 纯事件或事件 + 快照的聚合仓储实现（`EventSourcedRepo`、`SnapshottingRepo`）；
//! - 进程内存实现（`InMemoryEventRepository`、`InMemorySnapshotRepository`）。
//!
mod aggregate_repository;
mod event_repository;
mod serialized_event;
mod serialized_snapshot;
mod snapshot_repository;

pub use aggregate_repository::{AggregateRepository, EventSourcedRepo, SnapshottingRepo};
pub use event_repository::{EventRepository, InMemoryEventRepository};
pub use serialized_event::{SerializedEvent, deserialize_events, serialize_events};
pub use serialized_snapshot::SerializedSnapshot;
pub use snapshot_repository::{
    InMemorySnapshotRepository, SnapshotPolicy, SnapshotRepository, SnapshotRepositoryWithPolicy,
};
