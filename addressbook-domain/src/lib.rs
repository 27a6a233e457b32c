//! 通讯录领域层（addressbook-domain）
//!
//! 提供通讯录示例所需的领域构件：
//! - 聚合（`aggregate`）与实体（`entity`）建模，以及联系人聚合（`contact`）
//! - 领域事件（`domain_event`）与事件信封
//! - 联系人名称占用登记（`name_claim`），保证名称全局唯一
//! - 基于事件溯源与快照的仓储（`persist`）
//! - 进程内事件分发（`eventing`），用于驱动读模型投影
//!
//! 典型用法：
//! 1. 通过 `AggregateRoot` 编排“加载 → 执行命令 → 应用事件 → 持久化”；
//! 2. 在 `persist` 中选择纯事件或事件 + 快照的仓储组合；
//! 3. 通过 `eventing::EventBus` 将已保存的事件投递给读模型。
//!
pub mod aggregate;
pub mod aggregate_root;
pub mod contact;
pub mod domain_event;
pub mod entity;
pub mod error;
pub mod eventing;
pub mod name_claim;
pub mod persist;
