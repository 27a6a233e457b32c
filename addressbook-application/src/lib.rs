//! 通讯录应用层（addressbook-application）
//!
//! 以命令/查询分离（CQRS）组织通讯录用例：
//! - 命令经 `InMemoryCommandBus` 分发，每条命令在独立的工作单元（`unit_of_work`）中执行，
//!   处理器结束后由总线提交或回滚，并触发登记的补偿钩子；
//! - 查询经 `InMemoryQueryBus` 分发到读模型（`projection`）；
//! - `bootstrap::AddressBook` 在启动时一次性完成全部装配。
//!
pub mod bootstrap;
pub mod command;
pub mod command_bus;
pub mod command_handler;
pub mod config;
pub mod contact;
pub mod context;
pub mod dto;
pub mod error;
pub mod inmemory_command_bus;
pub mod inmemory_query_bus;
pub mod projection;
pub mod query;
pub mod query_bus;
pub mod query_handler;
pub mod unit_of_work;

pub use bootstrap::AddressBook;
pub use inmemory_command_bus::InMemoryCommandBus;
pub use inmemory_query_bus::InMemoryQueryBus;
