//! 事件分发（eventing）
//!
//! 已保存的事件在保存它们的任务内同步投递给订阅的处理器（订阅式处理），
//! 用于驱动读模型投影：
//! - `EventBus`：发布与订阅接口；
//! - `EventHandler`：消费某类/多类/全部事件；
//! - `SimpleEventBus`：进程内实现，按订阅顺序依次调用处理器。
//!
mod bus;
mod bus_simple;
mod handler;

pub use bus::EventBus;
pub use bus_simple::SimpleEventBus;
pub use handler::{EventHandler, HandledEventType};
