//! 进程内事件总线（SimpleEventBus）
//!
//! 在发布者所在任务内按订阅顺序依次调用匹配的处理器。
//! 处理器失败只记录日志，不影响事件发布方：事件一旦保存即视为已发生。
//!
use crate::error::{DomainError, DomainResult as Result};
use crate::eventing::{EventBus, EventHandler};
use crate::persist::SerializedEvent;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

#[derive(Default)]
pub struct SimpleEventBus {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl SimpleEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot_handlers(&self) -> Result<Vec<Arc<dyn EventHandler>>> {
        self.handlers
            .read()
            .map(|hs| hs.clone())
            .map_err(|e| DomainError::EventBus {
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl EventBus for SimpleEventBus {
    async fn publish(&self, event: &SerializedEvent) -> Result<()> {
        let handlers = self.snapshot_handlers()?;

        for handler in handlers
            .iter()
            .filter(|h| h.handled_event_type().matches(event.event_type()))
        {
            if let Err(err) = handler.handle(event).await {
                tracing::error!(
                    handler = handler.handler_name(),
                    event_id = event.event_id(),
                    event_type = event.event_type(),
                    error = %err,
                    "event handler failed"
                );
            }
        }

        Ok(())
    }

    fn subscribe(&self, handler: Arc<dyn EventHandler>) -> Result<()> {
        let mut handlers = self.handlers.write().map_err(|e| DomainError::EventBus {
            reason: e.to_string(),
        })?;
        tracing::debug!(handler = handler.handler_name(), "event handler subscribed");
        handlers.push(handler);
        Ok(())
    }
}
