use crate::{error::DomainResult as Result, eventing::EventHandler, persist::SerializedEvent};
use async_trait::async_trait;
use std::sync::Arc;

/// 事件总线：负责分发事件与登记订阅者
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: &SerializedEvent) -> Result<()>;

    async fn publish_batch(&self, events: &[SerializedEvent]) -> Result<()> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }

    /// 登记处理器，之后发布的事件会投递给它
    fn subscribe(&self, handler: Arc<dyn EventHandler>) -> Result<()>;
}
