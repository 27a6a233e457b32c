use crate::{command::Command, context::AppContext, error::AppError, unit_of_work::UnitOfWork};
use async_trait::async_trait;

/// 命令处理器
///
/// `uow` 为本次命令所在的工作单元，处理器通过它登记提交/回滚后的补偿动作；
/// 提交或回滚由调用方（命令总线）根据返回结果决定。
#[async_trait]
pub trait CommandHandler<C>: Send + Sync
where
    C: Command,
{
    async fn handle(&self, ctx: &AppContext, uow: &dyn UnitOfWork, cmd: C) -> Result<(), AppError>;
}
