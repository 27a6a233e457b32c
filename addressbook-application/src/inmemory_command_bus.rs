use crate::{
    command::Command,
    command_bus::CommandBus,
    command_handler::CommandHandler,
    context::AppContext,
    error::AppError,
    unit_of_work::{DefaultUnitOfWork, UnitOfWork},
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::Instrument;

/// 类型擦除后的处理器，便于以 `TypeId` 为键统一存放
#[async_trait]
trait ErasedCommandHandler: Send + Sync {
    async fn handle_erased(
        &self,
        ctx: &AppContext,
        uow: &dyn UnitOfWork,
        cmd: Box<dyn Any + Send>,
    ) -> Result<(), AppError>;
}

struct Erased<C, H> {
    handler: Arc<H>,
    _marker: PhantomData<fn(C)>,
}

#[async_trait]
impl<C, H> ErasedCommandHandler for Erased<C, H>
where
    C: Command,
    H: CommandHandler<C> + 'static,
{
    async fn handle_erased(
        &self,
        ctx: &AppContext,
        uow: &dyn UnitOfWork,
        cmd: Box<dyn Any + Send>,
    ) -> Result<(), AppError> {
        // 键与处理器来自同一泛型 C，正常情况下 downcast 不会失败
        match cmd.downcast::<C>() {
            Ok(cmd) => self.handler.handle(ctx, uow, *cmd).await,
            Err(_) => Err(AppError::TypeMismatch {
                expected: C::NAME,
                found: "unknown",
            }),
        }
    }
}

/// 基于内存的 CommandBus 实现
/// - 启动时通过 `register` 显式登记 Command 与 Handler 的对应关系
/// - 每次分发创建一个工作单元：处理器成功则提交，失败则回滚
pub struct InMemoryCommandBus {
    handlers: DashMap<TypeId, Arc<dyn ErasedCommandHandler>>,
}

impl Default for InMemoryCommandBus {
    fn default() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }
}

impl InMemoryCommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册命令处理器；同一命令重复注册返回错误
    pub fn register<C, H>(&self, handler: Arc<H>) -> Result<(), AppError>
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        match self.handlers.entry(TypeId::of::<C>()) {
            Entry::Occupied(_) => Err(AppError::AlreadyRegisteredCommand { command: C::NAME }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Erased::<C, H> {
                    handler,
                    _marker: PhantomData,
                }));
                tracing::debug!(command = C::NAME, "command handler registered");
                Ok(())
            }
        }
    }

    /// 已注册的命令数量
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl CommandBus for InMemoryCommandBus {
    async fn dispatch<C: Command>(&self, ctx: &AppContext, cmd: C) -> Result<(), AppError> {
        let Some(handler) = self
            .handlers
            .get(&TypeId::of::<C>())
            .map(|h| Arc::clone(h.value()))
        else {
            return Err(AppError::HandlerNotFound(C::NAME));
        };

        let span = tracing::info_span!(
            "command",
            name = C::NAME,
            correlation_id = ctx.biz.correlation_id().unwrap_or_default()
        );

        let uow = DefaultUnitOfWork::new();
        let result = handler
            .handle_erased(ctx, &uow, Box::new(cmd))
            .instrument(span.clone())
            .await;

        span.in_scope(|| match &result {
            Ok(()) => {
                uow.commit();
            }
            Err(err) => {
                tracing::warn!(error = %err, "command failed, rolling back");
                uow.rollback();
            }
        });

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit_of_work::UnitOfWorkHook;
    use addressbook_domain::error::DomainError;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Touch {
        fail: bool,
    }

    impl Command for Touch {
        const NAME: &'static str = "Touch";
    }

    #[derive(Debug)]
    struct Unregistered;

    impl Command for Unregistered {
        const NAME: &'static str = "Unregistered";
    }

    struct TouchHandler {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl TouchHandler {
        fn hook(&self, label: &'static str) -> UnitOfWorkHook {
            let log = self.log.clone();
            Box::new(move || log.lock().unwrap().push(label))
        }
    }

    #[async_trait]
    impl CommandHandler<Touch> for TouchHandler {
        async fn handle(
            &self,
            _ctx: &AppContext,
            uow: &dyn UnitOfWork,
            cmd: Touch,
        ) -> Result<(), AppError> {
            uow.after_commit(self.hook("committed"));
            uow.on_rollback(self.hook("rolled back"));
            if cmd.fail {
                return Err(DomainError::invalid_state("touch failed").into());
            }
            Ok(())
        }
    }

    fn bus_with_log() -> (InMemoryCommandBus, Arc<Mutex<Vec<&'static str>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = InMemoryCommandBus::new();
        bus.register::<Touch, _>(Arc::new(TouchHandler { log: log.clone() }))
            .unwrap();
        (bus, log)
    }

    #[tokio::test]
    async fn successful_handler_commits() {
        let (bus, log) = bus_with_log();
        bus.dispatch(&AppContext::default(), Touch { fail: false })
            .await
            .unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["committed"]);
    }

    #[tokio::test]
    async fn failing_handler_rolls_back_and_propagates_error() {
        let (bus, log) = bus_with_log();
        let err = bus
            .dispatch(&AppContext::default(), Touch { fail: true })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::InvalidState { .. })
        ));
        assert_eq!(*log.lock().unwrap(), vec!["rolled back"]);
    }

    #[tokio::test]
    async fn unknown_command_is_handler_not_found() {
        let (bus, _) = bus_with_log();
        let err = bus
            .dispatch(&AppContext::default(), Unregistered)
            .await
            .unwrap_err();
        match err {
            AppError::HandlerNotFound(name) => assert_eq!(name, "Unregistered"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let (bus, log) = bus_with_log();
        let err = bus
            .register::<Touch, _>(Arc::new(TouchHandler { log }))
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::AlreadyRegisteredCommand { command: "Touch" }
        ));
        assert_eq!(bus.len(), 1);
    }
}
