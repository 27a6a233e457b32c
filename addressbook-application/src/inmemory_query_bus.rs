use crate::{
    context::AppContext, error::AppError, query::Query, query_bus::QueryBus,
    query_handler::QueryHandler,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::{Any, TypeId, type_name};
use std::marker::PhantomData;
use std::sync::Arc;

type BoxAnySend = Box<dyn Any + Send>;

#[async_trait]
trait ErasedQueryHandler: Send + Sync {
    fn query_name(&self) -> &'static str;

    async fn handle_erased(&self, ctx: &AppContext, q: BoxAnySend)
    -> Result<BoxAnySend, AppError>;
}

struct Erased<Q, H> {
    handler: Arc<H>,
    _marker: PhantomData<fn(Q)>,
}

#[async_trait]
impl<Q, H> ErasedQueryHandler for Erased<Q, H>
where
    Q: Query,
    H: QueryHandler<Q> + 'static,
{
    fn query_name(&self) -> &'static str {
        Q::NAME
    }

    async fn handle_erased(
        &self,
        ctx: &AppContext,
        q: BoxAnySend,
    ) -> Result<BoxAnySend, AppError> {
        match q.downcast::<Q>() {
            Ok(q) => {
                let dto = self.handler.handle(ctx, *q).await?;
                Ok(Box::new(dto) as BoxAnySend)
            }
            Err(_) => Err(AppError::TypeMismatch {
                expected: Q::NAME,
                found: "unknown",
            }),
        }
    }
}

/// 基于内存的 QueryBus 实现
/// - 通过 TypeId 注册不同 Query 对应的 Handler
/// - 以类型擦除方式调度，并在调用端还原为 `Q::Dto`
pub struct InMemoryQueryBus {
    handlers: DashMap<TypeId, Arc<dyn ErasedQueryHandler>>,
}

impl Default for InMemoryQueryBus {
    fn default() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }
}

impl InMemoryQueryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册查询处理器
    pub fn register<Q, H>(&self, handler: Arc<H>) -> Result<(), AppError>
    where
        Q: Query,
        H: QueryHandler<Q> + 'static,
    {
        match self.handlers.entry(TypeId::of::<Q>()) {
            Entry::Occupied(_) => Err(AppError::AlreadyRegisteredQuery { query: Q::NAME }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Erased::<Q, H> {
                    handler,
                    _marker: PhantomData,
                }));
                tracing::debug!(query = Q::NAME, "query handler registered");
                Ok(())
            }
        }
    }

    /// 获取已注册的查询名称列表（只读视图）
    pub fn registered_queries(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.iter().map(|e| e.value().query_name()).collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl QueryBus for InMemoryQueryBus {
    async fn dispatch<Q>(&self, ctx: &AppContext, q: Q) -> Result<Q::Dto, AppError>
    where
        Q: Query,
    {
        let Some(handler) = self
            .handlers
            .get(&TypeId::of::<Q>())
            .map(|h| Arc::clone(h.value()))
        else {
            return Err(AppError::HandlerNotFound(Q::NAME));
        };

        let out = handler.handle_erased(ctx, Box::new(q)).await?;

        match out.downcast::<Q::Dto>() {
            Ok(dto) => Ok(*dto),
            Err(_) => Err(AppError::TypeMismatch {
                expected: type_name::<Q::Dto>(),
                found: "unknown",
            }),
        }
    }
}
