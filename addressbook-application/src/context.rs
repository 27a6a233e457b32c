use addressbook_domain::domain_event::EventContext;

/// 应用层上下文（Application Context）
///
/// 承载一次应用层调用（命令/查询）所需的横切信息：
/// 业务语境（`EventContext`）包含关联追踪 `correlation_id`、因果链 `causation_id`、
/// 执行者类型/ID 等，会随事件一起持久化。
///
/// 典型用法：
/// ```rust
/// use addressbook_application::context::AppContext;
/// use addressbook_domain::domain_event::EventContext;
///
/// let ctx = AppContext {
///     biz: EventContext::builder()
///         .maybe_correlation_id(Some("cor-123".into()))
///         .maybe_actor_type(Some("user".into()))
///         .maybe_actor_id(Some("u-1".into()))
///         .build(),
/// };
/// assert_eq!(ctx.biz.actor_id(), Some("u-1"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    /// 业务语境（链路追踪、审计主体、操作因果）
    pub biz: EventContext,
}
