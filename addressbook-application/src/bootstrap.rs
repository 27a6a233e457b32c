//! 启动装配
//!
//! 在进程启动时一次性构建全部组件并显式注册命令/查询处理器。
//!
use crate::{
    command::Command,
    command_bus::CommandBus,
    config::AddressBookConfig,
    contact::{
        ChangeContactName, ContactCommandHandler, ContactQueryHandler, CreateContact,
        GetContactDetails, ListClaimedNames, ListContacts, ListStoredEvents, RemoveContact,
    },
    context::AppContext,
    error::AppError,
    inmemory_command_bus::InMemoryCommandBus,
    inmemory_query_bus::InMemoryQueryBus,
    projection::InMemoryContactProjection,
    query::Query,
    query_bus::QueryBus,
};
use addressbook_domain::eventing::{EventBus, SimpleEventBus};
use addressbook_domain::name_claim::InMemoryNameClaimRegistry;
use addressbook_domain::persist::{
    EventSourcedRepo, InMemoryEventRepository, InMemorySnapshotRepository,
    SnapshotRepositoryWithPolicy, SnapshottingRepo,
};
use std::sync::Arc;

pub type ContactRepository =
    SnapshottingRepo<InMemoryEventRepository, Arc<InMemorySnapshotRepository>>;

pub type ContactHandler =
    ContactCommandHandler<ContactRepository, InMemoryNameClaimRegistry, InMemoryContactProjection>;

/// 装配完成的通讯录应用
pub struct AddressBook {
    command_bus: InMemoryCommandBus,
    query_bus: InMemoryQueryBus,
    names: Arc<InMemoryNameClaimRegistry>,
    events: Arc<InMemoryEventRepository>,
    snapshots: Arc<InMemorySnapshotRepository>,
}

impl AddressBook {
    pub fn build(config: &AddressBookConfig) -> Result<Self, AppError> {
        let names = Arc::new(InMemoryNameClaimRegistry::new());
        let events = Arc::new(InMemoryEventRepository::new());
        let snapshots = Arc::new(InMemorySnapshotRepository::new());
        let projection = Arc::new(InMemoryContactProjection::new());

        let event_bus = Arc::new(SimpleEventBus::new());
        event_bus.subscribe(projection.clone())?;

        let repo = SnapshottingRepo::new(
            EventSourcedRepo::new(events.clone()).with_event_bus(event_bus),
            Arc::new(SnapshotRepositoryWithPolicy::new(
                snapshots.clone(),
                config.snapshot_policy(),
            )),
        );

        let handler: Arc<ContactHandler> = Arc::new(ContactCommandHandler::new(
            repo,
            names.clone(),
            projection.clone(),
        ));

        let command_bus = InMemoryCommandBus::new();
        command_bus.register::<CreateContact, _>(handler.clone())?;
        command_bus.register::<ChangeContactName, _>(handler.clone())?;
        command_bus.register::<RemoveContact, _>(handler)?;

        let queries = Arc::new(ContactQueryHandler::new(
            projection,
            names.clone(),
            events.clone(),
        ));

        let query_bus = InMemoryQueryBus::new();
        query_bus.register::<GetContactDetails, _>(queries.clone())?;
        query_bus.register::<ListContacts, _>(queries.clone())?;
        query_bus.register::<ListClaimedNames, _>(queries.clone())?;
        query_bus.register::<ListStoredEvents, _>(queries)?;

        tracing::info!(
            snapshot_policy = ?config.snapshot_policy(),
            commands = command_bus.len(),
            queries = ?query_bus.registered_queries(),
            "address book assembled"
        );

        Ok(Self {
            command_bus,
            query_bus,
            names,
            events,
            snapshots,
        })
    }

    /// 分发命令，每条命令一个工作单元
    pub async fn execute<C: Command>(&self, ctx: &AppContext, cmd: C) -> Result<(), AppError> {
        self.command_bus.dispatch(ctx, cmd).await
    }

    pub async fn query<Q: Query>(&self, ctx: &AppContext, q: Q) -> Result<Q::Dto, AppError> {
        self.query_bus.dispatch(ctx, q).await
    }

    pub fn names(&self) -> &InMemoryNameClaimRegistry {
        &self.names
    }

    pub fn events(&self) -> &InMemoryEventRepository {
        &self.events
    }

    pub fn snapshots(&self) -> &InMemorySnapshotRepository {
        &self.snapshots
    }
}
