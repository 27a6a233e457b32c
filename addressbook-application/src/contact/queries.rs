use crate::{
    context::AppContext, dto::Dto, error::AppError, projection::ContactEntry,
    projection::ContactReadModel, query::Query, query_handler::QueryHandler,
};
use addressbook_domain::name_claim::{ClaimedName, NameClaimRegistry};
use addressbook_domain::persist::{InMemoryEventRepository, SerializedEvent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

impl Dto for ClaimedName {}

/// 按 id 查询联系人详情
#[derive(Debug, Clone)]
pub struct GetContactDetails {
    pub contact_id: String,
}

impl Query for GetContactDetails {
    const NAME: &'static str = "GetContactDetails";
    type Dto = Option<ContactEntry>;
}

/// 列出全部在册联系人
#[derive(Debug, Clone, Default)]
pub struct ListContacts;

impl Query for ListContacts {
    const NAME: &'static str = "ListContacts";
    type Dto = Vec<ContactEntry>;
}

/// 列出当前被占用的名称
#[derive(Debug, Clone, Default)]
pub struct ListClaimedNames;

impl Query for ListClaimedNames {
    const NAME: &'static str = "ListClaimedNames";
    type Dto = Vec<ClaimedName>;
}

/// 按位点顺序列出事件存储中的全部事件
#[derive(Debug, Clone, Default)]
pub struct ListStoredEvents;

impl Query for ListStoredEvents {
    const NAME: &'static str = "ListStoredEvents";
    type Dto = Vec<StoredEventDto>;
}

/// 事件存储中的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredEventDto {
    pub sequence_number: Option<i64>,
    pub event_id: String,
    pub event_type: String,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub aggregate_version: usize,
    pub occurred_at: DateTime<Utc>,
    pub payload: Value,
}

impl Dto for StoredEventDto {}

impl From<SerializedEvent> for StoredEventDto {
    fn from(event: SerializedEvent) -> Self {
        Self {
            sequence_number: event.sequence_number(),
            event_id: event.event_id().to_owned(),
            event_type: event.event_type().to_owned(),
            aggregate_type: event.aggregate_type().to_owned(),
            aggregate_id: event.aggregate_id().to_owned(),
            aggregate_version: event.aggregate_version(),
            occurred_at: event.occurred_at(),
            payload: event.payload().clone(),
        }
    }
}

/// 联系人相关查询的处理器，直连读模型、名称登记表与事件存储
pub struct ContactQueryHandler<M, N> {
    read_model: Arc<M>,
    names: Arc<N>,
    events: Arc<InMemoryEventRepository>,
}

impl<M, N> ContactQueryHandler<M, N>
where
    M: ContactReadModel,
    N: NameClaimRegistry,
{
    pub fn new(read_model: Arc<M>, names: Arc<N>, events: Arc<InMemoryEventRepository>) -> Self {
        Self {
            read_model,
            names,
            events,
        }
    }
}

#[async_trait]
impl<M, N> QueryHandler<GetContactDetails> for ContactQueryHandler<M, N>
where
    M: ContactReadModel + 'static,
    N: NameClaimRegistry + 'static,
{
    async fn handle(
        &self,
        _ctx: &AppContext,
        q: GetContactDetails,
    ) -> Result<Option<ContactEntry>, AppError> {
        self.read_model.load_contact_details(&q.contact_id)
    }
}

#[async_trait]
impl<M, N> QueryHandler<ListContacts> for ContactQueryHandler<M, N>
where
    M: ContactReadModel + 'static,
    N: NameClaimRegistry + 'static,
{
    async fn handle(&self, _ctx: &AppContext, _q: ListContacts) -> Result<Vec<ContactEntry>, AppError> {
        self.read_model.all_contacts()
    }
}

#[async_trait]
impl<M, N> QueryHandler<ListClaimedNames> for ContactQueryHandler<M, N>
where
    M: ContactReadModel + 'static,
    N: NameClaimRegistry + 'static,
{
    async fn handle(
        &self,
        _ctx: &AppContext,
        _q: ListClaimedNames,
    ) -> Result<Vec<ClaimedName>, AppError> {
        Ok(self.names.claimed_names())
    }
}

#[async_trait]
impl<M, N> QueryHandler<ListStoredEvents> for ContactQueryHandler<M, N>
where
    M: ContactReadModel + 'static,
    N: NameClaimRegistry + 'static,
{
    async fn handle(
        &self,
        _ctx: &AppContext,
        _q: ListStoredEvents,
    ) -> Result<Vec<StoredEventDto>, AppError> {
        let events = self.events.all_events()?;
        Ok(events.into_iter().map(StoredEventDto::from).collect())
    }
}
