//! 联系人读模型（Projection）
//!
//! 订阅联系人事件并维护 `id → 名称` 的只读视图，供命令处理器读取旧名称、供查询直接读取。
//!
use crate::{dto::Dto, error::AppError};
use addressbook_domain::contact::{Contact, ContactEvent};
use addressbook_domain::eventing::{EventHandler, HandledEventType};
use addressbook_domain::persist::SerializedEvent;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;

/// 联系人详情
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactEntry {
    pub id: String,
    pub name: String,
}

impl Dto for ContactEntry {}

/// 联系人读模型
pub trait ContactReadModel: Send + Sync {
    /// 读取单个联系人，不存在或已删除时返回 `None`
    fn load_contact_details(&self, id: &str) -> Result<Option<ContactEntry>, AppError>;

    /// 全部在册联系人（按 id 排序）
    fn all_contacts(&self) -> Result<Vec<ContactEntry>, AppError>;
}

/// 内存读模型，同时作为事件处理器挂到事件总线上
#[derive(Debug, Default)]
pub struct InMemoryContactProjection {
    entries: DashMap<String, String>,
}

impl InMemoryContactProjection {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(&self, contact_id: &str, event: ContactEvent) {
        match event {
            ContactEvent::Created { name, .. } | ContactEvent::NameChanged { name, .. } => {
                self.entries.insert(contact_id.to_owned(), name);
            }
            ContactEvent::Removed { .. } => {
                self.entries.remove(contact_id);
            }
        }
    }
}

impl ContactReadModel for InMemoryContactProjection {
    fn load_contact_details(&self, id: &str) -> Result<Option<ContactEntry>, AppError> {
        Ok(self.entries.get(id).map(|name| ContactEntry {
            id: id.to_owned(),
            name: name.value().clone(),
        }))
    }

    fn all_contacts(&self) -> Result<Vec<ContactEntry>, AppError> {
        let mut contacts: Vec<_> = self
            .entries
            .iter()
            .map(|e| ContactEntry {
                id: e.key().clone(),
                name: e.value().clone(),
            })
            .collect();
        contacts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(contacts)
    }
}

#[async_trait]
impl EventHandler for InMemoryContactProjection {
    fn handler_name(&self) -> &str {
        "contact-projection"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::Many(vec![
            ContactEvent::CREATED.to_string(),
            ContactEvent::NAME_CHANGED.to_string(),
            ContactEvent::REMOVED.to_string(),
        ])
    }

    async fn handle(&self, event: &SerializedEvent) -> anyhow::Result<()> {
        let payload = event.decode::<Contact>()?;
        tracing::debug!(
            contact_id = event.aggregate_id(),
            event_type = event.event_type(),
            "projecting contact event"
        );
        self.apply(event.aggregate_id(), payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use addressbook_domain::aggregate::Aggregate;
    use addressbook_domain::contact::ContactCommand;
    use addressbook_domain::domain_event::{EventContext, EventEnvelope};
    use addressbook_domain::entity::Entity;

    fn serialized(contact: &mut Contact, command: ContactCommand) -> Vec<SerializedEvent> {
        let events = contact.execute(command).unwrap();
        events
            .into_iter()
            .map(|e| {
                contact.apply(&e);
                let envelope =
                    EventEnvelope::<Contact>::new(contact.id(), e, EventContext::default());
                SerializedEvent::try_from(&envelope).unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn projection_follows_contact_lifecycle() {
        let projection = InMemoryContactProjection::new();
        let mut contact = Contact::new("1".into(), 0);

        let mut events = serialized(&mut contact, ContactCommand::Create { name: "Bob".into() });
        events.extend(serialized(
            &mut contact,
            ContactCommand::ChangeName {
                name: "Bobby".into(),
            },
        ));
        for event in &events {
            projection.handle(event).await.unwrap();
        }

        assert_eq!(
            projection.load_contact_details("1").unwrap(),
            Some(ContactEntry {
                id: "1".into(),
                name: "Bobby".into(),
            })
        );

        for event in serialized(&mut contact, ContactCommand::Remove) {
            projection.handle(&event).await.unwrap();
        }
        assert_eq!(projection.load_contact_details("1").unwrap(), None);
        assert!(projection.all_contacts().unwrap().is_empty());
    }

    #[test]
    fn all_contacts_is_sorted_by_id() {
        let projection = InMemoryContactProjection::new();
        projection.entries.insert("b".into(), "Beth".into());
        projection.entries.insert("a".into(), "Anna".into());

        let ids: Vec<_> = projection
            .all_contacts()
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
