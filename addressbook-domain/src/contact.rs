//! 联系人聚合（Contact）
//!
//! 通讯录中唯一的聚合类型，以纯数据 + 显式命令/事件的方式建模：
//! - `Create` 在全新的聚合上产生 `Created` 事件；
//! - `ChangeName` / `Remove` 仅作用于已创建且未删除的联系人。
//!
//! 名称的全局唯一性不在聚合内部保证，而是由 `name_claim` 登记表配合命令处理器完成。
//!
use crate::aggregate::Aggregate;
use crate::domain_event::DomainEvent;
use crate::entity::Entity;
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    id: String,
    version: usize,
    name: String,
    removed: bool,
}

impl Contact {
    /// 当前显示名称（未创建时为空字符串）
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_created(&self) -> bool {
        self.version > 0
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    fn ensure_live(&self) -> Result<(), DomainError> {
        if !self.is_created() {
            return Err(DomainError::invalid_state(format!(
                "contact {} has not been created",
                self.id
            )));
        }
        if self.removed {
            return Err(DomainError::invalid_state(format!(
                "contact {} has been removed",
                self.id
            )));
        }
        Ok(())
    }
}

impl Entity for Contact {
    type Id = String;

    fn new(aggregate_id: Self::Id, version: usize) -> Self {
        Self {
            id: aggregate_id,
            version,
            ..Default::default()
        }
    }

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> usize {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactCommand {
    Create { name: String },
    ChangeName { name: String },
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContactEvent {
    Created {
        id: String,
        aggregate_version: usize,
        name: String,
    },
    NameChanged {
        id: String,
        aggregate_version: usize,
        name: String,
    },
    Removed {
        id: String,
        aggregate_version: usize,
    },
}

impl ContactEvent {
    pub const CREATED: &'static str = "ContactEvent.Created";
    pub const NAME_CHANGED: &'static str = "ContactEvent.NameChanged";
    pub const REMOVED: &'static str = "ContactEvent.Removed";
}

impl DomainEvent for ContactEvent {
    fn event_id(&self) -> &str {
        match self {
            Self::Created { id, .. } | Self::NameChanged { id, .. } | Self::Removed { id, .. } => {
                id.as_str()
            }
        }
    }

    fn event_type(&self) -> &str {
        match self {
            Self::Created { .. } => Self::CREATED,
            Self::NameChanged { .. } => Self::NAME_CHANGED,
            Self::Removed { .. } => Self::REMOVED,
        }
    }

    fn aggregate_version(&self) -> usize {
        match self {
            Self::Created {
                aggregate_version, ..
            }
            | Self::NameChanged {
                aggregate_version, ..
            }
            | Self::Removed {
                aggregate_version, ..
            } => *aggregate_version,
        }
    }
}

impl Aggregate for Contact {
    const TYPE: &'static str = "contact";

    type Command = ContactCommand;
    type Event = ContactEvent;
    type Error = DomainError;

    fn execute(&self, command: Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ContactCommand::Create { name } => {
                if self.is_created() {
                    return Err(DomainError::invalid_state(format!(
                        "contact {} already exists",
                        self.id
                    )));
                }
                Ok(vec![ContactEvent::Created {
                    id: Ulid::new().to_string(),
                    aggregate_version: self.version + 1,
                    name,
                }])
            }
            ContactCommand::ChangeName { name } => {
                self.ensure_live()?;
                Ok(vec![ContactEvent::NameChanged {
                    id: Ulid::new().to_string(),
                    aggregate_version: self.version + 1,
                    name,
                }])
            }
            ContactCommand::Remove => {
                self.ensure_live()?;
                Ok(vec![ContactEvent::Removed {
                    id: Ulid::new().to_string(),
                    aggregate_version: self.version + 1,
                }])
            }
        }
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ContactEvent::Created {
                aggregate_version,
                name,
                ..
            }
            | ContactEvent::NameChanged {
                aggregate_version,
                name,
                ..
            } => {
                self.name = name.clone();
                self.version = *aggregate_version;
            }
            ContactEvent::Removed {
                aggregate_version, ..
            } => {
                self.removed = true;
                self.version = *aggregate_version;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(contact: &mut Contact, command: ContactCommand) -> Vec<ContactEvent> {
        let events = contact.execute(command).unwrap();
        for e in &events {
            contact.apply(e);
        }
        events
    }

    #[test]
    fn create_rename_remove_lifecycle() {
        let mut contact = Contact::new("c-1".to_string(), 0);
        assert!(!contact.is_created());

        let events = run(
            &mut contact,
            ContactCommand::Create {
                name: "Bob".into(),
            },
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), ContactEvent::CREATED);
        assert_eq!(events[0].aggregate_version(), 1);
        assert_eq!(contact.name(), "Bob");
        assert_eq!(contact.version(), 1);

        run(
            &mut contact,
            ContactCommand::ChangeName {
                name: "Bobby".into(),
            },
        );
        assert_eq!(contact.name(), "Bobby");
        assert_eq!(contact.version(), 2);

        let events = run(&mut contact, ContactCommand::Remove);
        assert_eq!(events[0].event_type(), ContactEvent::REMOVED);
        assert!(contact.is_removed());
        assert_eq!(contact.version(), 3);
    }

    #[test]
    fn create_twice_is_rejected() {
        let mut contact = Contact::new("c-2".to_string(), 0);
        run(
            &mut contact,
            ContactCommand::Create {
                name: "Alice".into(),
            },
        );

        let err = contact
            .execute(ContactCommand::Create {
                name: "Alice".into(),
            })
            .unwrap_err();
        match err {
            DomainError::InvalidState { .. } => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rename_or_remove_requires_live_contact() {
        let fresh = Contact::new("c-3".to_string(), 0);
        assert!(matches!(
            fresh.execute(ContactCommand::ChangeName { name: "X".into() }),
            Err(DomainError::InvalidState { .. })
        ));
        assert!(matches!(
            fresh.execute(ContactCommand::Remove),
            Err(DomainError::InvalidState { .. })
        ));

        let mut removed = Contact::new("c-4".to_string(), 0);
        run(&mut removed, ContactCommand::Create { name: "Y".into() });
        run(&mut removed, ContactCommand::Remove);
        assert!(matches!(
            removed.execute(ContactCommand::ChangeName { name: "Z".into() }),
            Err(DomainError::InvalidState { .. })
        ));
    }

    #[test]
    fn event_payload_keeps_variant_shape() {
        let event = ContactEvent::NameChanged {
            id: "e-1".into(),
            aggregate_version: 2,
            name: "Carol".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["NameChanged"]["name"], "Carol");
        assert_eq!(json["NameChanged"]["aggregate_version"], 2);
    }
}
