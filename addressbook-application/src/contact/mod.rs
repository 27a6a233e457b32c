//! 联系人用例：命令、命令处理器与查询
//!
mod commands;
mod handler;
mod queries;

pub use commands::{ChangeContactName, CreateContact, RemoveContact};
pub use handler::ContactCommandHandler;
pub use queries::{
    ContactQueryHandler, GetContactDetails, ListClaimedNames, ListContacts, ListStoredEvents,
    StoredEventDto,
};
