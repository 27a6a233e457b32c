//! 联系人命令处理器
//!
//! 名称唯一性靠“先占用、后补偿”实现：
//! - 新名称在修改聚合之前占用，占用失败直接返回 `NameAlreadyTaken`，不触碰聚合；
//! - 占用成功后立即登记回滚钩子，之后任何失败都会释放新名称；
//! - 旧名称只在提交之后释放，保证事务失败时旧名称仍被占用。
//!
use super::commands::{ChangeContactName, CreateContact, RemoveContact};
use crate::{
    command_handler::CommandHandler, context::AppContext, error::AppError,
    projection::ContactReadModel, unit_of_work::UnitOfWork, unit_of_work::UnitOfWorkHook,
};
use addressbook_domain::aggregate_root::AggregateRoot;
use addressbook_domain::contact::{Contact, ContactCommand};
use addressbook_domain::entity::Entity;
use addressbook_domain::error::DomainError;
use addressbook_domain::name_claim::NameClaimRegistry;
use addressbook_domain::persist::AggregateRepository;
use async_trait::async_trait;
use std::sync::Arc;

pub struct ContactCommandHandler<R, N, M>
where
    R: AggregateRepository<Contact>,
{
    root: AggregateRoot<Contact, R>,
    names: Arc<N>,
    read_model: Arc<M>,
}

impl<R, N, M> ContactCommandHandler<R, N, M>
where
    R: AggregateRepository<Contact>,
    N: NameClaimRegistry + 'static,
    M: ContactReadModel,
{
    pub fn new(repo: R, names: Arc<N>, read_model: Arc<M>) -> Self {
        Self {
            root: AggregateRoot::new(repo),
            names,
            read_model,
        }
    }

    fn claim(&self, name: &str) -> Result<(), AppError> {
        if self.names.claim(name) {
            Ok(())
        } else {
            tracing::info!(name, "contact name already taken");
            Err(DomainError::name_already_taken(name).into())
        }
    }

    /// 结果确定后释放名称的钩子
    fn release(&self, name: String) -> UnitOfWorkHook {
        let names = Arc::clone(&self.names);
        Box::new(move || {
            tracing::debug!(name = %name, "releasing contact name");
            names.cancel(&name);
        })
    }

    async fn load(&self, contact_id: &str) -> Result<Contact, AppError> {
        self.root
            .load(&contact_id.to_owned())
            .await?
            .ok_or_else(|| AppError::AggregateNotFound(contact_id.to_owned()))
    }

    /// 当前名称以读模型为准；读模型缺失该联系人时退回聚合状态
    fn current_name(&self, contact: &Contact) -> Result<String, AppError> {
        let id: &str = contact.id();
        match self.read_model.load_contact_details(id)? {
            Some(entry) => Ok(entry.name),
            None => {
                tracing::warn!(
                    contact_id = id,
                    "contact missing from read model, using aggregate state"
                );
                Ok(contact.name().to_owned())
            }
        }
    }
}

#[async_trait]
impl<R, N, M> CommandHandler<CreateContact> for ContactCommandHandler<R, N, M>
where
    R: AggregateRepository<Contact> + 'static,
    N: NameClaimRegistry + 'static,
    M: ContactReadModel + 'static,
{
    async fn handle(
        &self,
        ctx: &AppContext,
        uow: &dyn UnitOfWork,
        cmd: CreateContact,
    ) -> Result<(), AppError> {
        let CreateContact { contact_id, name } = cmd;

        self.claim(&name)?;
        uow.on_rollback(self.release(name.clone()));

        let (contact, _) = self
            .root
            .create(&contact_id, ContactCommand::Create { name }, ctx.biz.clone())
            .await?;

        tracing::info!(
            contact_id = %contact_id,
            name = contact.name(),
            version = contact.version(),
            "contact created"
        );
        Ok(())
    }
}

#[async_trait]
impl<R, N, M> CommandHandler<ChangeContactName> for ContactCommandHandler<R, N, M>
where
    R: AggregateRepository<Contact> + 'static,
    N: NameClaimRegistry + 'static,
    M: ContactReadModel + 'static,
{
    async fn handle(
        &self,
        ctx: &AppContext,
        uow: &dyn UnitOfWork,
        cmd: ChangeContactName,
    ) -> Result<(), AppError> {
        let ChangeContactName {
            contact_id,
            new_name,
        } = cmd;

        self.claim(&new_name)?;
        uow.on_rollback(self.release(new_name.clone()));

        let contact = self.load(&contact_id).await?;
        let old_name = self.current_name(&contact)?;

        self.root
            .execute(
                contact,
                ContactCommand::ChangeName {
                    name: new_name.clone(),
                },
                ctx.biz.clone(),
            )
            .await?;

        tracing::info!(
            contact_id = %contact_id,
            old_name = %old_name,
            new_name = %new_name,
            "contact renamed"
        );
        uow.after_commit(self.release(old_name));
        Ok(())
    }
}

#[async_trait]
impl<R, N, M> CommandHandler<RemoveContact> for ContactCommandHandler<R, N, M>
where
    R: AggregateRepository<Contact> + 'static,
    N: NameClaimRegistry + 'static,
    M: ContactReadModel + 'static,
{
    async fn handle(
        &self,
        ctx: &AppContext,
        uow: &dyn UnitOfWork,
        cmd: RemoveContact,
    ) -> Result<(), AppError> {
        let contact = self.load(&cmd.contact_id).await?;
        let name = self.current_name(&contact)?;

        self.root
            .execute(contact, ContactCommand::Remove, ctx.biz.clone())
            .await?;

        tracing::info!(contact_id = %cmd.contact_id, name = %name, "contact removed");
        uow.after_commit(self.release(name));
        Ok(())
    }
}
