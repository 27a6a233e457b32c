//! 工作单元（Unit of Work）
//!
//! 一条命令的全部效果在同一个工作单元内提交或回滚。处理器可登记两类钩子：
//! - `after_commit`：提交后执行；
//! - `on_rollback`：回滚后执行。
//!
//! 每个钩子至多执行一次，且仅在结果确定之后、在完成工作单元的任务内执行。
//! `DefaultUnitOfWork::commit` / `rollback` 以值接收 `self`，因此同一工作单元只能到达一种结果。
//!
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// 结果确定后执行的钩子
pub type UnitOfWorkHook = Box<dyn FnOnce() + Send + 'static>;

/// 事务上下文：供命令处理器登记提交/回滚钩子
pub trait UnitOfWork: Send + Sync {
    /// 登记回滚钩子
    fn on_rollback(&self, hook: UnitOfWorkHook);

    /// 登记提交后钩子
    fn after_commit(&self, hook: UnitOfWorkHook);
}

/// 工作单元的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Committed,
    RolledBack,
}

#[derive(Default)]
struct Hooks {
    after_commit: Vec<UnitOfWorkHook>,
    on_rollback: Vec<UnitOfWorkHook>,
}

/// 默认工作单元实现，由命令总线为每条命令创建
#[derive(Default)]
pub struct DefaultUnitOfWork {
    hooks: Mutex<Hooks>,
}

impl fmt::Debug for DefaultUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = self.hooks.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("DefaultUnitOfWork")
            .field("after_commit", &hooks.after_commit.len())
            .field("on_rollback", &hooks.on_rollback.len())
            .finish()
    }
}

impl DefaultUnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// 提交：按登记顺序执行提交钩子，丢弃回滚钩子
    pub fn commit(self) -> Outcome {
        let hooks = self.into_hooks();
        tracing::debug!(hooks = hooks.after_commit.len(), "unit of work committed");
        for hook in hooks.after_commit {
            hook();
        }
        Outcome::Committed
    }

    /// 回滚：按登记的逆序执行回滚钩子，丢弃提交钩子
    pub fn rollback(self) -> Outcome {
        let hooks = self.into_hooks();
        tracing::debug!(hooks = hooks.on_rollback.len(), "unit of work rolled back");
        for hook in hooks.on_rollback.into_iter().rev() {
            hook();
        }
        Outcome::RolledBack
    }

    fn into_hooks(self) -> Hooks {
        self.hooks.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UnitOfWork for DefaultUnitOfWork {
    fn on_rollback(&self, hook: UnitOfWorkHook) {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_rollback
            .push(hook);
    }

    fn after_commit(&self, hook: UnitOfWorkHook) {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .after_commit
            .push(hook);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> UnitOfWorkHook) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let make = {
            let log = log.clone();
            move |label: &'static str| -> UnitOfWorkHook {
                let log = log.clone();
                Box::new(move || log.lock().unwrap().push(label))
            }
        };
        (log, make)
    }

    #[test]
    fn commit_runs_only_commit_hooks_in_order() {
        let (log, hook) = recorder();
        let uow = DefaultUnitOfWork::new();
        uow.after_commit(hook("commit-1"));
        uow.on_rollback(hook("rollback-1"));
        uow.after_commit(hook("commit-2"));

        assert_eq!(uow.commit(), Outcome::Committed);
        assert_eq!(*log.lock().unwrap(), vec!["commit-1", "commit-2"]);
    }

    #[test]
    fn rollback_runs_only_rollback_hooks_in_reverse() {
        let (log, hook) = recorder();
        let uow = DefaultUnitOfWork::new();
        uow.on_rollback(hook("rollback-1"));
        uow.after_commit(hook("commit-1"));
        uow.on_rollback(hook("rollback-2"));

        assert_eq!(uow.rollback(), Outcome::RolledBack);
        assert_eq!(*log.lock().unwrap(), vec!["rollback-2", "rollback-1"]);
    }

    #[test]
    fn empty_unit_of_work_completes() {
        assert_eq!(DefaultUnitOfWork::new().commit(), Outcome::Committed);
        assert_eq!(DefaultUnitOfWork::new().rollback(), Outcome::RolledBack);
    }

    #[test]
    fn hooks_can_be_registered_through_trait_object() {
        let (log, hook) = recorder();
        let uow = DefaultUnitOfWork::new();
        {
            let dyn_uow: &dyn UnitOfWork = &uow;
            dyn_uow.after_commit(hook("via-dyn"));
        }
        assert!(format!("{uow:?}").contains("after_commit: 1"));
        uow.commit();
        assert_eq!(*log.lock().unwrap(), vec!["via-dyn"]);
    }
}
