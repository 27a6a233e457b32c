//! 联系人名称占用登记（Name Claim Registry）
//!
//! 记录哪些显示名称已被占用，提供原子的“占用/释放”语义：
//! - `claim`：检查并占用，同一名称同一时刻至多一个成功者；
//! - `cancel`：释放占用，对未占用名称调用为空操作（幂等）。
//!
//! 占用在事务结果确定前是“临时”的，由命令处理器在回滚/提交钩子中调用 `cancel` 完成补偿。
//!
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 已占用名称的只读视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedName {
    pub name: String,
    pub claimed_at: DateTime<Utc>,
}

/// 名称占用登记表
pub trait NameClaimRegistry: Send + Sync {
    /// 尝试占用名称；已被占用时返回 `false`
    fn claim(&self, name: &str) -> bool;

    /// 释放名称；未占用时不做任何事
    fn cancel(&self, name: &str);

    /// 名称是否已被占用
    fn is_claimed(&self, name: &str) -> bool;

    /// 当前全部已占用名称（按名称排序）
    fn claimed_names(&self) -> Vec<ClaimedName>;
}

impl<T> NameClaimRegistry for Arc<T>
where
    T: NameClaimRegistry + ?Sized,
{
    fn claim(&self, name: &str) -> bool {
        (**self).claim(name)
    }

    fn cancel(&self, name: &str) {
        (**self).cancel(name)
    }

    fn is_claimed(&self, name: &str) -> bool {
        (**self).is_claimed(name)
    }

    fn claimed_names(&self) -> Vec<ClaimedName> {
        (**self).claimed_names()
    }
}

/// 基于 `DashMap` 的内存实现，`entry` 保证同名占用的原子性
#[derive(Debug, Default)]
pub struct InMemoryNameClaimRegistry {
    claims: DashMap<String, DateTime<Utc>>,
}

impl InMemoryNameClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NameClaimRegistry for InMemoryNameClaimRegistry {
    fn claim(&self, name: &str) -> bool {
        match self.claims.entry(name.to_owned()) {
            Entry::Occupied(_) => {
                tracing::debug!(name, "contact name already claimed");
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(Utc::now());
                tracing::debug!(name, "contact name claimed");
                true
            }
        }
    }

    fn cancel(&self, name: &str) {
        if self.claims.remove(name).is_some() {
            tracing::debug!(name, "contact name released");
        }
    }

    fn is_claimed(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    fn claimed_names(&self) -> Vec<ClaimedName> {
        let mut names: Vec<ClaimedName> = self
            .claims
            .iter()
            .map(|e| ClaimedName {
                name: e.key().clone(),
                claimed_at: *e.value(),
            })
            .collect();
        names.sort_by(|a, b| a.name.cmp(&b.name));
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn claim_twice_then_cancel_then_claim_again() {
        let registry = InMemoryNameClaimRegistry::new();
        assert!(registry.claim("Alice"));
        assert!(!registry.claim("Alice"));

        registry.cancel("Alice");
        assert!(!registry.is_claimed("Alice"));
        assert!(registry.claim("Alice"));
    }

    #[test]
    fn cancel_unclaimed_name_is_noop() {
        let registry = InMemoryNameClaimRegistry::new();
        assert!(registry.claim("Bob"));

        registry.cancel("Nobody");
        registry.cancel("Nobody");

        assert!(registry.is_claimed("Bob"));
        assert_eq!(registry.claimed_names().len(), 1);
    }

    #[test]
    fn names_are_case_sensitive() {
        let registry = InMemoryNameClaimRegistry::new();
        assert!(registry.claim("carol"));
        assert!(registry.claim("Carol"));
        assert!(!registry.claim("carol"));
    }

    #[test]
    fn claimed_names_are_sorted() {
        let registry = InMemoryNameClaimRegistry::new();
        for name in ["Zed", "Amy", "Max"] {
            assert!(registry.claim(name));
        }
        let names: Vec<String> = registry
            .claimed_names()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Amy", "Max", "Zed"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_claims_have_single_winner() {
        let registry = Arc::new(InMemoryNameClaimRegistry::new());
        let winners = Arc::new(AtomicUsize::new(0));

        let mut set = tokio::task::JoinSet::new();
        for _ in 0..64 {
            let registry = registry.clone();
            let winners = winners.clone();
            set.spawn(async move {
                if registry.claim("Contended") {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
        while let Some(res) = set.join_next().await {
            res.unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert!(registry.is_claimed("Contended"));
    }
}
