//! 领域层统一错误定义
//!
//! 聚焦序列化、事件分发、仓储、命令与状态校验，以及名称唯一性冲突，
//! 便于在各实现层统一转换为 `DomainError`。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch { expected: String, found: String },

    // --- 事件分发 ---
    #[error("event bus error: {reason}")]
    EventBus { reason: String },

    // --- 仓储/持久化 ---
    #[error("event repository error: {reason}")]
    EventRepository { reason: String },
    #[error("snapshot repository error: {reason}")]
    SnapshotRepository { reason: String },
    #[error("version conflict: expected={expected}, actual={actual}")]
    VersionConflict { expected: usize, actual: usize },

    // --- 领域规则/状态 ---
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    // --- 唯一性 ---
    #[error("contact name already taken: {name}")]
    NameAlreadyTaken { name: String },
}

impl DomainError {
    pub fn name_already_taken(name: impl Into<String>) -> Self {
        DomainError::NameAlreadyTaken { name: name.into() }
    }

    pub fn event_repository(reason: impl Into<String>) -> Self {
        DomainError::EventRepository {
            reason: reason.into(),
        }
    }

    pub fn snapshot_repository(reason: impl Into<String>) -> Self {
        DomainError::SnapshotRepository {
            reason: reason.into(),
        }
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        DomainError::InvalidState {
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;
