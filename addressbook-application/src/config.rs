//! 运行配置
//!
//! 从环境变量读取，缺省值与最初的通讯录一致：每 5 个事件写一次快照。
//!
use addressbook_domain::persist::SnapshotPolicy;
use std::env;

pub const SNAPSHOT_EVERY_ENV: &str = "ADDRESSBOOK_SNAPSHOT_EVERY";
pub const LOG_FILTER_ENV: &str = "ADDRESSBOOK_LOG";

const DEFAULT_SNAPSHOT_EVERY: usize = 5;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBookConfig {
    /// 快照间隔（事件数），0 表示不写快照
    pub snapshot_every: usize,
    /// tracing 过滤表达式
    pub log_filter: String,
}

impl Default for AddressBookConfig {
    fn default() -> Self {
        Self {
            snapshot_every: DEFAULT_SNAPSHOT_EVERY,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AddressBookConfig {
    /// 从进程环境变量加载
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源加载，未设置的键使用缺省值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let snapshot_every = match lookup(SNAPSHOT_EVERY_ENV) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(SNAPSHOT_EVERY_ENV))?,
            None => DEFAULT_SNAPSHOT_EVERY,
        };

        let log_filter = lookup(LOG_FILTER_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            snapshot_every,
            log_filter,
        })
    }

    pub fn snapshot_policy(&self) -> SnapshotPolicy {
        match self.snapshot_every {
            0 => SnapshotPolicy::Never,
            n => SnapshotPolicy::Every(n),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AddressBookConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AddressBookConfig::default());
        assert_eq!(config.snapshot_policy(), SnapshotPolicy::Every(5));
    }

    #[test]
    fn values_are_read_from_lookup() {
        let config = AddressBookConfig::from_lookup(lookup(&[
            (SNAPSHOT_EVERY_ENV, " 0 "),
            (LOG_FILTER_ENV, "debug,addressbook_domain=trace"),
        ]))
        .unwrap();
        assert_eq!(config.snapshot_policy(), SnapshotPolicy::Never);
        assert_eq!(config.log_filter, "debug,addressbook_domain=trace");
    }

    #[test]
    fn invalid_snapshot_interval_is_rejected() {
        let err = AddressBookConfig::from_lookup(lookup(&[(SNAPSHOT_EVERY_ENV, "five")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(SNAPSHOT_EVERY_ENV)));
    }
}
