//! 身份存储模块
//!
//! 账户表的访问层。邮箱唯一性由存储层保证 (SQLite UNIQUE 约束 / DashMap entry)，
//! 上层的"先查后插"只是快速失败路径，不是唯一的防线。
//!
//! 后端选择由 `database.url` 决定：
//! - `sqlite://<path>` 或直接给出文件路径 → [`SqliteIdentityStore`]
//! - `sqlite::memory:` → SQLite 内存库
//! - `memory://` → [`MemoryIdentityStore`]

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::user::{Account, NewAccount};

pub use memory::MemoryIdentityStore;
pub use sqlite::SqliteIdentityStore;

/// 存储层错误 (按类型区分，调用方不解析错误文本)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// 数据库不可达或配置错误 (无法打开/无权限/被锁)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// 违反唯一约束，参数为字段名
    #[error("unique constraint violated on {0}")]
    UniqueViolation(String),

    /// 其它查询错误
    #[error("query failed: {0}")]
    Query(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// 账户存储接口
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// 按规范化邮箱查询账户
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// 按账户ID查询
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Account>>;

    /// 插入新账户，邮箱冲突时返回 [`StoreError::UniqueViolation`]
    async fn insert(&self, account: NewAccount) -> StoreResult<Account>;

    /// 指定邮箱的账户数 (唯一性约束下只能是 0 或 1)
    async fn count_by_email(&self, email: &str) -> StoreResult<u64>;
}

/// 根据数据库 URL 构建存储实例
///
/// SQLite 连接是惰性建立的，这里不会因为数据库不可达而失败。
pub fn open_store(database_url: &str) -> StoreResult<Arc<dyn IdentityStore>> {
    let url = database_url.trim();
    if url.is_empty() {
        return Err(StoreError::Unavailable("database url is empty".to_string()));
    }

    if url == "memory://" {
        log::info!("Using in-memory identity store");
        return Ok(Arc::new(MemoryIdentityStore::new()));
    }

    let path = if url == "sqlite::memory:" {
        ":memory:"
    } else {
        url.strip_prefix("sqlite://").unwrap_or(url)
    };
    log::info!("Using SQLite identity store at {}", path);
    Ok(Arc::new(SqliteIdentityStore::new(path)))
}
