//! SQLite 身份存储
//!
//! 表结构：
//! - `users`: id, name, email (UNIQUE COLLATE NOCASE), password_hash, created_at
//!
//! 连接在第一次访问时建立，打开失败返回 [`StoreError::Unavailable`]，
//! 下一次请求会重新尝试连接。所有查询都在阻塞线程池执行，
//! 连接锁只在单条语句期间持有。

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::sync::Arc;

use super::{IdentityStore, StoreError, StoreResult};
use crate::user::{Account, NewAccount};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        password_hash TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );";

/// SQLite 账户存储
pub struct SqliteIdentityStore {
    path: String,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteIdentityStore {
    /// 创建存储 (不立即连接)
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// 在阻塞线程池中使用连接执行 `f`
    async fn run<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            if guard.is_none() {
                *guard = Some(open_connection(&path)?);
            }

            let result = match guard.as_ref() {
                Some(connection) => f(connection),
                None => Err(StoreError::Unavailable("connection not initialized".to_string())),
            };

            // 连接层面的故障丢弃连接，下次重连
            if matches!(result, Err(StoreError::Unavailable(_))) {
                *guard = None;
            }
            result
        })
        .await
        .map_err(|e| StoreError::Query(format!("blocking task failed: {}", e)))?
    }
}

fn open_connection(path: &str) -> StoreResult<Connection> {
    let conn = Connection::open(path).map_err(classify)?;

    // 内存库会返回 "memory"
    let journal_mode: String = conn
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
        .map_err(classify)?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(classify)?;
    conn.execute_batch(SCHEMA).map_err(classify)?;

    log::info!("Identity store connected: {} (journal_mode={})", path, journal_mode);
    Ok(conn)
}

/// 把驱动错误归类为存储错误类型
fn classify(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::ConstraintViolation
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                StoreError::UniqueViolation("email".to_string())
            }
            ErrorCode::CannotOpen
            | ErrorCode::PermissionDenied
            | ErrorCode::NotADatabase
            | ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::SystemIoFailure
            | ErrorCode::ReadOnly
            | ErrorCode::DiskFull => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Query(err.to_string()),
        },
        _ => StoreError::Query(err.to_string()),
    }
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let email = email.to_string();
        self.run(move |conn| {
            conn.query_row(
                "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ?1",
                params![email],
                row_to_account,
            )
            .optional()
            .map_err(classify)
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Account>> {
        let id = id.to_string();
        self.run(move |conn| {
            conn.query_row(
                "SELECT id, name, email, password_hash, created_at FROM users WHERE id = ?1",
                params![id],
                row_to_account,
            )
            .optional()
            .map_err(classify)
        })
        .await
    }

    async fn insert(&self, new_account: NewAccount) -> StoreResult<Account> {
        let account = Account::from_new(new_account);
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    account.id,
                    account.name,
                    account.email,
                    account.password_hash,
                    account.created_at
                ],
            )
            .map_err(classify)?;
            Ok(account)
        })
        .await
    }

    async fn count_by_email(&self, email: &str) -> StoreResult<u64> {
        let email = email.to_string();
        self.run(move |conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM users WHERE email = ?1",
                    params![email],
                    |row| row.get(0),
                )
                .map_err(classify)?;
            Ok(count.max(0) as u64)
        })
        .await
    }
}
