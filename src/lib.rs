//! # SALESDESK-RS
//!
//! 小微企业销售助手后端 - 账户与认证服务
//!
//! ## 核心能力
//!
//! - **用户注册**: 参数校验 / 邮箱唯一性检查 / bcrypt 加密 / 持久化
//! - **用户登录**: 邮箱 + 密码换取会话 JWT
//! - **当前用户**: 通过会话 token 查询账户公开信息
//! - **对外服务**: HTTP API (基于 Actix-web)
//!
//! ## 架构设计
//!
//! ```text
//! 客户端 (HTTP)
//!     ↓
//! Service Layer (service/)
//!     ↓
//! User Manager (user/)  ← bcrypt 在阻塞线程池中执行
//!     ↓
//! Identity Store (storage/) ← SQLite / 内存
//! ```

// ============================================================================
// 外部依赖
// ============================================================================

// Web 框架
pub use actix_web;

// 序列化
pub use serde;
pub use serde_json;

// 日志
pub use log;

// ============================================================================
// 内部模块
// ============================================================================

/// 用户管理系统
pub mod user;

/// 身份存储 (SQLite / 内存)
pub mod storage;

/// 对外服务层 (HTTP)
pub mod service;

/// 工具模块 (配置 / JWT)
pub mod utils;

// ============================================================================
// 全局错误类型
// ============================================================================

/// 服务错误类型
///
/// `Display` 文本可能包含数据库驱动的细节，只写入服务端日志；
/// 返回给调用方的是 HTTP 层映射出的固定文案 (见 `service::http::models::ApiFailure`)。
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, DeskError>;

impl From<storage::StoreError> for DeskError {
    fn from(err: storage::StoreError) -> Self {
        match err {
            storage::StoreError::UniqueViolation(field) => {
                DeskError::Conflict(format!("unique constraint on {}", field))
            }
            storage::StoreError::Unavailable(detail) => DeskError::StoreUnavailable(detail),
            storage::StoreError::Query(detail) => DeskError::Store(detail),
        }
    }
}
