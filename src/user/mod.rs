//! 用户管理模块
//!
//! 提供用户注册、登录、当前用户查询等功能。
//! 账户以规范化后的邮箱作为登录身份，邮箱全局唯一。

pub mod password;
pub mod user_manager;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 账户实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// 账户ID (UUID)，创建后不可变
    pub id: String,

    /// 显示名称
    pub name: String,

    /// 邮箱 (规范化后，唯一)
    pub email: String,

    /// 密码哈希 (bcrypt)，不参与序列化
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// 创建时间 (Unix timestamp)
    pub created_at: i64,
}

impl Account {
    /// 由待插入记录生成账户 (分配ID和创建时间)
    pub fn from_new(new_account: NewAccount) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: new_account.name,
            email: new_account.email,
            password_hash: new_account.password_hash,
            created_at: Utc::now().timestamp(),
        }
    }

    /// 对外展示的账户信息
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// 待插入的账户记录
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// 账户公开信息 (不含密码哈希)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: i64,
}

/// 用户注册请求
///
/// 字段均为可选，缺失字段由校验逻辑统一报告。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl RegisterRequest {
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }
}

/// 用户登录请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }
}

/// 登录成功结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSession {
    pub token: String,
    pub user: AccountProfile,
}

/// 邮箱规范化: 去除首尾空白并转小写
pub fn canonical_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 取出非空文本字段 (`trim` 控制是否去除首尾空白)
pub(crate) fn required_field(value: Option<&str>, trim: bool) -> Option<String> {
    let value = value?;
    let value = if trim { value.trim() } else { value };
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub use password::PasswordHasher;
pub use user_manager::UserManager;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_email() {
        assert_eq!(canonical_email("  Sam@X.com "), "sam@x.com");
        assert_eq!(canonical_email("sam@x.com"), "sam@x.com");
    }

    #[test]
    fn test_required_field() {
        assert_eq!(required_field(Some(" Sam "), true), Some("Sam".to_string()));
        assert_eq!(required_field(Some("   "), true), None);
        assert_eq!(required_field(Some(""), false), None);
        assert_eq!(required_field(Some(" pw "), false), Some(" pw ".to_string()));
        assert_eq!(required_field(None, true), None);
    }

    #[test]
    fn test_serialized_account_hides_hash() {
        let account = Account::from_new(NewAccount {
            name: "Sam".to_string(),
            email: "sam@x.com".to_string(),
            password_hash: "$2b$10$secret".to_string(),
        });

        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("$2b$10$secret"));
        assert!(json.contains("sam@x.com"));
    }

    #[test]
    fn test_register_request_missing_fields_deserialize() {
        let req: RegisterRequest = serde_json::from_str(r#"{"name":"Sam"}"#).unwrap();
        assert_eq!(req.name.as_deref(), Some("Sam"));
        assert!(req.email.is_none());
        assert!(req.password.is_none());
    }
}
