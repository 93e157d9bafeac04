//! 配置管理模块
//!
//! 启动时从 TOML 文件加载，再由环境变量覆盖数据库连接串和会话密钥。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::user::password::{DEFAULT_COST, MAX_COST, MIN_COST};
use crate::utils::jwt::DEFAULT_TOKEN_TTL_SECS;
use crate::{DeskError, Result};

/// 数据库连接串环境变量
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// 会话密钥环境变量
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config/salesdesk.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_name")]
    pub name: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            environment: default_environment(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl HttpConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `sqlite://<path>` / `sqlite::memory:` / `memory://`
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// 会话 JWT 签名密钥
    #[serde(default)]
    pub session_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
    /// bcrypt 工作因子
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: String::new(),
            token_ttl_secs: default_token_ttl(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

// 默认值函数
fn default_server_name() -> String {
    "SalesDesk".to_string()
}
fn default_environment() -> String {
    "development".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_database_url() -> String {
    "sqlite://salesdesk.db".to_string()
}
fn default_token_ttl() -> u64 {
    DEFAULT_TOKEN_TTL_SECS
}
fn default_bcrypt_cost() -> u32 {
    DEFAULT_COST
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| DeskError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| DeskError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// env_logger 默认过滤器 (`RUST_LOG` 优先)，未配置时为 `info`
    pub fn log_filter(&self) -> &str {
        match self.server.log_level.trim() {
            "" => "info",
            level => level,
        }
    }

    /// 用环境变量覆盖配置
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(DATABASE_URL_ENV).ok(),
            std::env::var(SESSION_SECRET_ENV).ok(),
        );
    }

    pub fn apply_overrides(&mut self, database_url: Option<String>, session_secret: Option<String>) {
        if let Some(url) = database_url.filter(|v| !v.trim().is_empty()) {
            self.database.url = url;
        }
        if let Some(secret) = session_secret.filter(|v| !v.is_empty()) {
            self.auth.session_secret = secret;
        }
    }

    /// 启动前校验
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(DeskError::Config(format!(
                "database url is empty (set [database].url or {})",
                DATABASE_URL_ENV
            )));
        }
        if self.auth.session_secret.is_empty() {
            return Err(DeskError::Config(format!(
                "session secret is empty (set [auth].session_secret or {})",
                SESSION_SECRET_ENV
            )));
        }
        if !(MIN_COST..=MAX_COST).contains(&self.auth.bcrypt_cost) {
            return Err(DeskError::Config(format!(
                "bcrypt_cost must be within {}..={}",
                MIN_COST, MAX_COST
            )));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(DeskError::Config("token_ttl_secs must be positive".to_string()));
        }
        Ok(())
    }
}
