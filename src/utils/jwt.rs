//! JWT 会话 Token 管理
//!
//! 提供会话 token 的签发和验证功能。密钥来自启动配置 (`auth.session_secret`)。

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token 默认有效期 (秒) - 24 小时
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 86400;

/// JWT Claims (载荷)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// 账户ID
    pub sub: String,

    /// 登录邮箱
    pub email: String,

    /// 签发时间 (Unix timestamp)
    pub iat: u64,

    /// 过期时间 (Unix timestamp)
    pub exp: u64,
}

impl Claims {
    pub fn new(account_id: String, email: String, ttl_secs: u64) -> Self {
        let now = now_secs();
        Self {
            sub: account_id,
            email,
            iat: now,
            exp: now.saturating_add(ttl_secs),
        }
    }

    /// 检查 token 是否过期
    pub fn is_expired(&self) -> bool {
        self.exp < now_secs()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// 会话签名密钥
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    /// 签发 token
    pub fn issue(
        &self,
        account_id: &str,
        email: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims::new(account_id.to_string(), email.to_string(), self.ttl_secs);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// 验证 token 并返回 Claims
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}
