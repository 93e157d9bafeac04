//! 密码哈希
//!
//! bcrypt 是刻意设计成慢的 CPU 密集运算，哈希与校验都放到阻塞线程池执行，
//! 不占用 actix/tokio 的工作线程。

use crate::{DeskError, Result};

/// bcrypt 允许的最小/最大成本
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// 默认工作因子
pub const DEFAULT_COST: u32 = 10;

/// bcrypt 密码哈希器
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// 创建哈希器，成本超出 bcrypt 范围时返回配置错误
    pub fn new(cost: u32) -> Result<Self> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(DeskError::Config(format!(
                "bcrypt cost must be within {}..={}, got {}",
                MIN_COST, MAX_COST, cost
            )));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// 同步哈希 (阻塞调用线程)
    pub fn hash_blocking(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| DeskError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// 在阻塞线程池中哈希
    pub async fn hash(&self, password: String) -> Result<String> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash_blocking(&password))
            .await
            .map_err(|e| DeskError::Internal(format!("Hashing task failed: {}", e)))?
    }

    /// 在阻塞线程池中校验，哈希格式错误视为不匹配
    pub async fn verify(&self, password: String, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || bcrypt::verify(&password, &hash).unwrap_or(false))
            .await
            .map_err(|e| DeskError::Internal(format!("Verify task failed: {}", e)))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_COST,
        }
    }
}
