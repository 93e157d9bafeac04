//! 内存身份存储
//!
//! 与用户管理器的索引结构一致：主表 + 邮箱索引。
//! 邮箱索引通过 DashMap entry 占位，唯一性检查与插入是同一个原子操作。

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{IdentityStore, StoreError, StoreResult};
use crate::user::{Account, NewAccount};

/// 内存账户存储
pub struct MemoryIdentityStore {
    /// 账户映射 (id -> Account)
    pub(crate) accounts: DashMap<String, Account>,

    /// 邮箱索引 (email -> id)
    pub(crate) email_index: DashMap<String, String>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            email_index: DashMap::new(),
        }
    }

    /// 账户总数
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for MemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let id = match self.email_index.get(email) {
            Some(id) => id.clone(),
            None => return Ok(None),
        };
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Account>> {
        Ok(self.accounts.get(id).map(|a| a.clone()))
    }

    async fn insert(&self, new_account: NewAccount) -> StoreResult<Account> {
        match self.email_index.entry(new_account.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::UniqueViolation("email".to_string())),
            Entry::Vacant(slot) => {
                let account = Account::from_new(new_account);
                // 先写主表再发布索引，读方通过索引拿到的 id 一定能查到账户
                self.accounts.insert(account.id.clone(), account.clone());
                slot.insert(account.id.clone());
                Ok(account)
            }
        }
    }

    async fn count_by_email(&self, email: &str) -> StoreResult<u64> {
        Ok(u64::from(self.email_index.contains_key(email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            name: "Sam".to_string(),
            email: email.to_string(),
            password_hash: "$2b$04$placeholderplaceholderplacehold".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryIdentityStore::new();
        assert!(store.is_empty());

        let account = store.insert(new_account("sam@x.com")).await.unwrap();
        assert_eq!(store.len(), 1);

        let by_email = store.find_by_email("sam@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, account.id);

        let by_id = store.find_by_id(&account.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "sam@x.com");

        assert!(store.find_by_email("other@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryIdentityStore::new();
        store.insert(new_account("sam@x.com")).await.unwrap();

        let err = store.insert(new_account("sam@x.com")).await.unwrap_err();
        assert_eq!(err, StoreError::UniqueViolation("email".to_string()));
        assert_eq!(store.count_by_email("sam@x.com").await.unwrap(), 1);
        assert_eq!(store.len(), 1);
    }

    /// 多任务同时插入同一邮箱，只有一个成功
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_insert_same_email() {
        let store = Arc::new(MemoryIdentityStore::new());
        let mut handles = Vec::new();

        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert(new_account("race@x.com")).await
            }));
        }

        let mut ok = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(StoreError::UniqueViolation(_)) => conflicts += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(conflicts, 15);
        assert_eq!(store.len(), 1);
    }
}
