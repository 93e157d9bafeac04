//! 用户管理器
//!
//! 负责用户的注册、登录、当前用户查询

use std::sync::Arc;

use super::{
    canonical_email, required_field, Account, AccountProfile, LoginRequest, LoginSession,
    NewAccount, PasswordHasher, RegisterRequest,
};
use crate::storage::IdentityStore;
use crate::utils::jwt::SessionKeys;
use crate::{DeskError, Result};

/// 用户管理器
pub struct UserManager {
    /// 身份存储
    store: Arc<dyn IdentityStore>,

    /// 密码哈希器
    hasher: PasswordHasher,

    /// 会话签名密钥
    keys: SessionKeys,

    /// 未知邮箱登录时用于校验的占位哈希，让两条失败路径耗时接近
    dummy_hash: String,
}

impl UserManager {
    /// 创建用户管理器
    ///
    /// 会以配置的成本计算一次占位哈希，调用线程会短暂阻塞。
    pub fn new(
        store: Arc<dyn IdentityStore>,
        hasher: PasswordHasher,
        keys: SessionKeys,
    ) -> Result<Self> {
        let dummy_hash = hasher.hash_blocking("salesdesk-dummy-password")?;
        Ok(Self {
            store,
            hasher,
            keys,
            dummy_hash,
        })
    }

    /// 注册新用户
    ///
    /// 校验 → 邮箱查重 → 哈希 → 插入。存储层唯一约束冲突同样报告为冲突。
    pub async fn register(&self, req: RegisterRequest) -> Result<Account> {
        let (name, email, password) = match (
            required_field(req.name.as_deref(), true),
            required_field(req.email.as_deref(), true),
            required_field(req.password.as_deref(), false),
        ) {
            (Some(name), Some(email), Some(password)) => (name, canonical_email(&email), password),
            _ => {
                return Err(DeskError::Validation(
                    "name, email and password are required".to_string(),
                ))
            }
        };

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(DeskError::Conflict(format!("Email already registered: {}", email)));
        }

        // 哈希期间不持有任何存储资源
        let password_hash = self.hasher.hash(password).await?;

        let account = self
            .store
            .insert(NewAccount {
                name,
                email,
                password_hash,
            })
            .await?;

        log::info!("User registered: {} ({})", account.email, account.id);

        Ok(account)
    }

    /// 用户登录，成功时签发会话 token
    pub async fn login(&self, req: LoginRequest) -> Result<LoginSession> {
        let (email, password) = match (
            required_field(req.email.as_deref(), true),
            required_field(req.password.as_deref(), false),
        ) {
            (Some(email), Some(password)) => (canonical_email(&email), password),
            _ => {
                return Err(DeskError::Validation(
                    "email and password are required".to_string(),
                ))
            }
        };

        let account = match self.store.find_by_email(&email).await? {
            Some(account) => account,
            None => {
                let _ = self.hasher.verify(password, self.dummy_hash.clone()).await;
                return Err(DeskError::InvalidCredentials);
            }
        };

        if !self
            .hasher
            .verify(password, account.password_hash.clone())
            .await?
        {
            log::warn!("Invalid password for {}", account.id);
            return Err(DeskError::InvalidCredentials);
        }

        let token = self
            .keys
            .issue(&account.id, &account.email)
            .map_err(|e| DeskError::Internal(format!("Failed to generate JWT token: {}", e)))?;

        log::info!("User {} logged in", account.id);

        Ok(LoginSession {
            token,
            user: account.profile(),
        })
    }

    /// 验证会话 token 并返回账户ID
    pub fn verify_token(&self, token: &str) -> Result<String> {
        let claims = self
            .keys
            .verify(token)
            .map_err(|e| DeskError::Unauthorized(format!("Invalid token: {}", e)))?;
        Ok(claims.sub)
    }

    /// 按会话 token 查询当前账户
    pub async fn current_account(&self, token: &str) -> Result<AccountProfile> {
        let account_id = self.verify_token(token)?;
        self.get_account(&account_id).await
    }

    /// 获取账户公开信息
    pub async fn get_account(&self, account_id: &str) -> Result<AccountProfile> {
        self.store
            .find_by_id(account_id)
            .await?
            .map(|account| account.profile())
            .ok_or_else(|| DeskError::NotFound(format!("User not found: {}", account_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryIdentityStore, SqliteIdentityStore};
    use crate::user::password::MIN_COST;

    fn manager_with(store: Arc<dyn IdentityStore>) -> UserManager {
        UserManager::new(
            store,
            PasswordHasher::new(MIN_COST).unwrap(),
            SessionKeys::new(b"unit-test-secret", 3600),
        )
        .unwrap()
    }

    fn manager() -> (Arc<MemoryIdentityStore>, UserManager) {
        let store = Arc::new(MemoryIdentityStore::new());
        let mgr = manager_with(store.clone());
        (store, mgr)
    }

    #[tokio::test]
    async fn test_user_registration() {
        let (store, mgr) = manager();

        let account = mgr
            .register(RegisterRequest::new("Sam", "sam@x.com", "pw123456"))
            .await
            .unwrap();

        assert_eq!(account.name, "Sam");
        assert_eq!(account.email, "sam@x.com");
        assert_eq!(store.count_by_email("sam@x.com").await.unwrap(), 1);
    }

    /// 存储的哈希不含明文，且用原密码可以校验通过
    #[tokio::test]
    async fn test_stored_hash_verifies() {
        let (store, mgr) = manager();
        mgr.register(RegisterRequest::new("Sam", "sam@x.com", "pw123456"))
            .await
            .unwrap();

        let stored = store.find_by_email("sam@x.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "pw123456");
        assert!(!stored.password_hash.contains("pw123456"));
        assert!(bcrypt::verify("pw123456", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let (store, mgr) = manager();

        let cases = vec![
            RegisterRequest {
                name: None,
                ..RegisterRequest::new("Sam", "sam@x.com", "pw")
            },
            RegisterRequest {
                email: None,
                ..RegisterRequest::new("Sam", "sam@x.com", "pw")
            },
            RegisterRequest {
                password: None,
                ..RegisterRequest::new("Sam", "sam@x.com", "pw")
            },
            RegisterRequest::new("", "sam@x.com", "pw"),
            RegisterRequest::new("Sam", "   ", "pw"),
            RegisterRequest::new("Sam", "sam@x.com", ""),
        ];

        for req in cases {
            let err = mgr.register(req.clone()).await.unwrap_err();
            assert!(matches!(err, DeskError::Validation(_)), "{:?} -> {:?}", req, err);
        }

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_detection() {
        let (store, mgr) = manager();
        mgr.register(RegisterRequest::new("Sam", "sam@x.com", "pw123456"))
            .await
            .unwrap();

        let err = mgr
            .register(RegisterRequest::new("Other", "sam@x.com", "another"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::Conflict(_)));

        // 大小写与空白不同的邮箱同样冲突
        let err = mgr
            .register(RegisterRequest::new("Other", "  SAM@X.com ", "another"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::Conflict(_)));

        assert_eq!(store.count_by_email("sam@x.com").await.unwrap(), 1);
        assert_eq!(store.len(), 1);
    }

    /// 并发注册同一邮箱：查重都通过时，由存储层唯一约束兜底
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registration_same_email() {
        let (store, mgr) = manager();
        let mgr = Arc::new(mgr);

        let mut handles = Vec::new();
        for i in 0..8 {
            let mgr = mgr.clone();
            handles.push(tokio::spawn(async move {
                mgr.register(RegisterRequest::new(&format!("user{}", i), "race@x.com", "pw"))
                    .await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(DeskError::Conflict(_)) => {}
                Err(e) => panic!("unexpected error: {:?}", e),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(store.count_by_email("race@x.com").await.unwrap(), 1);
    }

    /// SQLite 后端上的并发注册：唯一约束冲突同样报告为冲突
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registration_same_email_sqlite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("users.db").to_string_lossy().to_string();
        let store = Arc::new(SqliteIdentityStore::new(path));
        let mgr = Arc::new(manager_with(store.clone()));

        let mut handles = Vec::new();
        for i in 0..8 {
            let mgr = mgr.clone();
            handles.push(tokio::spawn(async move {
                mgr.register(RegisterRequest::new(&format!("user{}", i), "race@x.com", "pw"))
                    .await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(DeskError::Conflict(_)) => {}
                Err(e) => panic!("unexpected error: {:?}", e),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(store.count_by_email("race@x.com").await.unwrap(), 1);
    }

    #[test]
    fn test_dummy_hash_uses_configured_cost() {
        let mgr = manager_with(Arc::new(MemoryIdentityStore::new()));
        assert!(mgr.dummy_hash.starts_with("$2b$04$"));
        assert!(bcrypt::verify("salesdesk-dummy-password", &mgr.dummy_hash).unwrap());
    }

    #[tokio::test]
    async fn test_store_unavailable() {
        let store = Arc::new(SqliteIdentityStore::new("/nonexistent-salesdesk-dir/users.db"));
        let mgr = manager_with(store);

        let err = mgr
            .register(RegisterRequest::new("Sam", "sam@x.com", "pw123456"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::StoreUnavailable(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_user_login() {
        let (_store, mgr) = manager();
        let account = mgr
            .register(RegisterRequest::new("Sam", "sam@x.com", "pw123456"))
            .await
            .unwrap();

        let session = mgr
            .login(LoginRequest::new("Sam@X.com", "pw123456"))
            .await
            .unwrap();
        assert_eq!(session.user.id, account.id);
        assert_eq!(mgr.verify_token(&session.token).unwrap(), account.id);

        let err = mgr
            .login(LoginRequest::new("sam@x.com", "wrongpass"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_nonexistent_user() {
        let (_store, mgr) = manager();
        let err = mgr
            .login(LoginRequest::new("ghost@x.com", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::InvalidCredentials));

        let err = mgr.login(LoginRequest::default()).await.unwrap_err();
        assert!(matches!(err, DeskError::Validation(_)));
    }

    #[tokio::test]
    async fn test_current_account() {
        let (_store, mgr) = manager();
        mgr.register(RegisterRequest::new("Sam", "sam@x.com", "pw123456"))
            .await
            .unwrap();
        let session = mgr
            .login(LoginRequest::new("sam@x.com", "pw123456"))
            .await
            .unwrap();

        let profile = mgr.current_account(&session.token).await.unwrap();
        assert_eq!(profile, session.user);

        let err = mgr.current_account("garbage").await.unwrap_err();
        assert!(matches!(err, DeskError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_get_account_not_found() {
        let (_store, mgr) = manager();
        let err = mgr.get_account("missing").await.unwrap_err();
        assert!(matches!(err, DeskError::NotFound(_)));
    }
}
