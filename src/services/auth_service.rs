//! 认证服务：用户名/密码登录并签发令牌

use crate::{
    auth::{
        password::{PasswordHasher, Verification},
        token::TokenCodec,
    },
    error::AppError,
    repository::IdentityStore,
};
use std::sync::Arc;

/// 未知用户时参与校验的占位密码
const DUMMY_PASSWORD: &str = "course-security:no-such-user";

pub struct CredentialAuthenticator {
    store: Arc<dyn IdentityStore>,
    codec: Arc<TokenCodec>,
    hasher: PasswordHasher,
    // 与真实哈希同参数，用户不存在时也执行一次完整的 Argon2 校验
    dummy_hash: String,
}

impl CredentialAuthenticator {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        codec: Arc<TokenCodec>,
        hasher: PasswordHasher,
    ) -> Result<Self, AppError> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;

        Ok(Self {
            store,
            codec,
            hasher,
            dummy_hash,
        })
    }

    /// 用户登录，成功返回签名令牌
    ///
    /// 用户不存在与密码错误返回同一个错误，且耗时相同。
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AppError> {
        let identity = self.store.find_by_username(username).await?;

        let stored_hash = match &identity {
            Some(identity) => identity.password_hash.clone(),
            None => self.dummy_hash.clone(),
        };
        let verification = self.verify_blocking(password, stored_hash).await?;

        let identity = match identity {
            Some(identity) => identity,
            None => {
                tracing::debug!(username = %username, "Login failed: unknown user");
                metrics::counter!("auth_login_total", "outcome" => "failure").increment(1);
                return Err(AppError::InvalidCredentials);
            }
        };

        match verification {
            Ok(Verification::Match) => {}
            Ok(Verification::Mismatch) => {
                tracing::debug!(username = %username, "Login failed: wrong password");
                metrics::counter!("auth_login_total", "outcome" => "failure").increment(1);
                return Err(AppError::InvalidCredentials);
            }
            Err(e) => {
                tracing::error!(
                    username = %username,
                    error = %e,
                    "Stored password hash is unusable"
                );
                metrics::counter!("auth_login_total", "outcome" => "failure").increment(1);
                return Err(AppError::InvalidCredentials);
            }
        }

        let token = self.codec.issue(&identity)?;

        tracing::info!(username = %identity.username, roles = ?identity.roles, "User logged in");
        metrics::counter!("auth_login_total", "outcome" => "success").increment(1);

        Ok(token)
    }

    /// Argon2 是 CPU 密集操作，放到阻塞线程池
    ///
    /// 外层错误只表示任务失败，内层是校验结果。
    async fn verify_blocking(
        &self,
        password: &str,
        stored_hash: String,
    ) -> Result<Result<Verification, AppError>, AppError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::token::SigningKey,
        models::identity::Identity,
        repository::InMemoryIdentityStore,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    const SECRET: &[u8] = b"an-unit-test-secret-that-is-long-enough";

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_params(1024, 1, 1).unwrap()
    }

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(SigningKey::from_secret(SECRET), 3_600_000).unwrap())
    }

    fn authenticator(identities: Vec<Identity>) -> CredentialAuthenticator {
        CredentialAuthenticator::new(
            Arc::new(InMemoryIdentityStore::new(identities)),
            codec(),
            fast_hasher(),
        )
        .unwrap()
    }

    fn alice() -> Identity {
        let hash = fast_hasher().hash("secret").unwrap();
        Identity::new("alice", hash, ["ADMIN", "USER"])
    }

    /// 统计查询次数
    struct CountingStore {
        inner: InMemoryIdentityStore,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl IdentityStore for CountingStore {
        async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_username(username).await
        }
    }

    #[tokio::test]
    async fn test_login_success_issues_token() {
        let auth = authenticator(vec![alice()]);

        let token = auth.login("alice", "secret").await.unwrap();

        let claims = codec().parse(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.roles, vec!["ADMIN", "USER"]);
        assert!(codec().validate(&token, "alice"));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let auth = authenticator(vec![alice()]);

        let err = auth.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_unknown_user_same_error() {
        let auth = authenticator(vec![alice()]);

        let err = auth.login("mallory", "secret").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_corrupt_hash_is_invalid_credentials() {
        let auth = authenticator(vec![Identity::new("carol", "not-a-phc-string", ["USER"])]);

        let err = auth.login("carol", "secret").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_looks_up_once() {
        let store = Arc::new(CountingStore {
            inner: InMemoryIdentityStore::new([alice()]),
            lookups: AtomicUsize::new(0),
        });
        let auth = CredentialAuthenticator::new(store.clone(), codec(), fast_hasher()).unwrap();

        auth.login("alice", "secret").await.unwrap();
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);

        let _ = auth.login("alice", "wrong").await;
        assert_eq!(store.lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dummy_hash_uses_hasher_params() {
        let auth = authenticator(vec![]);

        assert!(auth.dummy_hash.starts_with("$argon2id$"));
        assert!(auth.dummy_hash.contains("m=1024,t=1,p=1"));
    }

    async fn average_login_micros(auth: &CredentialAuthenticator, username: &str) -> u128 {
        const ROUNDS: u32 = 3;
        let start = Instant::now();
        for _ in 0..ROUNDS {
            let err = auth.login(username, "wrong").await.unwrap_err();
            assert!(matches!(err, AppError::InvalidCredentials));
        }
        start.elapsed().as_micros() / u128::from(ROUNDS)
    }

    #[tokio::test]
    async fn test_unknown_user_costs_a_full_verification() {
        // 足够慢的参数，使 Argon2 耗时远大于查询与调度开销
        let hasher = PasswordHasher::with_params(8 * 1024, 2, 1).unwrap();
        let hash = hasher.hash("secret").unwrap();
        let auth = CredentialAuthenticator::new(
            Arc::new(InMemoryIdentityStore::new([Identity::new("alice", hash, ["USER"])])),
            codec(),
            hasher,
        )
        .unwrap();

        let known = average_login_micros(&auth, "alice").await;
        let unknown = average_login_micros(&auth, "mallory").await;

        assert!(
            unknown * 4 >= known,
            "unknown user answered too fast: known {} us, unknown {} us",
            known,
            unknown
        );
    }
}
