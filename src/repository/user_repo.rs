//! User repository (数据库访问层)

use super::IdentityStore;
use crate::{db, error::AppError, models::identity::Identity};
use async_trait::async_trait;
use sqlx::PgPool;

pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityStore for UserRepository {
    /// 根据用户名查找用户
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError> {
        let identity = sqlx::query_as::<_, Identity>(
            "SELECT username, password_hash, roles FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        Ok(identity)
    }

    async fn ping(&self) -> Result<(), AppError> {
        db::ping(&self.db)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
