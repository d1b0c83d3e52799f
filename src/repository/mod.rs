//! Database repository layer
//!
//! The services depend on the store traits below; PostgreSQL and in-memory
//! implementations are provided.

pub mod course_repo;
pub mod memory;
pub mod user_repo;

pub use course_repo::*;
pub use memory::*;
pub use user_repo::*;

use crate::{
    error::AppError,
    models::{
        course::{Course, NewCourse},
        identity::Identity,
    },
};
use async_trait::async_trait;

/// Source of stored credentials
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// 根据用户名查找身份，不存在时返回 None
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError>;

    /// 就绪检查
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Course persistence
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Course>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Course>, AppError>;

    async fn insert(&self, course: NewCourse) -> Result<Course, AppError>;

    /// 删除并返回被删除的记录
    async fn delete(&self, id: i64) -> Result<Option<Course>, AppError>;
}
