//! In-memory stores for tests and local experiments

use super::{CourseRepository, IdentityStore};
use crate::{
    error::AppError,
    models::{
        course::{Course, NewCourse},
        identity::Identity,
    },
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Fixed set of identities keyed by username
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    identities: HashMap<String, Identity>,
}

impl InMemoryIdentityStore {
    pub fn new(identities: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            identities: identities
                .into_iter()
                .map(|identity| (identity.username.clone(), identity))
                .collect(),
        }
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError> {
        Ok(self.identities.get(username).cloned())
    }
}

#[derive(Debug, Default)]
struct CourseTable {
    next_id: i64,
    rows: BTreeMap<i64, Course>,
}

/// Course table with sequential ids starting at 1
#[derive(Debug, Default)]
pub struct InMemoryCourseRepository {
    table: RwLock<CourseTable>,
}

impl InMemoryCourseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CourseRepository for InMemoryCourseRepository {
    async fn find_all(&self) -> Result<Vec<Course>, AppError> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Course>, AppError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn insert(&self, course: NewCourse) -> Result<Course, AppError> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let course = Course {
            id: table.next_id,
            title: course.title,
            description: course.description,
        };
        table.rows.insert(course.id, course.clone());
        Ok(course)
    }

    async fn delete(&self, id: i64) -> Result<Option<Course>, AppError> {
        Ok(self.table.write().await.rows.remove(&id))
    }
}
