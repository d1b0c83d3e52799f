//! Course repository (数据库访问层)

use super::CourseRepository;
use crate::{
    error::AppError,
    models::course::{Course, NewCourse},
};
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PgCourseRepository {
    db: PgPool,
}

impl PgCourseRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CourseRepository for PgCourseRepository {
    async fn find_all(&self) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT id, title, description FROM courses ORDER BY id",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(courses)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>(
            "SELECT id, title, description FROM courses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(course)
    }

    async fn insert(&self, course: NewCourse) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (title, description)
            VALUES ($1, $2)
            RETURNING id, title, description
            "#,
        )
        .bind(&course.title)
        .bind(&course.description)
        .fetch_one(&self.db)
        .await?;

        Ok(course)
    }

    async fn delete(&self, id: i64) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>(
            "DELETE FROM courses WHERE id = $1 RETURNING id, title, description",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(course)
    }
}
