//! 课程服务

use crate::{
    error::AppError,
    models::course::{CourseDto, NewCourse},
    repository::CourseRepository,
};
use std::sync::Arc;

pub struct CourseService {
    repo: Arc<dyn CourseRepository>,
}

impl CourseService {
    pub fn new(repo: Arc<dyn CourseRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<CourseDto>, AppError> {
        let courses = self.repo.find_all().await?;
        Ok(courses.into_iter().map(CourseDto::from).collect())
    }

    pub async fn get(&self, id: i64) -> Result<CourseDto, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .map(CourseDto::from)
            .ok_or_else(|| AppError::NotFound(format!("course {}", id)))
    }

    /// 创建课程（调用方负责校验 DTO）
    pub async fn create(&self, dto: CourseDto) -> Result<CourseDto, AppError> {
        let course = self.repo.insert(NewCourse::from(dto)).await?;

        tracing::info!(course_id = course.id, title = %course.title, "Course created");

        Ok(course.into())
    }

    pub async fn delete(&self, id: i64) -> Result<CourseDto, AppError> {
        let course = self
            .repo
            .delete(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("course {}", id)))?;

        tracing::info!(course_id = course.id, "Course deleted");

        Ok(course.into())
    }
}
