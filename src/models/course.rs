//! Course resource models

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::auth::not_blank;

/// Course row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
}

/// Course fields before an id is assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub title: String,
    pub description: Option<String>,
}

/// Course DTO exposed over HTTP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CourseDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[validate(
        custom(function = "not_blank", message = "'title' is required"),
        length(max = 200, message = "'title' must be at most 200 characters")
    )]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000, message = "'description' must be at most 2000 characters"))]
    pub description: Option<String>,
}

impl From<Course> for CourseDto {
    fn from(course: Course) -> Self {
        Self {
            id: Some(course.id),
            title: course.title,
            description: course.description,
        }
    }
}

impl From<CourseDto> for NewCourse {
    /// Any client-supplied id is discarded; ids are assigned by the store.
    fn from(dto: CourseDto) -> Self {
        Self {
            title: dto.title.trim().to_string(),
            description: dto.description,
        }
    }
}
