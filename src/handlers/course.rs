//! 课程管理的 HTTP 处理器
//! 角色校验由路由上的 RoleGuardLayer 完成

use crate::{error::AppError, middleware::AppState, models::course::CourseDto};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

/// 列出课程
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CourseDto>>, AppError> {
    Ok(Json(state.course_service.list().await?))
}

/// 获取课程详情
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<CourseDto>, AppError> {
    let Path(id) = path?;
    Ok(Json(state.course_service.get(id).await?))
}

/// 创建课程
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CourseDto>, JsonRejection>,
) -> Result<(StatusCode, Json<CourseDto>), AppError> {
    let Json(req) = payload?;
    req.validate()?;

    let course = state.course_service.create(req).await?;

    Ok((StatusCode::CREATED, Json(course)))
}

/// 删除课程，返回被删除的课程
pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<CourseDto>, AppError> {
    let Path(id) = path?;
    Ok(Json(state.course_service.delete(id).await?))
}
