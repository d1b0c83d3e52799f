//! 认证相关的 HTTP 处理器

use crate::{
    auth::middleware::SecurityContext,
    error::AppError,
    middleware::AppState,
    models::auth::{AuthenticationRequest, AuthenticationResponse},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use validator::Validate;

/// 登录，返回签名令牌
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthenticationRequest>, JsonRejection>,
) -> Result<Json<AuthenticationResponse>, AppError> {
    let Json(req) = payload?;
    req.validate()?;

    let token = state.authenticator.login(&req.username, &req.password).await?;

    Ok(Json(AuthenticationResponse { token }))
}

/// 当前用户信息
pub async fn current_user(context: SecurityContext) -> Json<SecurityContext> {
    Json(context)
}
