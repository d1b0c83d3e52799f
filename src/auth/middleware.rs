//! 认证网关中间件
//!
//! 每个请求执行一次：读取 Bearer 令牌、验证签名与有效期，并把
//! [`SecurityContext`] 写入请求扩展。验证失败不会拒绝请求，
//! 请求以匿名身份继续，由路由上的角色守卫决定是否放行。

use crate::{auth::token::TokenCodec, error::AppError};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::sync::Arc;

const BEARER_PREFIX: &str = "Bearer ";

/// 认证上下文（附加到请求扩展，仅在当前请求内有效）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityContext {
    pub username: String,
    pub roles: Vec<String>,
}

// 在 handler 中直接提取 SecurityContext，缺失时返回 401
impl<S> FromRequestParts<S> for SecurityContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}

/// 从 Authorization 头提取 Bearer 令牌
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
}

/// 认证网关 - 不强制要求令牌
pub async fn authentication_gate(
    State(codec): State<Arc<TokenCodec>>,
    mut req: Request,
    next: Next,
) -> Response {
    let outcome = authenticate_request(&codec, &mut req);
    metrics::counter!("auth_gate_requests_total", "outcome" => outcome).increment(1);

    next.run(req).await
}

/// 尝试为请求安装 SecurityContext，返回结果标签
fn authenticate_request(codec: &TokenCodec, req: &mut Request) -> &'static str {
    let token = match extract_bearer_token(req.headers()) {
        Some(token) => token.to_owned(),
        None => {
            tracing::debug!("No bearer token, continuing anonymously");
            return "anonymous";
        }
    };

    let claims = match codec.parse(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "Discarding unverifiable token");
            return "rejected";
        }
    };

    if req.extensions().get::<SecurityContext>().is_some() {
        return "already_authenticated";
    }

    let subject = claims.sub.clone();
    match codec.check(claims, &subject) {
        Ok(claims) => {
            tracing::debug!(username = %claims.sub, roles = ?claims.roles, "Request authenticated");
            req.extensions_mut().insert(SecurityContext {
                username: claims.sub,
                roles: claims.roles,
            });
            "authenticated"
        }
        Err(e) => {
            tracing::debug!(error = %e, username = %subject, "Discarding invalid token");
            "rejected"
        }
    }
}
