//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

use crate::{
    auth::{
        guard::{RoleGuardLayer, RoleRule},
        middleware::authentication_gate,
    },
    handlers,
    middleware::AppState,
};

const ADMIN: &str = "ADMIN";
const USER: &str = "USER";

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查、指标）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::metrics::metrics_export));

    // 登录（无需认证）
    let auth_routes = Router::new().route("/authenticate", post(handlers::auth::authenticate));

    // 需要认证的路由，角色规则按方法挂载
    let guarded_routes = Router::new()
        .route(
            "/api/me",
            get(handlers::auth::current_user).route_layer(RoleGuardLayer::authenticated()),
        )
        .route(
            "/api/courses",
            get(handlers::course::list_courses)
                .route_layer(RoleGuardLayer::authenticated())
                .merge(
                    post(handlers::course::create_course)
                        .route_layer(RoleGuardLayer::require(RoleRule::has_role(ADMIN))),
                ),
        )
        .route(
            "/api/courses/{id}",
            get(handlers::course::get_course)
                .route_layer(RoleGuardLayer::require(RoleRule::has_any_role([ADMIN, USER])))
                .merge(
                    delete(handlers::course::delete_course)
                        .route_layer(RoleGuardLayer::require(RoleRule::has_role(ADMIN))),
                ),
        );

    // 组合所有路由（后添加的 layer 在外层）
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(guarded_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.token_codec.clone(),
            authentication_gate,
        ))
        .layer(RequestBodyLimitLayer::new(state.config.server.max_body_bytes))
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
