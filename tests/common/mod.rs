//! 测试公共模块
//! 提供内存存储的应用状态和请求辅助函数（不需要数据库）

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use course_security::{
    auth::{password::PasswordHasher, token::TokenCodec},
    config::{AppConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig},
    middleware::AppState,
    models::identity::Identity,
    repository::{InMemoryCourseRepository, InMemoryIdentityStore},
    routes,
    services::{CourseService, CredentialAuthenticator},
    telemetry,
};
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-min-32-chars";

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            max_body_bytes: 16 * 1024,
        },
        database: DatabaseConfig {
            url: Secret::new("postgres://unused@localhost/unused".to_string()),
            max_connections: 1,
            min_connections: 0,
            acquire_timeout_secs: 1,
            idle_timeout_secs: 60,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            jwt_secret: Secret::new(TEST_SECRET.to_string()),
            token_ttl_ms: 300_000,
        },
    }
}

/// 测试用快速哈希参数
pub fn fast_hasher() -> PasswordHasher {
    PasswordHasher::with_params(1024, 1, 1).expect("valid argon2 params")
}

/// alice: ADMIN + USER, bob: USER，密码均为 "secret"
pub fn seeded_identities() -> Vec<Identity> {
    let hasher = fast_hasher();
    vec![
        Identity::new(
            "alice",
            hasher.hash("secret").expect("hash"),
            ["ADMIN", "USER"],
        ),
        Identity::new("bob", hasher.hash("secret").expect("hash"), ["USER"]),
    ]
}

/// 创建测试应用状态（不安装指标 recorder）
pub fn create_test_app_state() -> Arc<AppState> {
    build_app_state(None)
}

fn build_app_state(metrics_handle: Option<PrometheusHandle>) -> Arc<AppState> {
    let config = create_test_config();
    let token_codec = Arc::new(TokenCodec::from_config(&config).expect("token codec"));
    let identity_store = Arc::new(InMemoryIdentityStore::new(seeded_identities()));

    Arc::new(AppState {
        config,
        token_codec: token_codec.clone(),
        authenticator: Arc::new(
            CredentialAuthenticator::new(identity_store.clone(), token_codec, fast_hasher())
                .expect("authenticator"),
        ),
        course_service: Arc::new(CourseService::new(Arc::new(InMemoryCourseRepository::new()))),
        identity_store,
        metrics_handle,
    })
}

pub fn create_test_app() -> Router {
    routes::create_router(create_test_app_state())
}

/// 带本地 Prometheus recorder 句柄的应用（recorder 不安装为全局）
pub fn create_test_app_with_metrics() -> Router {
    let recorder = telemetry::build_metrics_recorder().expect("metrics recorder");
    routes::create_router(build_app_state(Some(recorder.handle())))
}

/// 读取 JSON 响应体
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// 登录并返回令牌
pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/authenticate",
            None,
            json!({"username": username, "password": password}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["token"]
        .as_str()
        .expect("token in response")
        .to_string()
}
