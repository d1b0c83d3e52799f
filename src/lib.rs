//! 课程服务的无状态令牌认证与角色授权
//! 提供令牌编解码、认证网关、角色守卫以及课程 HTTP 服务

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
