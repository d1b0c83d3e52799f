//! 数据模型模块
//! 身份、认证请求与课程资源

pub mod auth;
pub mod course;
pub mod identity;
