//! 指标处理器
//! 提供 /metrics 端点（Prometheus 文本格式）

use axum::extract::State;
use std::sync::Arc;

use crate::{error::AppError, middleware::AppState};

/// 指标暴露端点
pub async fn metrics_export(State(state): State<Arc<AppState>>) -> Result<String, AppError> {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .ok_or_else(|| AppError::NotFound("metrics recorder".to_string()))
}
