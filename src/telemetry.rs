//! 日志与追踪系统
//! 初始化结构化日志和指标收集

use crate::{config::AppConfig, error::AppError};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 初始化日志与追踪系统
pub fn init_telemetry(config: &AppConfig) {
    // RUST_LOG 优先于配置中的日志级别
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let log_layer = match config.logging.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
            .boxed(),
        "pretty" => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer().compact().with_target(false).boxed(),
    };

    // 重复初始化（例如测试中）时忽略错误
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(log_layer)
        .try_init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.logging.level,
        format = %config.logging.format,
        "Telemetry initialized"
    );
}

/// 请求耗时直方图的桶（秒）
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// 构建 Prometheus recorder（不安装）
pub fn build_metrics_recorder() -> Result<PrometheusRecorder, BuildError> {
    Ok(PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .build_recorder())
}

/// 安装全局 recorder，返回 /metrics 端点使用的句柄
pub fn init_metrics() -> Result<PrometheusHandle, AppError> {
    let recorder = build_metrics_recorder()
        .map_err(|e| AppError::Config(format!("Invalid metrics configuration: {}", e)))?;
    let handle = recorder.handle();

    metrics::set_global_recorder(recorder)
        .map_err(|_| AppError::Config("Metrics recorder already installed".to_string()))?;

    tracing::debug!("Prometheus recorder installed");
    Ok(handle)
}
