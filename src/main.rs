//! 课程服务主入口

use course_security::{
    auth::{password::PasswordHasher, token::TokenCodec},
    config::AppConfig,
    db,
    handlers::health,
    middleware::AppState,
    repository::{PgCourseRepository, UserRepository},
    routes,
    services::{CourseService, CredentialAuthenticator},
    telemetry,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("course-security {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            "--hash-password" => {
                let password = args
                    .get(2)
                    .ok_or_else(|| anyhow::anyhow!("--hash-password 需要一个密码参数"))?;
                println!("{}", PasswordHasher::new().hash(password)?);
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境），生产环境直接设置环境变量
    if let Ok(env) = std::env::var("COURSE_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志与指标
    telemetry::init_telemetry(&config);
    let metrics_handle = telemetry::init_metrics()?;

    // 定期清理直方图样本
    let upkeep_handle = metrics_handle.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(5));
        loop {
            interval.tick().await;
            upkeep_handle.run_upkeep();
        }
    });

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Course service starting...");

    // 3. 数据库连接池 + 迁移
    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    tracing::info!("Database initialized");

    // 4. 构建应用状态（签名密钥只在此构建一次）
    let token_codec = Arc::new(TokenCodec::from_config(&config)?);
    let identity_store = Arc::new(UserRepository::new(db_pool.clone()));

    let app_state = Arc::new(AppState {
        config: config.clone(),
        token_codec: token_codec.clone(),
        authenticator: Arc::new(CredentialAuthenticator::new(
            identity_store.clone(),
            token_codec,
            PasswordHasher::new(),
        )?),
        course_service: Arc::new(CourseService::new(Arc::new(PgCourseRepository::new(
            db_pool.clone(),
        )))),
        identity_store,
        metrics_handle: Some(metrics_handle),
    });

    // 5. 构建路由
    let app = routes::create_router(app_state);

    // 6. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // 7. 优雅关闭
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }
}

/// 打印帮助信息
fn print_help() {
    println!("course-security {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: course-security [选项]");
    println!();
    println!("选项:");
    println!("  --version                  打印版本信息并退出");
    println!("  --help                     打印此帮助信息并退出");
    println!("  --hash-password <密码>     输出 Argon2id 哈希（用于初始化 users 表）");
    println!();
    println!("环境变量:");
    println!("  所有配置通过 COURSE_ 前缀的环境变量完成，例如");
    println!("  COURSE_SECURITY__JWT_SECRET, COURSE_DATABASE__URL");
    println!("  可用选项请参考 .env.example");
}
