use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 默认日志目录
pub const DEFAULT_LOG_DIR: &str = "logs";

/// 初始化日志系统
///
/// - JSON格式文件: 按天轮转,文件名 `wechat-mp.YYYY-MM-DD.log`
/// - 控制台: 人类可读格式,输出到 stderr,stdout 留给命令结果
/// - 环境变量控制: RUST_LOG=debug 可调整日志级别,默认 INFO
///
/// # 日志级别
/// - ERROR: 缓存内容损坏、连接池创建失败
/// - WARN: 微信业务错误、回调签名不匹配、消息解析失败
/// - INFO: 凭证刷新与缓存写入 (默认级别)
/// - DEBUG: 缓存命中/未命中、消息分发
///
/// # 示例日志
/// ```json
/// {
///   "timestamp": "2025-10-05T10:30:45.123Z",
///   "level": "INFO",
///   "target": "wechat_mp::services::credential_cache",
///   "fields": {
///     "缓存键": "AccessTokenKey",
///     "过期秒数": 7200,
///     "message": "凭证已写入缓存"
///   }
/// }
/// ```
///
/// # 重要提示
/// 返回的guard必须被调用者保存,直到程序退出。
/// 如果guard被drop,文件写入器将被关闭。
pub fn init(log_dir: impl AsRef<Path>) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    let log_dir = log_dir.as_ref();
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("wechat-mp")
        .filename_suffix("log")
        .build(log_dir)?;

    // guard必须被保存,否则写入器会立即关闭
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false);

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(guard)
}
