//! 日志初始化
//!
//! SDK 内部统一使用 `tracing` 记录日志。应用程序可以自行安装 subscriber，
//! 也可以调用 [`init_logging`] 使用默认配置：
//!
//! - `tracing_subscriber::fmt` 输出到 stderr
//! - 过滤规则来自 `RUST_LOG`，未设置时使用给定的默认规则
//! - 通过 `tracing-log` 把 `log` crate 的记录转发到同一个 subscriber

use log::LevelFilter;
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

/// 未设置 `RUST_LOG` 时的默认过滤规则
pub const DEFAULT_LOG_FILTER: &str = "info";

/// 以默认规则初始化日志
///
/// 返回本次调用是否安装了全局 subscriber；重复调用是安全的。
pub fn init_logging() -> bool {
    init_logging_with(DEFAULT_LOG_FILTER)
}

/// 以给定的默认过滤规则初始化日志（`RUST_LOG` 优先）
pub fn init_logging_with(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    // 其它库可能已经安装了 log 后端，忽略失败
    let _ = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
