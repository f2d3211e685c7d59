//! # 日志初始化

use autoliq_core::config::LogConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// # Summary
/// 安装全局日志订阅者。
///
/// # Logic
/// 1. `RUST_LOG` 优先，否则使用配置的级别。
/// 2. 始终输出到标准输出。
/// 3. 配置了目录时额外按天滚动写入 `autoliq.log`。
///
/// # Returns
/// 文件写入器的守卫，需保持存活直到进程退出。
pub fn init(cfg: &LogConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));

    let (file_layer, guard) = match &cfg.dir {
        Some(dir) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "autoliq.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
    {
        tracing::warn!("Global subscriber already installed: {}", e);
    }

    guard
}
