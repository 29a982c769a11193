// 日志初始化 - 同时输出到控制台和按天轮转的日志文件

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// 日志文件名前缀
const LOG_FILE_PREFIX: &str = "capture.log";

/// 默认日志目录
pub fn default_log_dir() -> PathBuf {
    crate::utils::get_log_dir()
}

/// 初始化全局日志
///
/// 重复调用会返回错误（全局 subscriber 只能设置一次）
pub fn init(log_dir: &Path) -> Result<()> {
    // 创建日志目录
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("无法创建日志目录: {:?}", log_dir))?;

    // 配置日志输出到文件（每天轮转）
    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // 保持 guard 在整个程序生命周期
    std::mem::forget(guard);

    let writer = std::io::stdout.and(non_blocking);

    // 使用本地时区
    let timer = LocalTime::new(
        time::format_description::parse(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]",
        )
        .context("日志时间格式无效")?,
    );

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(writer)
        .with_timer(timer)
        .with_ansi(cfg!(debug_assertions)) // release 版本不使用颜色代码
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("日志系统已初始化")?;

    eprintln!("日志文件位置: {:?}", log_dir);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_once() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        assert!(init(&log_dir).is_ok());
        assert!(log_dir.is_dir());
        assert!(init(&log_dir).is_err());
    }
}
