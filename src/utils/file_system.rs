//! 文件系统操作工具
//!
//! 提供跨平台的日志目录定位和截图工作目录准备

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::validation::is_supported_image;

/// 获取日志目录路径（跨平台）
///
/// - macOS: ~/Library/Logs/portfolio-capture
/// - Windows: %APPDATA%/portfolio-capture/logs
/// - Linux: ~/.local/share/portfolio-capture/logs
pub fn get_log_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join("Library/Logs/portfolio-capture")
    } else if cfg!(target_os = "windows") {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join("portfolio-capture").join("logs")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".local/share/portfolio-capture/logs")
    }
}

/// 创建截图目录并清除上一次运行留下的图片
///
/// 只删除支持的图片格式，其他文件和子目录保持不变
pub fn prepare_capture_dir(dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::Workspace(format!("创建目录失败 {}: {}", dir.display(), e)))?;

    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::Workspace(format!("读取目录失败 {}: {}", dir.display(), e)))?;

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() && is_supported_image(&path) {
            std::fs::remove_file(&path).map_err(|e| {
                Error::Workspace(format!("清理旧截图失败 {}: {}", path.display(), e))
            })?;
            debug!("已删除旧截图: {:?}", path);
            removed += 1;
        }
    }

    info!("截图目录已就绪: {:?} (清理 {} 个文件)", dir, removed);
    Ok(removed)
}
