//! 输入验证工具函数
//!
//! 上传前校验图片文件，任何网络请求之前拒绝不合法的输入

use crate::error::{Error, Result};
use std::path::Path;

/// 单个文件大小上限（20 MiB）
pub const MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// 支持的图片扩展名及其内容类型
pub const SUPPORTED_IMAGE_TYPES: [(&str, &str); 6] = [
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
];

/// 根据扩展名（不区分大小写）查找内容类型
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    SUPPORTED_IMAGE_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, content_type)| *content_type)
}

/// 是否为支持的图片扩展名
pub fn is_supported_image(path: &Path) -> bool {
    content_type_for(path).is_some()
}

/// 验证待上传的图片文件
///
/// # 返回
/// - `Ok(content_type)`: 验证通过
/// - `Err(Error::Validation)`: 文件缺失、不是普通文件、扩展名不支持、为空或过大
pub fn validate_image_file(path: &Path) -> Result<&'static str> {
    if !path.exists() {
        return Err(Error::Validation(format!("文件不存在: {}", path.display())));
    }

    let metadata = std::fs::metadata(path)
        .map_err(|e| Error::Validation(format!("无法读取文件信息 {}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(Error::Validation(format!("不是文件: {}", path.display())));
    }

    let content_type = content_type_for(path).ok_or_else(|| {
        let supported: Vec<&str> = SUPPORTED_IMAGE_TYPES.iter().map(|(e, _)| *e).collect();
        Error::Validation(format!(
            "不支持的文件格式: {} (支持: {})",
            path.display(),
            supported.join(", ")
        ))
    })?;

    let size = metadata.len();
    if size > MAX_FILE_SIZE {
        return Err(Error::Validation(format!(
            "文件过大: {:.1}MB (上限 {}MB)",
            size as f64 / (1024.0 * 1024.0),
            MAX_FILE_SIZE / (1024 * 1024)
        )));
    }
    if size == 0 {
        return Err(Error::Validation(format!("空文件: {}", path.display())));
    }

    Ok(content_type)
}
