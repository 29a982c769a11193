// 错误类型 - 截图流水线的错误分类
//
// 单项截图或上传失败只会降级对应的 CaptureResult，
// 只有截图目录无法准备时才会中止整个流程

use thiserror::Error;

/// 截图流水线错误
#[derive(Debug, Error)]
pub enum Error {
    /// 输入文件不合法（扩展名、缺失、过大、空文件）
    #[error("文件校验失败: {0}")]
    Validation(String),

    /// 应用启动失败或启动后立即退出
    #[error("应用启动失败: {0}")]
    ProcessLaunch(String),

    /// 单个截图项执行失败
    #[error("截图失败: {0}")]
    Capture(String),

    /// 命令执行超时
    #[error("命令执行超时 ({seconds}秒): {command}")]
    Timeout { command: String, seconds: u64 },

    /// 远程调用失败
    #[error("{0}")]
    Upload(String),

    /// 不支持的内容类型或截图方式
    #[error("配置错误: {0}")]
    Configuration(String),

    /// 截图工作目录无法准备
    #[error("截图目录不可用: {0}")]
    Workspace(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Upload(format!("网络请求失败: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_mentions_bound() {
        let err = Error::Timeout {
            command: "python main.py".to_string(),
            seconds: 60,
        };
        let msg = err.to_string();
        assert!(msg.contains("60"));
        assert!(msg.contains("python main.py"));
    }
}
