// 命令执行 - 运行项目命令并收集输出，用于终端截图

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// 命令执行结果
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// stdout 在前，stderr 在后
    pub combined: String,
    pub exit_code: Option<i32>,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// 在 cwd 下运行 shell 命令，超时返回 `Error::Timeout`
    async fn run(&self, command: &str, cwd: &Path, timeout: Duration) -> Result<CommandOutput>;
}

/// 通过系统 shell 执行命令
#[derive(Debug, Default, Clone)]
pub struct ShellCommandRunner;

fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    let stderr = String::from_utf8_lossy(stderr);
    if !stderr.is_empty() {
        if !combined.is_empty() {
            combined.push('\n');
        }
        combined.push_str(&stderr);
    }
    combined
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, command: &str, cwd: &Path, timeout: Duration) -> Result<CommandOutput> {
        #[cfg(windows)]
        let mut cmd = {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        };
        #[cfg(not(windows))]
        let mut cmd = {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        };

        cmd.current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Windows下隐藏控制台窗口
        #[cfg(target_os = "windows")]
        {
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        debug!("执行命令: {} (cwd: {:?})", command, cwd);

        // 超时后 future 被丢弃，kill_on_drop 负责回收子进程
        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(result) => result
                .map_err(|e| Error::Capture(format!("无法执行命令 `{}`: {}", command, e)))?,
            Err(_) => {
                return Err(Error::Timeout {
                    command: command.to_string(),
                    seconds: timeout.as_secs(),
                })
            }
        };

        Ok(CommandOutput {
            combined: combine_output(&output.stdout, &output.stderr),
            exit_code: output.status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_output() {
        assert_eq!(combine_output(b"out", b""), "out");
        assert_eq!(combine_output(b"", b"err"), "err");
        assert_eq!(combine_output(b"out", b"err"), "out\nerr");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_runner_collects_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = ShellCommandRunner
            .run("echo hello; echo oops >&2; exit 3", dir.path(), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(out.combined, "hello\n\noops\n");
        assert_eq!(out.exit_code, Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_runner_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let err = ShellCommandRunner
            .run("sleep 5", dir.path(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { seconds: 1, .. }));
    }
}
