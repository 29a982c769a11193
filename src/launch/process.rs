// 进程组管理 - 以独立进程组启动应用，终止时信号发给整个组
//
// shell 启动的 streamlit/npm 会再派生子进程，它们必须随应用一起退出

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// 被启动应用的进程控制能力
#[async_trait]
pub trait ProcessGroup: Send + Sized {
    /// 在 cwd 下以新进程组启动 shell 命令
    fn start(command: &str, cwd: &Path) -> Result<Self>;

    /// 进程是否仍在运行
    fn is_alive(&mut self) -> bool;

    /// 请求整个进程组退出（SIGTERM）
    fn terminate_gracefully(&mut self) -> Result<()>;

    /// 强制终止整个进程组（SIGKILL）
    fn kill(&mut self) -> Result<()>;

    /// 等待进程退出，超时返回 false
    async fn wait_exit(&mut self, timeout: Duration) -> bool;

    /// 已退出进程的错误输出，最多 limit 个字符
    async fn error_output(&mut self, limit: usize) -> String;
}

fn shell_command(command: &str, stderr: Stdio) -> Command {
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

    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(stderr)
        .kill_on_drop(true);

    // Windows下隐藏控制台窗口
    #[cfg(target_os = "windows")]
    {
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }

    cmd
}

fn child_is_alive(child: &mut Child) -> bool {
    matches!(child.try_wait(), Ok(None))
}

async fn wait_child(child: &mut Child, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => {
            debug!("应用进程已退出: {}", status);
            true
        }
        Ok(Err(e)) => {
            warn!("等待应用进程失败: {}", e);
            false
        }
        Err(_) => false,
    }
}

/// 应用的 stderr 写入匿名临时文件，运行期间不会因管道写满而阻塞
fn error_log(command: &str) -> Result<(File, Stdio)> {
    let file = tempfile::tempfile()
        .map_err(|e| Error::ProcessLaunch(format!("无法为 `{}` 创建错误日志: {}", command, e)))?;
    let handle = file
        .try_clone()
        .map_err(|e| Error::ProcessLaunch(format!("无法为 `{}` 创建错误日志: {}", command, e)))?;
    Ok((file, Stdio::from(handle)))
}

fn read_error_prefix(log: &mut File, limit: usize) -> String {
    let mut buf = Vec::new();
    // 每个字符最多 4 字节
    let read = log
        .seek(SeekFrom::Start(0))
        .and_then(|_| log.take((limit as u64).saturating_mul(4)).read_to_end(&mut buf));
    if let Err(e) = read {
        debug!("读取错误日志失败: {}", e);
    }

    String::from_utf8_lossy(&buf)
        .trim()
        .chars()
        .take(limit)
        .collect()
}

/// unix 进程组：子进程成为新进程组的组长，信号发给整个组
#[cfg(unix)]
pub struct UnixProcessGroup {
    child: Child,
    pgid: libc::pid_t,
    error_log: File,
}

#[cfg(unix)]
impl UnixProcessGroup {
    fn signal_group(&self, signal: libc::c_int) -> Result<()> {
        // SAFETY: killpg 只读取两个整数参数
        let ret = unsafe { libc::killpg(self.pgid, signal) };
        if ret == 0 {
            Ok(())
        } else {
            Err(Error::ProcessLaunch(format!(
                "向进程组 {} 发送信号 {} 失败: {}",
                self.pgid,
                signal,
                std::io::Error::last_os_error()
            )))
        }
    }
}

#[cfg(unix)]
#[async_trait]
impl ProcessGroup for UnixProcessGroup {
    fn start(command: &str, cwd: &Path) -> Result<Self> {
        let (error_log, stderr) = error_log(command)?;
        let mut cmd = shell_command(command, stderr);
        cmd.current_dir(cwd).process_group(0);

        let child = cmd
            .spawn()
            .map_err(|e| Error::ProcessLaunch(format!("无法执行 `{}`: {}", command, e)))?;
        let pid = child
            .id()
            .ok_or_else(|| Error::ProcessLaunch(format!("`{}` 启动后立即退出", command)))?;

        debug!("应用进程组已创建: pgid={}", pid);
        Ok(Self {
            child,
            pgid: pid as libc::pid_t,
            error_log,
        })
    }

    fn is_alive(&mut self) -> bool {
        child_is_alive(&mut self.child)
    }

    fn terminate_gracefully(&mut self) -> Result<()> {
        self.signal_group(libc::SIGTERM)
    }

    fn kill(&mut self) -> Result<()> {
        let result = self.signal_group(libc::SIGKILL);
        // 同时终止直接子进程
        let _ = self.child.start_kill();
        result
    }

    async fn wait_exit(&mut self, timeout: Duration) -> bool {
        wait_child(&mut self.child, timeout).await
    }

    async fn error_output(&mut self, limit: usize) -> String {
        read_error_prefix(&mut self.error_log, limit)
    }
}

/// kill_on_drop 只能杀掉 shell，组内其余进程在这里一并清理
#[cfg(unix)]
impl Drop for UnixProcessGroup {
    fn drop(&mut self) {
        if child_is_alive(&mut self.child) {
            warn!("应用进程组 {} 未停止，强制终止", self.pgid);
            let _ = self.signal_group(libc::SIGKILL);
        }
    }
}

/// 非 unix 平台：没有进程组信号，只能终止直接子进程
#[cfg(not(unix))]
pub struct ChildProcess {
    child: Child,
    error_log: File,
}

#[cfg(not(unix))]
#[async_trait]
impl ProcessGroup for ChildProcess {
    fn start(command: &str, cwd: &Path) -> Result<Self> {
        let (error_log, stderr) = error_log(command)?;
        let mut cmd = shell_command(command, stderr);
        cmd.current_dir(cwd);
        let child = cmd
            .spawn()
            .map_err(|e| Error::ProcessLaunch(format!("无法执行 `{}`: {}", command, e)))?;
        Ok(Self { child, error_log })
    }

    fn is_alive(&mut self) -> bool {
        child_is_alive(&mut self.child)
    }

    fn terminate_gracefully(&mut self) -> Result<()> {
        self.kill()
    }

    fn kill(&mut self) -> Result<()> {
        self.child
            .start_kill()
            .map_err(|e| Error::ProcessLaunch(format!("终止应用进程失败: {}", e)))
    }

    async fn wait_exit(&mut self, timeout: Duration) -> bool {
        wait_child(&mut self.child, timeout).await
    }

    async fn error_output(&mut self, limit: usize) -> String {
        read_error_prefix(&mut self.error_log, limit)
    }
}

#[cfg(unix)]
pub type SystemProcess = UnixProcessGroup;

#[cfg(not(unix))]
pub type SystemProcess = ChildProcess;
