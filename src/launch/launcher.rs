// 应用启动器 - 管理被截图 Web 应用的生命周期

use super::process::{ProcessGroup, SystemProcess};
use crate::error::{Error, Result};
use crate::models::{CaptureSettings, FrameworkDescriptor};
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

/// 启动器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    NotStarted,
    Starting,
    Running,
    Failed,
    Stopped,
}

/// 一次运行中最多托管一个应用进程
pub struct AppLauncher<P: ProcessGroup = SystemProcess> {
    state: LaunchState,
    process: Option<P>,
    url: Option<String>,
    stop_grace: Duration,
    error_prefix: usize,
}

impl<P: ProcessGroup> AppLauncher<P> {
    pub fn new(settings: &CaptureSettings) -> Self {
        Self::with_timings(
            Duration::from_secs(settings.stop_grace_secs),
            settings.launch_error_prefix,
        )
    }

    pub fn with_timings(stop_grace: Duration, error_prefix: usize) -> Self {
        Self {
            state: LaunchState::NotStarted,
            process: None,
            url: None,
            stop_grace,
            error_prefix,
        }
    }

    pub fn state(&self) -> LaunchState {
        self.state
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// 启动应用并等待其就绪，返回本地访问地址
    pub async fn start(
        &mut self,
        framework: &FrameworkDescriptor,
        project_path: &Path,
    ) -> Result<String> {
        if self.state == LaunchState::Running {
            return Err(Error::ProcessLaunch(format!(
                "已有应用在运行: {}",
                self.url.as_deref().unwrap_or_default()
            )));
        }

        self.state = LaunchState::Starting;
        self.url = None;
        info!(
            "启动 {} 应用: {} (等待 {} 秒)",
            framework.framework, framework.launch_command, framework.startup_grace
        );

        let mut process = match P::start(&framework.launch_command, project_path) {
            Ok(p) => p,
            Err(e) => {
                self.state = LaunchState::Failed;
                error!("{}", e);
                return Err(e);
            }
        };

        tokio::time::sleep(Duration::from_secs(framework.startup_grace)).await;

        if !process.is_alive() {
            let stderr = process.error_output(self.error_prefix).await;
            self.state = LaunchState::Failed;
            let err = Error::ProcessLaunch(format!("{} 启动后退出: {}", framework.framework, stderr));
            error!("{}", err);
            return Err(err);
        }

        let url = format!("http://localhost:{}", framework.port);
        self.process = Some(process);
        self.url = Some(url.clone());
        self.state = LaunchState::Running;
        info!("应用已就绪: {}", url);
        Ok(url)
    }

    /// 停止应用：先 SIGTERM，宽限期内未退出或信号失败则 SIGKILL
    pub async fn stop(&mut self) {
        if self.state != LaunchState::Running {
            return;
        }

        if let Some(mut process) = self.process.take() {
            let exited = match process.terminate_gracefully() {
                Ok(()) => process.wait_exit(self.stop_grace).await,
                Err(e) => {
                    warn!("优雅终止失败: {}", e);
                    false
                }
            };

            if !exited {
                warn!("应用未在 {:?} 内退出，强制终止", self.stop_grace);
                if let Err(e) = process.kill() {
                    error!("强制终止失败: {}", e);
                }
                process.wait_exit(self.stop_grace).await;
            }
        }

        self.url = None;
        self.state = LaunchState::Stopped;
        info!("应用已停止");
    }
}
