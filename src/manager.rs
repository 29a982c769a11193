// 截图管理器 - 串联策略、应用启动、截图、上传与封面设置

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::capture::{
    BrowserDriver, CaptureExecutor, CommandRunner, HeadlessChrome, ShellCommandRunner,
    SvgTerminalRenderer, TerminalRenderer,
};
use crate::error::Result;
use crate::launch::{detect_framework, AppLauncher, LaunchState, ProcessGroup, SystemProcess};
use crate::models::{CaptureReport, CaptureSettings, PersistedCaptureConfig, ProjectProfile};
use crate::notion::{NotionClient, RemoteWorkspace, UploadCoordinator};
use crate::strategy::{determine_capture_strategy, format_capture_plan_preview};
use crate::utils::prepare_capture_dir;

pub struct CaptureManager<P: ProcessGroup = SystemProcess> {
    settings: CaptureSettings,
    executor: CaptureExecutor,
    uploader: UploadCoordinator,
    launcher: AppLauncher<P>,
}

impl CaptureManager<SystemProcess> {
    /// 使用 Chrome、系统 shell、SVG 渲染和 Notion API 创建管理器
    pub fn new(config: &PersistedCaptureConfig) -> anyhow::Result<Self> {
        let client = NotionClient::new(config.notion.clone()).context("无法创建 Notion 客户端")?;
        let capture = &config.capture;

        Ok(Self::with_collaborators(
            capture.clone(),
            Arc::new(HeadlessChrome::new(capture.chrome_path.clone())),
            Arc::new(ShellCommandRunner),
            Arc::new(SvgTerminalRenderer::new(
                capture.terminal_max_lines,
                capture.terminal_width,
            )),
            Arc::new(client),
        ))
    }
}

impl<P: ProcessGroup> CaptureManager<P> {
    pub fn with_collaborators(
        settings: CaptureSettings,
        browser: Arc<dyn BrowserDriver>,
        runner: Arc<dyn CommandRunner>,
        renderer: Arc<dyn TerminalRenderer>,
        workspace: Arc<dyn RemoteWorkspace>,
    ) -> Self {
        Self {
            executor: CaptureExecutor::new(&settings, browser, runner, renderer),
            uploader: UploadCoordinator::new(workspace),
            launcher: AppLauncher::new(&settings),
            settings,
        }
    }

    pub fn launcher_state(&self) -> LaunchState {
        self.launcher.state()
    }

    /// 自动截图并上传到指定页面
    ///
    /// 只有截图目录无法准备时返回错误，其余失败都记录在报告里
    pub async fn auto_capture(
        &mut self,
        project_path: &Path,
        profile: &ProjectProfile,
        page_id: &str,
        jd_keywords: &[String],
    ) -> Result<CaptureReport> {
        prepare_capture_dir(&self.settings.screenshot_dir)?;

        let mut strategy = determine_capture_strategy(profile, jd_keywords);
        info!("\n{}", format_capture_plan_preview(&strategy));

        if let Some(framework) = detect_framework(project_path) {
            info!("🚀 启动 {} 应用", framework.framework);
            match self.launcher.start(&framework, project_path).await {
                Ok(url) => strategy.fill_app_url(&url),
                Err(e) => warn!("应用启动失败，Web 截图将跳过: {}", e),
            }
        }

        let results = self.executor.execute(&strategy, project_path, profile).await;
        self.launcher.stop().await;

        let results = self.uploader.upload_results(results, page_id).await;

        if self.settings.set_cover {
            self.uploader
                .apply_cover(&results, strategy.cover_from.as_deref(), page_id)
                .await;
        }

        let report = CaptureReport::new(strategy, results);
        info!("\n{}", report.summary());
        Ok(report)
    }

    /// 上传用户指定的图片
    pub async fn upload_manual_images(
        &self,
        paths: &[PathBuf],
        page_id: &str,
        captions: &[String],
    ) -> CaptureReport {
        let report = self
            .uploader
            .upload_manual_images(paths, page_id, captions)
            .await;
        info!("\n{}", report.summary());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::fakes::{FakeBrowser, FakeRunner};
    use crate::capture::CommandOutput;
    use crate::error::Error;
    use crate::models::ProjectType;
    use crate::notion::upload::fakes::FakeWorkspace;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    /// ALIVE=false 时进程启动后立即退出
    struct FakeProcess<const ALIVE: bool> {
        alive: bool,
    }

    #[async_trait]
    impl<const ALIVE: bool> ProcessGroup for FakeProcess<ALIVE> {
        fn start(_command: &str, _cwd: &Path) -> Result<Self> {
            Ok(Self { alive: ALIVE })
        }

        fn is_alive(&mut self) -> bool {
            self.alive
        }

        fn terminate_gracefully(&mut self) -> Result<()> {
            self.alive = false;
            Ok(())
        }

        fn kill(&mut self) -> Result<()> {
            self.alive = false;
            Ok(())
        }

        async fn wait_exit(&mut self, _timeout: Duration) -> bool {
            !self.alive
        }

        async fn error_output(&mut self, _limit: usize) -> String {
            "ModuleNotFoundError: No module named 'streamlit'".to_string()
        }
    }

    /// 第二次调用超时
    #[derive(Default)]
    struct SecondCallTimesOut {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CommandRunner for SecondCallTimesOut {
        async fn run(&self, command: &str, _cwd: &Path, timeout: Duration) -> Result<CommandOutput> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 1 {
                return Err(Error::Timeout {
                    command: command.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            Ok(CommandOutput {
                combined: "accuracy: 0.93\n✅ Done".to_string(),
                exit_code: Some(0),
            })
        }
    }

    struct Fixture {
        project: TempDir,
        _out: TempDir,
        settings: CaptureSettings,
        workspace: Arc<FakeWorkspace>,
        browser_calls: Arc<std::sync::Mutex<Vec<String>>>,
    }

    fn fixture() -> Fixture {
        let out = tempdir().unwrap();
        let settings = CaptureSettings {
            screenshot_dir: out.path().join("screenshots"),
            ..Default::default()
        };
        Fixture {
            project: tempdir().unwrap(),
            _out: out,
            settings,
            workspace: Arc::new(FakeWorkspace::default()),
            browser_calls: Default::default(),
        }
    }

    fn manager<P: ProcessGroup>(f: &Fixture, runner: Arc<dyn CommandRunner>) -> CaptureManager<P> {
        let browser = FakeBrowser {
            calls: f.browser_calls.clone(),
            ..Default::default()
        };
        CaptureManager::with_collaborators(
            f.settings.clone(),
            Arc::new(browser),
            runner,
            Arc::new(SvgTerminalRenderer::new(50, 820)),
            f.workspace.clone(),
        )
    }

    fn profile(project_type: ProjectType, problem: &str) -> ProjectProfile {
        let mut p = ProjectProfile::new("Demo");
        p.project_type = project_type;
        p.problem = problem.to_string();
        p.tech_stack = vec!["Python".to_string()];
        p
    }

    #[tokio::test]
    async fn test_terminal_project_end_to_end() {
        let f = fixture();
        fs::write(f.project.path().join("main.py"), "print('train')").unwrap();
        let mut m = manager::<FakeProcess<true>>(&f, Arc::new(FakeRunner::default()));

        let report = m
            .auto_capture(
                f.project.path(),
                &profile(ProjectType::Learning, "machine learning model prediction"),
                "page1",
                &[],
            )
            .await
            .unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.failed_count, 0);
        assert!(report
            .results
            .iter()
            .all(|r| r.file_upload_id.is_some()));
        assert_eq!(m.launcher_state(), LaunchState::NotStarted);
        assert!(f
            .workspace
            .calls()
            .contains(&"cover page1 fu_model_metrics.svg".to_string()));
    }

    #[tokio::test]
    async fn test_timeout_degrades_single_item() {
        let f = fixture();
        fs::write(f.project.path().join("main.py"), "print('train')").unwrap();
        let mut m =
            manager::<FakeProcess<true>>(&f, Arc::new(SecondCallTimesOut::default()));

        let report = m
            .auto_capture(
                f.project.path(),
                &profile(ProjectType::Learning, "machine learning model prediction"),
                "page1",
                &[],
            )
            .await
            .unwrap();

        assert_eq!(report.success_count, 1);
        assert_eq!(report.failed_count, 1);
        let failed = &report.results[1];
        assert!(!failed.success);
        assert!(failed.error.as_ref().unwrap().contains("60"));
        assert_eq!(f.workspace.count("create"), 1);
    }

    #[tokio::test]
    async fn test_failed_launch_degrades_only_web_items() {
        let f = fixture();
        fs::write(
            f.project.path().join("app.py"),
            "import streamlit as st\nst.title('EDA')",
        )
        .unwrap();
        let mut m = manager::<FakeProcess<false>>(&f, Arc::new(FakeRunner::default()));

        let report = m
            .auto_capture(
                f.project.path(),
                &profile(ProjectType::Business, "eda sql analysis"),
                "page1",
                &[],
            )
            .await
            .unwrap();

        assert_eq!(m.launcher_state(), LaunchState::Failed);
        assert_eq!(report.total, 3);
        assert_eq!(report.success_count, 2);

        let web = report.results.iter().find(|r| r.name == "key_finding").unwrap();
        assert!(!web.success);
        assert!(report
            .results
            .iter()
            .filter(|r| r.name != "key_finding")
            .all(|r| r.success));

        // 封面回退到第一个已上传的结果
        assert!(f
            .workspace
            .calls()
            .contains(&"cover page1 fu_analysis_output.svg".to_string()));
        assert!(f.browser_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_running_app_is_captured_then_stopped() {
        let f = fixture();
        fs::write(
            f.project.path().join("app.py"),
            "import streamlit as st\nst.title('Demo')",
        )
        .unwrap();
        let mut m = manager::<FakeProcess<true>>(&f, Arc::new(FakeRunner::default()));

        let report = m
            .auto_capture(
                f.project.path(),
                &profile(ProjectType::Business, "streamlit web app"),
                "page1",
                &[],
            )
            .await
            .unwrap();

        assert_eq!(m.launcher_state(), LaunchState::Stopped);
        assert_eq!(report.success_count, 2);
        assert!(report
            .strategy
            .items
            .iter()
            .all(|i| i.url.as_deref() == Some("http://localhost:8501")));
        assert_eq!(
            f.browser_calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.starts_with("open http://localhost:8501"))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_unpreparable_capture_dir_is_fatal() {
        let f = fixture();
        let blocker = f._out.path().join("blocked");
        fs::write(&blocker, b"x").unwrap();
        let settings = CaptureSettings {
            screenshot_dir: blocker,
            ..Default::default()
        };
        let mut m: CaptureManager<FakeProcess<true>> = CaptureManager::with_collaborators(
            settings,
            Arc::new(FakeBrowser::default()),
            Arc::new(FakeRunner::default()),
            Arc::new(SvgTerminalRenderer::new(50, 820)),
            f.workspace.clone(),
        );

        let result = m
            .auto_capture(f.project.path(), &ProjectProfile::new("Demo"), "page1", &[])
            .await;
        assert!(matches!(result, Err(Error::Workspace(_))));
        assert!(f.workspace.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cover_disabled() {
        let mut f = fixture();
        f.settings.set_cover = false;
        fs::write(f.project.path().join("main.py"), "print('x')").unwrap();
        let mut m = manager::<FakeProcess<true>>(&f, Arc::new(FakeRunner::default()));

        m.auto_capture(
            f.project.path(),
            &profile(ProjectType::Learning, "machine learning model"),
            "page1",
            &[],
        )
        .await
        .unwrap();
        assert_eq!(f.workspace.count("cover"), 0);
    }
}
