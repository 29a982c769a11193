// 截图执行模块 - 按策略逐项截图，单项失败不影响其他项

pub mod browser;
pub mod cdp;
pub mod chrome;
pub mod command;
pub mod renderer;
pub mod terminal;

pub use browser::{BrowserDriver, BrowserPage, HeadlessChrome};
pub use command::{CommandOutput, CommandRunner, ShellCommandRunner};
pub use renderer::{SvgTerminalRenderer, TerminalRenderer};

use crate::error::{Error, Result};
use crate::models::{
    CaptureItem, CaptureMethod, CaptureResult, CaptureSettings, CaptureStrategy, ProjectProfile,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 浏览器截图统一保存为 PNG
const BROWSER_EXTENSION: &str = "png";

/// 截图执行器
pub struct CaptureExecutor {
    browser: Arc<dyn BrowserDriver>,
    runner: Arc<dyn CommandRunner>,
    renderer: Arc<dyn TerminalRenderer>,
    output_dir: PathBuf,
    command_timeout: Duration,
    navigation_timeout: Duration,
}

impl CaptureExecutor {
    pub fn new(
        settings: &CaptureSettings,
        browser: Arc<dyn BrowserDriver>,
        runner: Arc<dyn CommandRunner>,
        renderer: Arc<dyn TerminalRenderer>,
    ) -> Self {
        Self {
            browser,
            runner,
            renderer,
            output_dir: settings.screenshot_dir.clone(),
            command_timeout: Duration::from_secs(settings.command_timeout_secs),
            navigation_timeout: Duration::from_millis(settings.navigation_timeout_ms),
        }
    }

    /// 按顺序执行所有截图项，结果与截图项一一对应
    pub async fn execute(
        &self,
        strategy: &CaptureStrategy,
        project_path: &Path,
        profile: &ProjectProfile,
    ) -> Vec<CaptureResult> {
        let mut results = Vec::with_capacity(strategy.items.len());

        for item in &strategy.items {
            info!("📷 截图中: {}", item.description);
            let result = match self.capture_item(item, project_path, profile).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("截图项 {} 失败: {}", item.name, e);
                    CaptureResult::failed(item, e)
                }
            };
            results.push(result);
        }

        results
    }

    async fn capture_item(
        &self,
        item: &CaptureItem,
        project_path: &Path,
        profile: &ProjectProfile,
    ) -> Result<CaptureResult> {
        match item.method {
            CaptureMethod::Terminal => self.capture_terminal(item, project_path, profile).await,
            CaptureMethod::Viewport | CaptureMethod::FullPage => self.capture_webpage(item).await,
            CaptureMethod::Element => self.capture_element(item).await,
            CaptureMethod::BeforeAfter => Err(Error::Configuration(format!(
                "不支持的截图方式: {}",
                item.method.label()
            ))),
        }
    }

    fn output_path(&self, item: &CaptureItem, extension: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", item.name, extension))
    }

    /// 运行命令（或生成演示文本）并渲染成终端图片
    async fn capture_terminal(
        &self,
        item: &CaptureItem,
        project_path: &Path,
        profile: &ProjectProfile,
    ) -> Result<CaptureResult> {
        let output_path = self.output_path(item, self.renderer.extension());

        let command = item
            .command
            .clone()
            .or_else(|| terminal::infer_terminal_command(project_path));

        let text = match command {
            Some(command) => {
                let output = self
                    .runner
                    .run(&command, project_path, self.command_timeout)
                    .await?;
                debug!("命令 `{}` 退出码: {:?}", command, output.exit_code);
                format!("$ {}\n{}", command, output.combined)
            }
            None => {
                debug!("无可运行入口，使用演示文本: {}", item.name);
                terminal::generate_demo_text(profile)
            }
        };

        self.renderer
            .render(&text, &output_path, &item.description)
            .await?;

        if !output_path.exists() {
            return Err(Error::Capture("截图文件生成失败".to_string()));
        }
        Ok(CaptureResult::succeeded(item, output_path))
    }

    async fn open_page(&self, item: &CaptureItem) -> Result<Box<dyn BrowserPage>> {
        let url = item
            .url
            .as_deref()
            .ok_or_else(|| Error::Capture("缺少应用地址，Web 应用未启动".to_string()))?;

        self.browser
            .open(
                url,
                item.viewport,
                self.navigation_timeout,
                Duration::from_secs(item.wait_seconds),
            )
            .await
    }

    /// 视口或整页截图
    async fn capture_webpage(&self, item: &CaptureItem) -> Result<CaptureResult> {
        let output_path = self.output_path(item, BROWSER_EXTENSION);
        let mut page = self.open_page(item).await?;

        let full_page = item.method == CaptureMethod::FullPage;
        page.screenshot(&output_path, full_page).await?;

        Ok(CaptureResult::succeeded(item, output_path))
    }

    /// 依次尝试候选选择器，全部落空时退回视口截图
    async fn capture_element(&self, item: &CaptureItem) -> Result<CaptureResult> {
        let output_path = self.output_path(item, BROWSER_EXTENSION);
        let mut page = self.open_page(item).await?;

        for selector in item.selector_candidates() {
            match page.screenshot_element(selector, &output_path).await {
                Ok(true) => {
                    debug!("元素截图命中选择器: {}", selector);
                    return Ok(CaptureResult::succeeded(item, output_path));
                }
                Ok(false) => {}
                Err(e) => debug!("选择器 {} 不可用，尝试下一个: {}", selector, e),
            }
        }

        info!("未找到可见元素，改为视口截图: {}", item.name);
        page.screenshot(&output_path, false).await?;
        Ok(CaptureResult::succeeded(item, output_path))
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use crate::models::Viewport;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 记录调用并写出占位文件的浏览器
    #[derive(Default)]
    pub struct FakeBrowser {
        /// 可见元素的选择器
        pub visible: Vec<String>,
        /// 查询时报错的选择器
        pub broken: Vec<String>,
        pub fail_open: bool,
        pub calls: Arc<Mutex<Vec<String>>>,
    }

    struct FakePage {
        visible: Vec<String>,
        broken: Vec<String>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl BrowserDriver for FakeBrowser {
        async fn open(
            &self,
            url: &str,
            _viewport: Viewport,
            _nav_timeout: Duration,
            _settle: Duration,
        ) -> Result<Box<dyn BrowserPage>> {
            self.calls.lock().unwrap().push(format!("open {}", url));
            if self.fail_open {
                return Err(Error::Capture("页面加载失败".to_string()));
            }
            Ok(Box::new(FakePage {
                visible: self.visible.clone(),
                broken: self.broken.clone(),
                calls: self.calls.clone(),
            }))
        }
    }

    #[async_trait]
    impl BrowserPage for FakePage {
        async fn screenshot(&mut self, path: &Path, full_page: bool) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("screenshot full_page={}", full_page));
            std::fs::write(path, b"png").map_err(|e| Error::Capture(e.to_string()))
        }

        async fn screenshot_element(&mut self, selector: &str, path: &Path) -> Result<bool> {
            self.calls.lock().unwrap().push(format!("element {}", selector));
            if self.broken.iter().any(|s| s == selector) {
                return Err(Error::Capture("invalid selector".to_string()));
            }
            if self.visible.iter().any(|s| s == selector) {
                std::fs::write(path, b"png").map_err(|e| Error::Capture(e.to_string()))?;
                return Ok(true);
            }
            Ok(false)
        }
    }

    /// 按命令返回预设输出；包含 "slow" 的命令超时
    #[derive(Default)]
    pub struct FakeRunner {
        pub commands: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(&self, command: &str, _cwd: &Path, timeout: Duration) -> Result<CommandOutput> {
            self.commands.lock().unwrap().push(command.to_string());
            if command.contains("slow") {
                return Err(Error::Timeout {
                    command: command.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            Ok(CommandOutput {
                combined: format!("ran {}\n✅ Done", command),
                exit_code: Some(0),
            })
        }
    }

    /// 把文本原样写入 .txt
    #[derive(Default)]
    pub struct FakeRenderer {
        pub rendered: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl TerminalRenderer for FakeRenderer {
        fn extension(&self) -> &str {
            "txt"
        }

        async fn render(&self, text: &str, output: &Path, _title: &str) -> Result<()> {
            self.rendered.lock().unwrap().push(text.to_string());
            std::fs::write(output, text).map_err(|e| Error::Capture(e.to_string()))
        }
    }
}
