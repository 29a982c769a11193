// 浏览器截图 - 通过 DevTools 协议驱动无头 Chrome

use super::cdp::{
    decode_screenshot, element_lookup_script, full_page_clip, parse_devtools_url, CdpConnection,
};
use super::chrome::find_chrome_path;
use crate::error::{Error, Result};
use crate::models::Viewport;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tracing::{debug, info};

/// 已打开的页面
#[async_trait]
pub trait BrowserPage: Send {
    async fn screenshot(&mut self, path: &Path, full_page: bool) -> Result<()>;

    /// 对可见元素截图；找不到或不可见时返回 false
    async fn screenshot_element(&mut self, selector: &str, path: &Path) -> Result<bool>;
}

#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// 打开页面，等待网络空闲（受 nav_timeout 约束）后再等待 settle
    async fn open(
        &self,
        url: &str,
        viewport: Viewport,
        nav_timeout: Duration,
        settle: Duration,
    ) -> Result<Box<dyn BrowserPage>>;
}

/// 每个页面启动一个无头 Chrome，通过 DevTools 协议控制
pub struct HeadlessChrome {
    chrome_path: Option<PathBuf>,
}

impl HeadlessChrome {
    /// chrome_path 为空时在首次打开页面时查找
    pub fn new(chrome_path: Option<PathBuf>) -> Self {
        Self { chrome_path }
    }

    fn resolve_path(&self) -> Result<PathBuf> {
        match &self.chrome_path {
            Some(path) => Ok(path.clone()),
            None => find_chrome_path().map_err(|e| Error::Capture(e.to_string())),
        }
    }

    fn spawn(chrome: &Path, profile_dir: &Path, viewport: Viewport) -> Result<Child> {
        let mut cmd = Command::new(chrome);
        cmd.arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--hide-scrollbars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--remote-debugging-port=0")
            .arg(format!("--user-data-dir={}", profile_dir.display()))
            .arg(format!("--window-size={},{}", viewport.width, viewport.height))
            .arg("about:blank")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Windows下隐藏控制台窗口
        #[cfg(target_os = "windows")]
        {
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        cmd.spawn()
            .map_err(|e| Error::Capture(format!("无法启动 Chrome {:?}: {}", chrome, e)))
    }
}

/// 读到调试地址后，剩余输出转入日志，避免管道写满
async fn read_devtools_url(stderr: ChildStderr) -> Result<String> {
    let mut lines = BufReader::new(stderr).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| Error::Capture(format!("读取 Chrome 输出失败: {}", e)))?
    {
        if let Some(url) = parse_devtools_url(&line) {
            tokio::spawn(async move {
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("chrome: {}", line);
                }
            });
            return Ok(url);
        }
        debug!("chrome: {}", line);
    }

    Err(Error::Capture("Chrome 已退出，未输出 DevTools 地址".to_string()))
}

#[async_trait]
impl BrowserDriver for HeadlessChrome {
    async fn open(
        &self,
        url: &str,
        viewport: Viewport,
        nav_timeout: Duration,
        settle: Duration,
    ) -> Result<Box<dyn BrowserPage>> {
        let chrome = self.resolve_path()?;
        let profile_dir = tempfile::Builder::new()
            .prefix("portfolio-capture-chrome")
            .tempdir()
            .map_err(|e| Error::Capture(format!("无法创建浏览器配置目录: {}", e)))?;

        let mut process = Self::spawn(&chrome, profile_dir.path(), viewport)?;
        let stderr = process
            .stderr
            .take()
            .ok_or_else(|| Error::Capture("无法读取 Chrome 输出".to_string()))?;
        let ws_url = tokio::time::timeout(nav_timeout, read_devtools_url(stderr))
            .await
            .map_err(|_| Error::Capture(format!("Chrome 启动超时 ({}秒)", nav_timeout.as_secs())))??;

        let mut conn = CdpConnection::connect(&ws_url).await?;
        let target = conn
            .call("Target.createTarget", json!({ "url": "about:blank" }))
            .await?;
        let target_id = target["targetId"]
            .as_str()
            .ok_or_else(|| Error::Capture("Target.createTarget 未返回 targetId".to_string()))?;
        let attached = conn
            .call(
                "Target.attachToTarget",
                json!({ "targetId": target_id, "flatten": true }),
            )
            .await?;
        let session_id = attached["sessionId"]
            .as_str()
            .ok_or_else(|| Error::Capture("Target.attachToTarget 未返回 sessionId".to_string()))?
            .to_string();
        conn.attach(session_id);

        let mut page = ChromePage {
            conn,
            viewport,
            _process: process,
            _profile_dir: profile_dir,
        };
        page.navigate(url, nav_timeout).await?;

        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        Ok(Box::new(page))
    }
}

/// 页面关闭时 Chrome 进程随之终止，配置目录随之删除
struct ChromePage {
    conn: CdpConnection,
    viewport: Viewport,
    _process: Child,
    _profile_dir: TempDir,
}

impl ChromePage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()> {
        self.conn.call("Page.enable", json!({})).await?;
        self.conn
            .call("Page.setLifecycleEventsEnabled", json!({ "enabled": true }))
            .await?;
        self.conn
            .call(
                "Emulation.setDeviceMetricsOverride",
                json!({
                    "width": self.viewport.width,
                    "height": self.viewport.height,
                    "deviceScaleFactor": 1,
                    "mobile": false
                }),
            )
            .await?;

        let navigation = self.conn.call("Page.navigate", json!({ "url": url })).await?;
        if let Some(error_text) = navigation["errorText"].as_str() {
            return Err(Error::Capture(format!("页面加载失败 {}: {}", url, error_text)));
        }
        let loader_id = navigation["loaderId"].as_str().unwrap_or_default().to_string();

        let idle = self
            .conn
            .wait_for_event("Page.lifecycleEvent", timeout, |params| {
                params["name"] == "networkIdle"
                    && (loader_id.is_empty() || params["loaderId"] == loader_id.as_str())
            })
            .await?;
        if !idle {
            return Err(Error::Capture(format!(
                "页面加载超时 ({}秒): {}",
                timeout.as_secs(),
                url
            )));
        }

        debug!("页面已进入网络空闲: {}", url);
        Ok(())
    }

    async fn capture(&mut self, path: &Path, params: Value) -> Result<()> {
        let result = self.conn.call("Page.captureScreenshot", params).await?;
        let bytes = decode_screenshot(&result)?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| Error::Capture(format!("保存截图失败 {:?}: {}", path, e)))?;

        info!("页面截图完成: {:?}", path);
        Ok(())
    }
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn screenshot(&mut self, path: &Path, full_page: bool) -> Result<()> {
        let params = if full_page {
            let metrics = self.conn.call("Page.getLayoutMetrics", json!({})).await?;
            json!({
                "format": "png",
                "captureBeyondViewport": true,
                "clip": full_page_clip(&metrics, self.viewport)
            })
        } else {
            json!({ "format": "png" })
        };

        self.capture(path, params).await
    }

    async fn screenshot_element(&mut self, selector: &str, path: &Path) -> Result<bool> {
        let lookup = self
            .conn
            .call(
                "Runtime.evaluate",
                json!({ "expression": element_lookup_script(selector), "returnByValue": true }),
            )
            .await?;

        if let Some(details) = lookup.get("exceptionDetails") {
            let reason = details["exception"]["description"]
                .as_str()
                .or_else(|| details["text"].as_str())
                .unwrap_or("unknown");
            return Err(Error::Capture(format!("选择器无效 {}: {}", selector, reason)));
        }

        let rect = &lookup["result"]["value"];
        if rect.is_null() {
            return Ok(false);
        }

        let clip = json!({
            "x": rect["x"],
            "y": rect["y"],
            "width": rect["width"],
            "height": rect["height"],
            "scale": 1
        });
        self.capture(
            path,
            json!({ "format": "png", "captureBeyondViewport": true, "clip": clip }),
        )
        .await?;
        Ok(true)
    }
}
