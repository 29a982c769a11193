// 数据模型模块 - 定义所有的数据结构

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 项目类型（来自已有的项目分析）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProjectType {
    Business,
    Exploratory,
    Learning,
    /// 未声明或无法识别的类型
    #[default]
    #[serde(other)]
    Unspecified,
}

impl ProjectType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Business => "Business",
            Self::Exploratory => "Exploratory",
            Self::Learning => "Learning",
            Self::Unspecified => "",
        }
    }

    /// 按项目类型限制的最大截图数
    pub fn max_captures(&self) -> usize {
        match self {
            Self::Business => 4,
            Self::Exploratory => 3,
            Self::Learning => 2,
            Self::Unspecified => 3,
        }
    }
}

/// 项目画像，截图策略的唯一输入
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectProfile {
    pub name: String,
    #[serde(rename = "type", default)]
    pub project_type: ProjectType,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub problem: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub impact: String,
}

impl ProjectProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// 问题与方案拼接成的项目描述
    pub fn description(&self) -> String {
        format!("{} {}", self.problem, self.solution)
    }
}

/// 截图方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMethod {
    /// 整页滚动截图
    FullPage,
    /// 当前视口截图
    Viewport,
    /// 指定 CSS 选择器元素截图
    Element,
    /// 终端输出渲染为图片
    Terminal,
    /// 交互前后对比
    BeforeAfter,
}

impl CaptureMethod {
    /// 是否需要运行中的 Web 应用
    pub fn needs_url(&self) -> bool {
        matches!(self, Self::FullPage | Self::Viewport | Self::Element)
    }

    pub fn label(&self) -> &str {
        match self {
            Self::FullPage => "整页",
            Self::Viewport => "视口",
            Self::Element => "元素",
            Self::Terminal => "终端",
            Self::BeforeAfter => "前后对比",
        }
    }
}

/// 截图在页面上的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureType {
    Main,
    #[serde(rename = "insight")]
    KeyInsight,
    Detail,
    Terminal,
    Comparison,
}

impl CaptureType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Main => "main",
            Self::KeyInsight => "insight",
            Self::Detail => "detail",
            Self::Terminal => "terminal",
            Self::Comparison => "comparison",
        }
    }
}

/// 截图优先级，排序时 Required 在前
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Required = 1,
    Recommended = 2,
    Optional = 3,
}

impl Priority {
    pub fn marker(&self) -> &str {
        match self {
            Self::Required => "🔴",
            Self::Recommended => "🟡",
            Self::Optional => "⚪",
        }
    }
}

/// 视口尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// 单个截图项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureItem {
    /// 策略内唯一的标识（例如 "main_dashboard"）
    pub name: String,
    pub description: String,
    pub method: CaptureMethod,
    pub capture_type: CaptureType,
    pub priority: Priority,
    /// 对作品集的价值说明
    pub portfolio_value: String,
    /// 已填入项目名的图片说明
    pub caption: String,
    /// Web 应用地址，应用启动后回填
    pub url: Option<String>,
    /// 逗号分隔的候选选择器
    pub selector: Option<String>,
    pub command: Option<String>,
    /// 截图前额外等待秒数
    pub wait_seconds: u64,
    pub viewport: Viewport,
}

impl CaptureItem {
    pub fn new(
        name: &str,
        description: &str,
        method: CaptureMethod,
        capture_type: CaptureType,
        priority: Priority,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            method,
            capture_type,
            priority,
            portfolio_value: String::new(),
            caption: String::new(),
            url: None,
            selector: None,
            command: None,
            wait_seconds: 3,
            viewport: Viewport::default(),
        }
    }

    pub fn value(mut self, portfolio_value: &str) -> Self {
        self.portfolio_value = portfolio_value.to_string();
        self
    }

    pub fn caption(mut self, caption: String) -> Self {
        self.caption = caption;
        self
    }

    pub fn selector(mut self, selector: &str) -> Self {
        self.selector = Some(selector.to_string());
        self
    }

    /// 拆分后的候选选择器
    pub fn selector_candidates(&self) -> Vec<&str> {
        self.selector
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// 项目截图类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectCategory {
    Dashboard,
    Automation,
    DataAnalysis,
    #[serde(rename = "webapp")]
    WebApp,
    MlAi,
    /// 手动上传的图片
    Manual,
}

impl ProjectCategory {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Automation => "automation",
            Self::DataAnalysis => "data_analysis",
            Self::WebApp => "webapp",
            Self::MlAi => "ml_ai",
            Self::Manual => "manual",
        }
    }
}

/// 一个项目的完整截图计划
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureStrategy {
    pub category: ProjectCategory,
    pub items: Vec<CaptureItem>,
    pub max_captures: usize,
    /// 作为页面封面的截图名称
    pub cover_from: Option<String>,
}

impl CaptureStrategy {
    pub fn new(category: ProjectCategory, cover_from: Option<&str>) -> Self {
        Self {
            category,
            items: Vec::new(),
            max_captures: 4,
            cover_from: cover_from.map(str::to_string),
        }
    }

    /// 给需要 Web 应用的截图项回填地址
    pub fn fill_app_url(&mut self, url: &str) {
        for item in self.items.iter_mut().filter(|i| i.method.needs_url()) {
            item.url = Some(url.to_string());
        }
    }
}

/// 检测到的 Web 框架及其启动方式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkDescriptor {
    pub framework: String,
    pub entry_file: PathBuf,
    pub port: u16,
    pub launch_command: String,
    /// 启动后等待秒数
    pub startup_grace: u64,
}

/// 单个截图项的执行结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureResult {
    pub name: String,
    pub path: PathBuf,
    pub caption: String,
    pub capture_type: String,
    pub success: bool,
    pub file_upload_id: Option<String>,
    pub error: Option<String>,
}

impl CaptureResult {
    pub fn succeeded(item: &CaptureItem, path: PathBuf) -> Self {
        Self {
            name: item.name.clone(),
            path,
            caption: item.caption.clone(),
            capture_type: item.capture_type.as_str().to_string(),
            success: true,
            file_upload_id: None,
            error: None,
        }
    }

    pub fn failed(item: &CaptureItem, error: impl ToString) -> Self {
        Self {
            name: item.name.clone(),
            path: PathBuf::new(),
            caption: item.caption.clone(),
            capture_type: item.capture_type.as_str().to_string(),
            success: false,
            file_upload_id: None,
            error: Some(error.to_string()),
        }
    }

    /// 成功且文件仍在磁盘上，才值得上传
    pub fn is_uploadable(&self) -> bool {
        self.success && !self.path.as_os_str().is_empty() && self.path.exists()
    }
}

/// 整体截图报告
#[derive(Debug, Clone, Serialize)]
pub struct CaptureReport {
    pub strategy: CaptureStrategy,
    pub results: Vec<CaptureResult>,
    pub total: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub generated_at: DateTime<Local>,
}

impl CaptureReport {
    pub fn new(strategy: CaptureStrategy, results: Vec<CaptureResult>) -> Self {
        let total = results.len();
        let success_count = results.iter().filter(|r| r.success).count();
        Self {
            strategy,
            results,
            total,
            success_count,
            failed_count: total - success_count,
            generated_at: Local::now(),
        }
    }

    /// 供人阅读的结果摘要
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "📸 截图完成: {}/{} 张",
            self.success_count, self.total
        )];
        for r in &self.results {
            let icon = if r.success { "✅" } else { "❌" };
            lines.push(format!("  {} {}", icon, r.caption));
            if let Some(err) = &r.error {
                lines.push(format!("     └ {}", err));
            }
        }
        lines.join("\n")
    }
}

/// 截图执行设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// 截图输出目录，每次运行前清空
    pub screenshot_dir: PathBuf,
    /// 终端命令超时（秒）
    pub command_timeout_secs: u64,
    /// 页面加载超时（毫秒）
    pub navigation_timeout_ms: u64,
    /// 停止应用时等待优雅退出的秒数
    pub stop_grace_secs: u64,
    /// 启动失败时保留的错误输出长度
    pub launch_error_prefix: usize,
    /// 终端图片最大行数
    pub terminal_max_lines: usize,
    /// 终端图片宽度（像素）
    pub terminal_width: u32,
    /// 是否把主截图设为页面封面
    pub set_cover: bool,
    /// 自定义 Chrome 路径
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            screenshot_dir: std::env::temp_dir()
                .join("portfolio-capture")
                .join("screenshots"),
            command_timeout_secs: 60,
            navigation_timeout_ms: 30_000,
            stop_grace_secs: 5,
            launch_error_prefix: 200,
            terminal_max_lines: 50,
            terminal_width: 820,
            set_cover: true,
            chrome_path: None,
        }
    }
}

/// Notion 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    pub api_token: String,
    /// 普通请求超时（秒）
    pub request_timeout_secs: u64,
    /// 文件传输超时（秒）
    pub upload_timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            request_timeout_secs: 30,
            upload_timeout_secs: 300,
        }
    }
}

/// 持久化的配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PersistedCaptureConfig {
    #[serde(default)]
    pub capture: CaptureSettings,
    #[serde(default)]
    pub notion: NotionConfig,
}

/// 部分更新用的配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CaptureConfigUpdate {
    pub capture: Option<CaptureSettings>,
    pub notion: Option<NotionConfig>,
}
