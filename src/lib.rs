// 作品集截图工具 - 根据项目画像规划截图、启动应用、截图并发布到 Notion

// 声明模块
pub mod capture;
pub mod error;
pub mod launch;
pub mod logger;
pub mod manager;
pub mod models;
pub mod notion;
pub mod settings;
pub mod strategy;
pub mod utils;

// 重新导出常用类型
pub use error::{Error, Result};
pub use manager::CaptureManager;
pub use models::{
    CaptureItem, CaptureMethod, CaptureReport, CaptureResult, CaptureSettings, CaptureStrategy,
    NotionConfig, PersistedCaptureConfig, ProjectCategory, ProjectProfile, ProjectType,
};
pub use settings::SettingsManager;
pub use strategy::{determine_capture_strategy, format_capture_plan_preview};
