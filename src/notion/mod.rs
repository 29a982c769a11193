// Notion 集成模块
// 把截图上传到 Notion 页面并设置封面

pub mod client;
pub mod upload;

pub use client::{FileUpload, NotionClient};
pub use upload::UploadCoordinator;

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// 远程工作区的文件上传能力
#[async_trait]
pub trait RemoteWorkspace: Send + Sync {
    /// 创建上传槽位
    async fn create_file_upload(&self, filename: &str, content_type: &str) -> Result<FileUpload>;

    /// 发送文件内容，返回槽位状态（成功时为 "uploaded"）
    async fn send_file_content(
        &self,
        file_upload_id: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<String>;

    /// 以图片块形式追加到页面末尾
    async fn attach_image_block(
        &self,
        page_id: &str,
        file_upload_id: &str,
        caption: &str,
    ) -> Result<()>;

    async fn set_page_cover(&self, page_id: &str, file_upload_id: &str) -> Result<()>;
}
