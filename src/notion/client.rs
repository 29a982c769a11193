// Notion API 客户端模块
// 负责文件上传（File Upload API）、图片块追加与页面封面设置

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, error, info};

use super::RemoteWorkspace;
use crate::error::{Error, Result};
use crate::models::NotionConfig;

const NOTION_API_VERSION: &str = "2022-06-28";
const NOTION_API_BASE: &str = "https://api.notion.com/v1";

/// 已创建的上传槽位
#[derive(Debug, Clone, Deserialize)]
pub struct FileUpload {
    pub id: String,
    #[serde(default)]
    pub upload_url: Option<String>,
    #[serde(default)]
    pub expiry_time: Option<DateTime<Utc>>,
}

/// 图片块，caption 为空时不带说明
pub fn image_block(file_upload_id: &str, caption: &str) -> Value {
    let caption = if caption.is_empty() {
        json!([])
    } else {
        json!([{ "type": "text", "text": { "content": caption } }])
    };

    json!({
        "type": "image",
        "image": {
            "type": "file_upload",
            "file_upload": { "id": file_upload_id },
            "caption": caption
        }
    })
}

/// 页面封面
pub fn cover_payload(file_upload_id: &str) -> Value {
    json!({
        "cover": {
            "type": "file_upload",
            "file_upload": { "id": file_upload_id }
        }
    })
}

/// Notion API 客户端
#[derive(Clone)]
pub struct NotionClient {
    config: NotionConfig,
    client: Client,
    /// 文件传输使用更长的超时
    upload_client: Client,
}

impl NotionClient {
    /// 创建新的 Notion 客户端
    pub fn new(config: NotionConfig) -> anyhow::Result<Self> {
        if config.api_token.is_empty() {
            return Err(anyhow!("Notion API Token 不能为空"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let upload_client = Client::builder()
            .timeout(Duration::from_secs(config.upload_timeout_secs))
            .build()?;

        Ok(Self {
            config,
            client,
            upload_client,
        })
    }

    fn request(&self, client: &Client, method: Method, path: &str) -> RequestBuilder {
        client
            .request(method, format!("{}{}", NOTION_API_BASE, path))
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .header("Notion-Version", NOTION_API_VERSION)
    }

    /// 非 2xx 响应转换为带正文的错误
    async fn check(response: Response, action: &str) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("{}失败 (HTTP {}): {}", action, status.as_u16(), error_text);
            return Err(Error::Upload(format!(
                "{}失败 (HTTP {}): {}",
                action,
                status.as_u16(),
                error_text
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl RemoteWorkspace for NotionClient {
    async fn create_file_upload(&self, filename: &str, content_type: &str) -> Result<FileUpload> {
        let payload = json!({
            "filename": filename,
            "content_type": content_type,
        });

        let response = self
            .request(&self.client, Method::POST, "/file_uploads")
            .json(&payload)
            .send()
            .await?;
        let body = Self::check(response, "创建 FileUpload").await?;

        let upload: FileUpload = serde_json::from_value(body)
            .map_err(|e| Error::Upload(format!("FileUpload 响应无法解析: {}", e)))?;
        debug!("FileUpload 创建成功，ID: {}", upload.id);
        Ok(upload)
    }

    async fn send_file_content(
        &self,
        file_upload_id: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<String> {
        let file_bytes = fs::read(path)
            .await
            .map_err(|e| Error::Upload(format!("读取文件失败 {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        let part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .request(
                &self.upload_client,
                Method::POST,
                &format!("/file_uploads/{}/send", file_upload_id),
            )
            .multipart(form)
            .send()
            .await?;
        let body = Self::check(response, "文件传输").await?;

        let status = body["status"].as_str().unwrap_or("unknown").to_string();
        debug!("文件传输完成: {} ({})", file_upload_id, status);
        Ok(status)
    }

    async fn attach_image_block(
        &self,
        page_id: &str,
        file_upload_id: &str,
        caption: &str,
    ) -> Result<()> {
        let payload = json!({ "children": [image_block(file_upload_id, caption)] });

        let response = self
            .request(
                &self.client,
                Method::PATCH,
                &format!("/blocks/{}/children", page_id),
            )
            .json(&payload)
            .send()
            .await?;
        Self::check(response, "添加图片块").await?;

        info!("图片已添加到页面 {}: {}", page_id, caption);
        Ok(())
    }

    async fn set_page_cover(&self, page_id: &str, file_upload_id: &str) -> Result<()> {
        let response = self
            .request(&self.client, Method::PATCH, &format!("/pages/{}", page_id))
            .json(&cover_payload(file_upload_id))
            .send()
            .await?;
        Self::check(response, "设置封面").await?;

        info!("页面封面已设置: {}", page_id);
        Ok(())
    }
}
