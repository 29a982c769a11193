// 上传协调 - 逐个上传截图结果，单个失败只降级该结果

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::client::image_block;
use super::RemoteWorkspace;
use crate::error::{Error, Result};
use crate::models::{CaptureReport, CaptureResult, CaptureStrategy, ProjectCategory};
use crate::utils::validate_image_file;

/// 发送成功后槽位应处于的状态
const UPLOADED_STATUS: &str = "uploaded";

/// 手动上传结果的截图类型
const MANUAL_CAPTURE_TYPE: &str = "manual";

pub struct UploadCoordinator {
    workspace: Arc<dyn RemoteWorkspace>,
}

impl UploadCoordinator {
    pub fn new(workspace: Arc<dyn RemoteWorkspace>) -> Self {
        Self { workspace }
    }

    /// 校验 → 创建槽位 → 发送内容，返回上传 ID
    pub async fn upload_image(&self, path: &Path) -> Result<String> {
        let content_type = validate_image_file(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Validation(format!("文件名无效: {}", path.display())))?;

        let upload = self
            .workspace
            .create_file_upload(filename, content_type)
            .await?;
        let status = self
            .workspace
            .send_file_content(&upload.id, path, content_type)
            .await?;
        if status != UPLOADED_STATUS {
            return Err(Error::Upload(format!("文件状态异常: {}", status)));
        }

        Ok(upload.id)
    }

    /// 上传并以图片块追加到页面
    pub async fn upload_and_attach(&self, path: &Path, page_id: &str, caption: &str) -> Result<String> {
        let id = self.upload_image(path).await?;
        self.workspace
            .attach_image_block(page_id, &id, caption)
            .await?;
        Ok(id)
    }

    /// 上传所有成功且文件存在的结果，其余原样保留
    pub async fn upload_results(
        &self,
        results: Vec<CaptureResult>,
        page_id: &str,
    ) -> Vec<CaptureResult> {
        let mut uploaded = Vec::with_capacity(results.len());

        for mut result in results {
            if !result.is_uploadable() {
                uploaded.push(result);
                continue;
            }

            info!("📤 上传中: {}", result.caption);
            match self
                .upload_and_attach(&result.path, page_id, &result.caption)
                .await
            {
                Ok(id) => result.file_upload_id = Some(id),
                Err(e) => {
                    warn!("上传 {} 失败: {}", result.name, e);
                    result.success = false;
                    result.error = Some(format!("上传失败: {}", e));
                }
            }
            uploaded.push(result);
        }

        uploaded
    }

    /// 选择封面：优先 cover_from 指定的结果，否则取第一个已上传的
    pub fn select_cover<'a>(
        results: &'a [CaptureResult],
        cover_from: Option<&str>,
    ) -> Option<&'a CaptureResult> {
        let has_id = |r: &&CaptureResult| r.file_upload_id.is_some();

        cover_from
            .and_then(|name| results.iter().filter(has_id).find(|r| r.name == name))
            .or_else(|| results.iter().find(has_id))
    }

    /// 设置页面封面，失败只记录日志；返回使用的上传 ID
    pub async fn apply_cover(
        &self,
        results: &[CaptureResult],
        cover_from: Option<&str>,
        page_id: &str,
    ) -> Option<String> {
        let cover = Self::select_cover(results, cover_from)?;
        let id = cover.file_upload_id.clone()?;

        match self.workspace.set_page_cover(page_id, &id).await {
            Ok(()) => {
                info!("🖼 页面封面设置: {}", cover.caption);
                Some(id)
            }
            Err(e) => {
                warn!("封面设置失败: {}", e);
                None
            }
        }
    }

    /// 上传用户指定的图片；缺少说明时使用文件名
    pub async fn upload_manual_images(
        &self,
        paths: &[PathBuf],
        page_id: &str,
        captions: &[String],
    ) -> CaptureReport {
        let mut results = Vec::with_capacity(paths.len());

        for (i, path) in paths.iter().enumerate() {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let caption = captions.get(i).cloned().unwrap_or_else(|| stem.clone());

            let mut result = CaptureResult {
                name: stem,
                path: path.clone(),
                caption,
                capture_type: MANUAL_CAPTURE_TYPE.to_string(),
                success: true,
                file_upload_id: None,
                error: None,
            };

            match self.upload_and_attach(path, page_id, &result.caption).await {
                Ok(id) => result.file_upload_id = Some(id),
                Err(e) => {
                    warn!("手动上传 {:?} 失败: {}", path, e);
                    result.success = false;
                    result.error = Some(e.to_string());
                }
            }
            results.push(result);
        }

        CaptureReport::new(CaptureStrategy::new(ProjectCategory::Manual, None), results)
    }

    /// 已上传截图组成的页面区块：标题、分隔线、图片
    pub fn build_screenshot_section(shots: &[CaptureResult], title: &str) -> Vec<Value> {
        let mut blocks = vec![
            json!({
                "type": "heading_2",
                "heading_2": {
                    "rich_text": [{ "type": "text", "text": { "content": title } }]
                }
            }),
            json!({ "type": "divider", "divider": {} }),
        ];

        blocks.extend(shots.iter().filter_map(|shot| {
            shot.file_upload_id
                .as_deref()
                .map(|id| image_block(id, &shot.caption))
        }));

        blocks
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use crate::notion::FileUpload;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 记录所有调用；文件名或 ID 中包含触发词时返回错误
    #[derive(Default)]
    pub struct FakeWorkspace {
        pub calls: Mutex<Vec<String>>,
        /// 文件名包含该词时 attach 失败
        pub fail_attach_on: Option<String>,
        /// 发送后返回的状态，默认 uploaded
        pub send_status: Option<String>,
        pub fail_cover: bool,
    }

    impl FakeWorkspace {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, prefix: &str) -> usize {
            self.calls().iter().filter(|c| c.starts_with(prefix)).count()
        }
    }

    #[async_trait]
    impl RemoteWorkspace for FakeWorkspace {
        async fn create_file_upload(&self, filename: &str, content_type: &str) -> Result<FileUpload> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create {} {}", filename, content_type));
            Ok(FileUpload {
                id: format!("fu_{}", filename),
                upload_url: None,
                expiry_time: None,
            })
        }

        async fn send_file_content(&self, id: &str, _path: &Path, _ct: &str) -> Result<String> {
            self.calls.lock().unwrap().push(format!("send {}", id));
            Ok(self
                .send_status
                .clone()
                .unwrap_or_else(|| UPLOADED_STATUS.to_string()))
        }

        async fn attach_image_block(&self, page_id: &str, id: &str, caption: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("attach {} {} {}", page_id, id, caption));
            match &self.fail_attach_on {
                Some(word) if id.contains(word.as_str()) => {
                    Err(Error::Upload("添加图片块失败 (HTTP 400): validation_error".to_string()))
                }
                _ => Ok(()),
            }
        }

        async fn set_page_cover(&self, page_id: &str, id: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("cover {} {}", page_id, id));
            if self.fail_cover {
                return Err(Error::Upload("设置封面失败 (HTTP 500)".to_string()));
            }
            Ok(())
        }
    }
}
