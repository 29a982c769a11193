use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::models::{CaptureConfigUpdate, PersistedCaptureConfig};

/// 覆盖空 token 的环境变量
pub const NOTION_TOKEN_ENV: &str = "NOTION_API_TOKEN";

pub struct SettingsManager {
    path: PathBuf,
    data: RwLock<PersistedCaptureConfig>,
}

impl SettingsManager {
    pub async fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let initial = match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => {
                serde_json::from_slice::<PersistedCaptureConfig>(&bytes).unwrap_or_else(|e| {
                    warn!("配置文件解析失败，使用默认配置: {}", e);
                    PersistedCaptureConfig::default()
                })
            }
            _ => {
                let default = PersistedCaptureConfig::default();
                let json = serde_json::to_string_pretty(&default)?;
                tokio::fs::write(&path, json).await?;
                info!("已创建默认配置: {:?}", path);
                default
            }
        };

        Ok(Self {
            path,
            data: RwLock::new(initial),
        })
    }

    /// 当前配置；token 为空时读取环境变量
    pub async fn get(&self) -> PersistedCaptureConfig {
        let mut config = self.data.read().await.clone();
        if config.notion.api_token.trim().is_empty() {
            if let Ok(token) = std::env::var(NOTION_TOKEN_ENV) {
                config.notion.api_token = token;
            }
        }
        config
    }

    pub async fn update(&self, update: CaptureConfigUpdate) -> Result<PersistedCaptureConfig> {
        let mut config = self.data.write().await;

        if let Some(capture) = update.capture {
            config.capture = capture;
        }
        if let Some(notion) = update.notion {
            config.notion = notion;
        }

        self.save(&config).await?;
        Ok(config.clone())
    }

    async fn save(&self, config: &PersistedCaptureConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}
