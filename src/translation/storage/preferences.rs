//! 语言偏好持久化
//!
//! 只保存一个键：用户选择的语言代码。启动时读取一次。

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::translation::error::{helpers, TranslationError, TranslationResult};

/// 持久化存储接口
pub trait PreferenceStore: Send + Sync {
    /// 读取保存的语言代码，未保存过时返回 `None`
    fn load_language(&self) -> TranslationResult<Option<String>>;

    /// 保存语言代码
    fn save_language(&self, code: &str) -> TranslationResult<()>;
}

/// 偏好文件内容
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPreferences {
    language: String,
    updated_at: DateTime<Utc>,
}

/// 基于 JSON 文件的偏好存储
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 从配置中的路径创建，支持 `~` 展开
    pub fn from_config_path(path: &str) -> Self {
        Self::new(shellexpand::tilde(path).to_string())
    }

    /// 平台默认位置，例如 `~/.config/bharatverse/preferences.json`
    pub fn default_location() -> Option<PathBuf> {
        directories::ProjectDirs::from("in", "BharatVerse", "bharatverse")
            .map(|dirs| dirs.config_dir().join("preferences.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load_language(&self) -> TranslationResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| TranslationError::from(e).with_context(self.path.display()))?;
        let stored: StoredPreferences = serde_json::from_str(&content)?;

        Ok(Some(stored.language))
    }

    fn save_language(&self, code: &str) -> TranslationResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                helpers::storage_error(format!("无法创建目录 {}: {}", parent.display(), e))
            })?;
        }

        let stored = StoredPreferences {
            language: code.to_string(),
            updated_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&self.path, content)
            .map_err(|e| TranslationError::from(e).with_context(self.path.display()))?;

        tracing::debug!("已保存语言偏好 {} 到 {}", code, self.path.display());
        Ok(())
    }
}

/// 内存偏好存储
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    language: Mutex<Option<String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(code: &str) -> Self {
        Self {
            language: Mutex::new(Some(code.to_string())),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load_language(&self) -> TranslationResult<Option<String>> {
        Ok(self
            .language
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    fn save_language(&self, code: &str) -> TranslationResult<()> {
        *self.language.lock().unwrap_or_else(|e| e.into_inner()) = Some(code.to_string());
        Ok(())
    }
}
