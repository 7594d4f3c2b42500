//! 简化的配置管理器
//!
//! 配置按以下顺序叠加：默认值 → 第一个存在的配置文件 → `.env` 文件 → 环境变量

use std::path::Path;
use std::time::Duration;

use config::{Config, File};
use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 基础配置
    pub api_url: String,
    pub source_lang: String,

    // 速率限制
    pub max_requests_per_window: u32,
    pub rate_window_secs: u64,
    pub pacing_delay_ms: u64,

    // 批次配置
    pub max_batch_chars: usize,

    // 缓存配置
    pub cache_capacity: usize,

    // DOM
    pub marker_attribute: String,

    // 持久化
    pub preferences_path: Option<String>,

    /// 单个请求的超时时间；未设置时仅依赖取消机制
    pub request_timeout_secs: Option<u64>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            source_lang: constants::DEFAULT_LANGUAGE.to_string(),

            max_requests_per_window: constants::MAX_REQUESTS_PER_WINDOW,
            rate_window_secs: constants::RATE_WINDOW.as_secs(),
            pacing_delay_ms: constants::PACING_DELAY.as_millis() as u64,

            max_batch_chars: constants::MAX_BATCH_CHARS,

            cache_capacity: constants::DEFAULT_CACHE_CAPACITY,

            marker_attribute: constants::MARKER_ATTRIBUTE.to_string(),

            preferences_path: None,
            request_timeout_secs: None,
        }
    }
}

impl TranslationConfig {
    /// 创建指向指定端点的默认配置
    pub fn with_api_url(api_url: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            ..Self::default()
        }
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        let url = url::Url::parse(&self.api_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(TranslationError::ConfigError(format!(
                "API URL 必须使用 http 或 https: {}",
                self.api_url
            )));
        }

        if self.max_requests_per_window == 0 {
            return Err(TranslationError::ConfigError("窗口内最大请求数不能为0".to_string()));
        }

        if self.rate_window_secs == 0 {
            return Err(TranslationError::ConfigError("速率窗口不能为0".to_string()));
        }

        if self.max_batch_chars == 0 {
            return Err(TranslationError::ConfigError("批次大小不能为0".to_string()));
        }

        if self.cache_capacity == 0 {
            return Err(TranslationError::ConfigError("缓存容量不能为0".to_string()));
        }

        if self.marker_attribute.trim().is_empty() || self.marker_attribute.contains(' ') {
            return Err(TranslationError::ConfigError(format!(
                "无效的标记属性名: '{}'",
                self.marker_attribute
            )));
        }

        Ok(())
    }

    /// 应用环境变量覆盖（使用类型安全环境变量系统）
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{translation, EnvVar};

        if let Some(api_url) = translation::ApiUrl::get_if_set() {
            self.api_url = api_url;
            tracing::info!("环境变量覆盖 API URL: {}", self.api_url);
        }

        if let Some(max_requests) = translation::MaxRequestsPerWindow::get_if_set() {
            self.max_requests_per_window = max_requests;
        }

        if let Some(delay) = translation::PacingDelay::get_if_set() {
            self.pacing_delay_ms = delay.as_millis() as u64;
        }

        if let Some(max_chars) = translation::MaxBatchChars::get_if_set() {
            self.max_batch_chars = max_chars;
        }

        if let Some(capacity) = translation::CacheCapacity::get_if_set() {
            self.cache_capacity = capacity;
        }

        if let Some(path) = translation::PreferencesPath::get_if_set() {
            self.preferences_path = Some(path);
        }
    }

    /// 转换为Duration类型
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window_secs)
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
    source: Option<String>,
}

impl ConfigManager {
    /// 按默认搜索路径加载配置
    pub fn load() -> TranslationResult<Self> {
        Self::load_dotenv();

        let path = constants::CONFIG_PATHS
            .iter()
            .map(|path| shellexpand::tilde(path).to_string())
            .find(|path| Path::new(path).exists());

        match &path {
            Some(path) => tracing::info!("加载配置文件: {}", path),
            None => tracing::info!("未找到配置文件，使用默认配置"),
        }

        Self::build(path)
    }

    /// 从指定文件加载配置
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        let expanded = shellexpand::tilde(path).to_string();
        if !Path::new(&expanded).exists() {
            return Err(TranslationError::ConfigError(format!(
                "配置文件不存在: {}",
                expanded
            )));
        }

        Self::load_dotenv();
        Self::build(Some(expanded))
    }

    fn build(path: Option<String>) -> TranslationResult<Self> {
        let mut builder =
            Config::builder().add_source(Config::try_from(&TranslationConfig::default())?);

        if let Some(path) = &path {
            builder = builder.add_source(File::with_name(path));
        }

        let mut config: TranslationConfig = builder.build()?.try_deserialize()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self {
            config,
            source: path,
        })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 消耗管理器并返回配置
    pub fn into_config(self) -> TranslationConfig {
        self.config
    }

    /// 实际加载的配置文件路径
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = TranslationConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TranslationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_requests_per_window, 10);
        assert_eq!(config.rate_window(), Duration::from_secs(60));
        assert_eq!(config.pacing_delay(), Duration::from_millis(1000));
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TranslationConfig::with_api_url("ftp://example.com/translate");
        assert!(config.validate().is_err());

        config = TranslationConfig::with_api_url("not a url");
        assert!(config.validate().is_err());

        config = TranslationConfig::default();
        config.max_requests_per_window = 0;
        assert!(config.validate().is_err());

        config = TranslationConfig::default();
        config.marker_attribute = "data original".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bharatverse.toml");
        std::fs::write(
            &path,
            "api_url = \"https://shop.example.in/api/translate\"\npacing_delay_ms = 250\n",
        )
        .unwrap();

        let manager = ConfigManager::from_file(path.to_str().unwrap()).unwrap();
        let config = manager.get_config();

        assert_eq!(config.pacing_delay_ms, 250);
        // 未在文件中出现的字段保持默认值
        assert_eq!(config.cache_capacity, constants::DEFAULT_CACHE_CAPACITY);
        assert_eq!(manager.source(), path.to_str());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = ConfigManager::from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(TranslationError::ConfigError(_))));
    }

    #[test]
    fn test_generate_example_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.toml");
        ConfigManager::generate_example_config(path.to_str().unwrap()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: TranslationConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed, TranslationConfig::default());
    }
}
