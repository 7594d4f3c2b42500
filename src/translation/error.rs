//! 翻译模块统一错误处理
//!
//! 翻译只是页面的增强功能：这里的所有错误都不会中断页面本身，
//! 默认语言的内容始终保持可见、可用。错误类型主要用于决定日志级别
//! 以及调用方是否应当跳过当前批次。

use std::fmt;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误（连接失败、请求无法发出等）
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 速率限制错误
    ///
    /// `server_signaled` 为真表示由翻译端点返回 HTTP 429，
    /// 否则为本地限流器拒绝。
    #[error("请求速率过快，已达到限制 (服务端信号: {server_signaled})")]
    RateLimitExceeded { server_signaled: bool },

    /// 翻译端点返回非 2xx 状态码
    #[error("翻译服务返回错误状态码: {status}")]
    ServerError { status: u16 },

    /// 翻译端点返回 `success: false` 或缺少译文
    #[error("翻译服务错误: {0}")]
    ServiceError(String),

    /// 用户主动取消
    #[error("翻译已被用户取消")]
    Aborted,

    /// 译文片段数量与请求片段数量不一致
    #[error("译文片段数量不匹配: 期望 {expected}，实际 {received}")]
    MalformedResponse { expected: usize, received: usize },

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 持久化存储错误（语言偏好读写）
    #[error("存储错误: {0}")]
    StorageError(String),

    /// 不支持的语言代码
    #[error("不支持的语言代码: '{0}'")]
    UnsupportedLanguage(String),

    /// 已有翻译任务正在进行
    #[error("已有翻译任务正在进行")]
    TranslationInProgress,

    /// 当前状态不允许该操作
    #[error("状态错误: {0}")]
    InvalidState(String),
}

impl TranslationError {
    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::NetworkError(_) => ErrorSeverity::Warning,
            TranslationError::RateLimitExceeded { .. } => ErrorSeverity::Warning,
            TranslationError::ServerError { .. } => ErrorSeverity::Error,
            TranslationError::ServiceError(_) => ErrorSeverity::Error,
            TranslationError::Aborted => ErrorSeverity::Info,
            TranslationError::MalformedResponse { .. } => ErrorSeverity::Warning,
            TranslationError::ParseError(_) => ErrorSeverity::Error,
            TranslationError::StorageError(_) => ErrorSeverity::Warning,
            TranslationError::UnsupportedLanguage(_) => ErrorSeverity::Info,
            TranslationError::TranslationInProgress => ErrorSeverity::Info,
            TranslationError::InvalidState(_) => ErrorSeverity::Info,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::NetworkError(_) => ErrorCategory::NetworkOrServer,
            TranslationError::RateLimitExceeded { .. } => ErrorCategory::RateLimit,
            TranslationError::ServerError { .. } => ErrorCategory::NetworkOrServer,
            TranslationError::ServiceError(_) => ErrorCategory::NetworkOrServer,
            TranslationError::Aborted => ErrorCategory::UserAborted,
            TranslationError::MalformedResponse { .. } => ErrorCategory::MalformedResponse,
            TranslationError::ParseError(_) => ErrorCategory::MalformedResponse,
            TranslationError::StorageError(_) => ErrorCategory::Storage,
            TranslationError::UnsupportedLanguage(_) => ErrorCategory::Input,
            TranslationError::TranslationInProgress => ErrorCategory::State,
            TranslationError::InvalidState(_) => ErrorCategory::State,
        }
    }

    /// 该错误是否应该对用户可见
    ///
    /// 速率限制、网络错误、用户取消与格式错误都只记录日志。
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Configuration | ErrorCategory::Input | ErrorCategory::State
        )
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        let new_msg = format!("{} (上下文: {})", self, context);

        match self {
            TranslationError::ConfigError(_) => TranslationError::ConfigError(new_msg),
            TranslationError::NetworkError(_) => TranslationError::NetworkError(new_msg),
            TranslationError::ServiceError(_) => TranslationError::ServiceError(new_msg),
            TranslationError::ParseError(_) => TranslationError::ParseError(new_msg),
            TranslationError::StorageError(_) => TranslationError::StorageError(new_msg),
            TranslationError::InvalidState(_) => TranslationError::InvalidState(new_msg),
            other => other,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    RateLimit,
    NetworkOrServer,
    UserAborted,
    MalformedResponse,
    Storage,
    Input,
    State,
}

/// 标准错误转换
impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::StorageError(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::ParseError(format!("JSON解析错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ConfigError(format!("TOML解析错误: {}", error))
    }
}

impl From<config::ConfigError> for TranslationError {
    fn from(error: config::ConfigError) -> Self {
        TranslationError::ConfigError(error.to_string())
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            if status.as_u16() == 429 {
                return TranslationError::RateLimitExceeded {
                    server_signaled: true,
                };
            }
            return TranslationError::ServerError {
                status: status.as_u16(),
            };
        }
        if error.is_decode() {
            return TranslationError::ParseError(format!("响应体解析失败: {}", error));
        }
        TranslationError::NetworkError(error.to_string())
    }
}

impl From<url::ParseError> for TranslationError {
    fn from(error: url::ParseError) -> Self {
        TranslationError::ConfigError(format!("无效的URL: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误
    pub fn log_error(error: &TranslationError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ConfigError(msg.to_string())
    }

    /// 创建存储错误
    pub fn storage_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::StorageError(msg.to_string())
    }
}
