//! 页面翻译模块
//!
//! - **language**: 支持的语言与当前语言
//! - **dom**: 文本树抽象（html5ever 文档与内存树）
//! - **pipeline**: 文本收集、过滤和分批
//! - **core**: 限流、客户端、写回/还原与整页翻译状态机
//! - **storage**: 译文缓存与语言偏好持久化
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use bharatverse::parsers::html_to_dom;
//! use bharatverse::translation::{
//!     LanguageChange, LanguageCode, RcDomAdapter, TranslationConfig, TranslationService,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = TranslationService::from_config(&TranslationConfig::default())?;
//! let dom = RcDomAdapter::new(html_to_dom(b"<main><p>Hello</p></main>", "utf-8")?);
//!
//! let hindi = LanguageCode::from_code("hi")?;
//! if let LanguageChange::ConfirmationRequired { .. } = service.change_language(&dom, hindi)? {
//!     let report = service.confirm(&dom).await?;
//!     println!("翻译了 {} 段文本", report.fragments_translated);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod dom;
pub mod error;
pub mod language;
pub mod pipeline;
pub mod storage;

pub use config::{ConfigManager, TranslationConfig};
pub use self::core::{
    AbortSignal, BatchApplier, BatchOutcome, Clock, HttpTransport, LanguageChange, ManualClock,
    Pacer, PassOutcome, PassReport, RateLimiter, SkipReason, SystemClock, TokioPacer,
    TranslateTransport, TranslationClient, TranslationService, TranslationState,
};
pub use dom::{DomAdapter, MemoryTree, NodeId, NodeKind, RcDomAdapter};
pub use error::{TranslationError, TranslationResult};
pub use language::{LanguageCode, LanguageStore, TextDirection};
pub use pipeline::{content_regions, TextExtractor, TextFilter, TextFragment, TranslationBatch};
pub use storage::{
    FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, TranslationCache,
};
