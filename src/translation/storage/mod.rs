//! 存储模块
//!
//! 会话内的译文缓存和持久化的语言偏好。

pub mod cache;
pub mod preferences;

pub use cache::{CacheStats, TranslationCache};
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
