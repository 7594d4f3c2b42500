//! # BharatVerse
//!
//! 市场页面的按需翻译：把页面上可见的文本按区域分批送到翻译端点，
//! 写回译文并保留原文，随时可以切回默认语言。
//!
//! ## 模块组织
//!
//! - `translation` - 语言状态、文本提取、限流、缓存、客户端和整页翻译流程
//! - `parsers` - HTML 解析与序列化
//! - `env` - 类型安全的环境变量

pub mod env;
pub mod parsers;
pub mod translation;
