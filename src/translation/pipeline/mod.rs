//! 翻译管道模块
//!
//! 文本收集、过滤和分批

pub mod batch;
pub mod collector;
pub mod filters;

pub use batch::{chunk_fragments, TranslationBatch};
pub use collector::{content_regions, TextExtractor, TextFragment};
pub use filters::TextFilter;
