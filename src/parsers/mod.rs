//! # 解析器模块
//!
//! HTML 文档的解析、DOM 辅助操作与序列化。
//!
//! - `html` - HTML文档解析、DOM操作、序列化

pub mod html;

// Re-export commonly used items for convenience
pub use html::{html_to_dom, serialize_document};
