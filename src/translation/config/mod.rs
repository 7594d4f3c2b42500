//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 语言
    pub const DEFAULT_LANGUAGE: &str = "en";

    // 批次处理相关
    pub const TEXT_SEPARATOR: &str = "\n---TEXT_SEPARATOR---\n";
    pub const SEPARATOR_MARKER: &str = "---TEXT_SEPARATOR---";
    pub const MAX_BATCH_CHARS: usize = 9000;

    // 文本过滤相关
    pub const MIN_TEXT_LENGTH: usize = 2;
    pub const MIN_PAYLOAD_LENGTH: usize = 3;

    // 速率限制
    pub const MAX_REQUESTS_PER_WINDOW: u32 = 10;
    pub const RATE_WINDOW: Duration = Duration::from_secs(60);

    // 区域之间的节流间隔
    pub const PACING_DELAY: Duration = Duration::from_millis(1000);

    // 默认API设置
    pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/translate";

    // 缓存设置（按批次计）
    pub const DEFAULT_CACHE_CAPACITY: usize = 500;

    /// 记录译前原文的属性名，只供本模块使用
    pub const MARKER_ATTRIBUTE: &str = "data-bharatverse-original";

    /// 按固定顺序翻译的内容区域
    pub const REGION_TAGS: &[&str] = &["nav", "header", "main", "article", "section", "footer"];

    // 跳过的元素
    pub const SKIP_ELEMENTS: &[&str] = &["script", "style", "noscript", "meta", "link", "title"];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "bharatverse.toml",
        "translation-config.toml",
        "~/.config/bharatverse/translation.toml",
    ];
}
