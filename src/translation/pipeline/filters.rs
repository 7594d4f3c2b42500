//! 文本过滤器模块
//!
//! 判断文本节点是否值得送去翻译

use std::sync::OnceLock;

use regex::Regex;

use crate::translation::config::constants;

/// 纯数字（可带一位小数部分）
///
/// 只认 ASCII 数字，天城文等其他文字的数字照常翻译。
fn numeric_regex() -> &'static Regex {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    NUMERIC.get_or_init(|| Regex::new(r"^[0-9]+(\.[0-9]+)?$").expect("numeric pattern is valid"))
}

/// 只由数字、空白和电话号码类标点组成
fn numeric_punctuation_regex() -> &'static Regex {
    static NUMERIC_PUNCT: OnceLock<Regex> = OnceLock::new();
    NUMERIC_PUNCT
        .get_or_init(|| Regex::new(r"^[0-9\s\-+().]+$").expect("punctuation pattern is valid"))
}

/// 文本过滤器
#[derive(Debug, Clone)]
pub struct TextFilter {
    min_length: usize,
    skip_tags: &'static [&'static str],
}

impl Default for TextFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFilter {
    pub fn new() -> Self {
        Self {
            min_length: constants::MIN_TEXT_LENGTH,
            skip_tags: constants::SKIP_ELEMENTS,
        }
    }

    /// 判断文本是否需要翻译
    ///
    /// 去掉首尾空白后至少两个字符，并且不是数字或纯数字标点组合。
    pub fn should_translate(&self, text: &str) -> bool {
        let trimmed = text.trim();

        // 按字符而不是字节计数，天城文等多字节文字同样适用
        if trimmed.chars().count() < self.min_length {
            return false;
        }

        if numeric_regex().is_match(trimmed) || numeric_punctuation_regex().is_match(trimmed) {
            return false;
        }

        true
    }

    /// 父元素是否属于不翻译的标签
    pub fn is_skipped_tag(&self, tag: &str) -> bool {
        self.skip_tags.iter().any(|skip| skip.eq_ignore_ascii_case(tag))
    }
}
