//! 翻译批次
//!
//! 一个区域（或区域的一段）的全部文本用固定分隔符拼接成一次请求，
//! 响应再按同一个分隔符拆回去，要求片段数与请求数一致。

use crate::translation::config::constants;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::language::LanguageCode;
use crate::translation::pipeline::collector::TextFragment;

/// 翻译批次
#[derive(Debug, Clone)]
pub struct TranslationBatch {
    texts: Vec<String>,
    target: LanguageCode,
    payload: String,
}

impl TranslationBatch {
    pub fn new(texts: &[String], target: LanguageCode) -> Self {
        Self {
            texts: texts.to_vec(),
            target,
            payload: texts.join(constants::TEXT_SEPARATOR),
        }
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn target(&self) -> LanguageCode {
        self.target
    }

    /// 拼接后的请求内容
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// 缓存键：请求内容与目标语言的 blake3 摘要
    pub fn cache_key(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.payload.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.target.code().as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    /// 内容过短，不值得发请求
    pub fn is_too_small(&self) -> bool {
        self.payload.trim().chars().count() < constants::MIN_PAYLOAD_LENGTH
    }

    /// 拆分服务端返回的内容
    ///
    /// 服务端可能吞掉分隔符两侧的换行，所以按裸标记拆分，再去掉每段的首尾空白。
    pub fn split_response(&self, content: &str) -> TranslationResult<Vec<String>> {
        let pieces: Vec<String> = content
            .split(constants::SEPARATOR_MARKER)
            .map(|piece| piece.trim().to_string())
            .collect();

        if pieces.len() != self.texts.len() {
            return Err(TranslationError::MalformedResponse {
                expected: self.texts.len(),
                received: pieces.len(),
            });
        }

        Ok(pieces)
    }
}

/// 把一个区域的片段切成若干连续的块，每块拼接后的长度不超过 `max_chars`
///
/// 单个片段本身超长时独占一块。顺序保持不变。
pub fn chunk_fragments<N>(fragments: &[TextFragment<N>], max_chars: usize) -> Vec<&[TextFragment<N>]> {
    let separator_len = constants::TEXT_SEPARATOR.chars().count();
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut current_len = 0;

    for (index, fragment) in fragments.iter().enumerate() {
        let text_len = fragment.text().chars().count();
        let added = if index == start {
            text_len
        } else {
            separator_len + text_len
        };

        if index > start && current_len + added > max_chars {
            chunks.push(&fragments[start..index]);
            start = index;
            current_len = text_len;
        } else {
            current_len += added;
        }
    }

    if start < fragments.len() {
        chunks.push(&fragments[start..]);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hindi() -> LanguageCode {
        LanguageCode::from_code("hi").unwrap()
    }

    fn fragments(texts: &[&str]) -> Vec<TextFragment<usize>> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| TextFragment {
                node: i,
                parent: i,
                original: text.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_payload_and_split() {
        let batch = TranslationBatch::new(&["Hello".to_string(), "World".to_string()], hindi());
        assert_eq!(batch.payload(), "Hello\n---TEXT_SEPARATOR---\nWorld");

        let pieces = batch
            .split_response("नमस्ते ---TEXT_SEPARATOR--- दुनिया\n")
            .unwrap();
        assert_eq!(pieces, vec!["नमस्ते", "दुनिया"]);
    }

    #[test]
    fn test_split_count_mismatch() {
        let batch = TranslationBatch::new(&["Hello".to_string(), "World".to_string()], hindi());
        let err = batch.split_response("नमस्ते दुनिया").unwrap_err();
        assert_eq!(
            err,
            TranslationError::MalformedResponse {
                expected: 2,
                received: 1
            }
        );
    }

    #[test]
    fn test_cache_key_depends_on_language() {
        let texts = vec!["Hello".to_string()];
        let hi = TranslationBatch::new(&texts, hindi());
        let ta = TranslationBatch::new(&texts, LanguageCode::from_code("ta").unwrap());
        assert_eq!(hi.cache_key(), TranslationBatch::new(&texts, hindi()).cache_key());
        assert_ne!(hi.cache_key(), ta.cache_key());
    }

    #[test]
    fn test_too_small() {
        assert!(TranslationBatch::new(&["ab".to_string()], hindi()).is_too_small());
        assert!(TranslationBatch::new(&[" ab ".to_string()], hindi()).is_too_small());
        assert!(!TranslationBatch::new(&["abc".to_string()], hindi()).is_too_small());
    }

    #[test]
    fn test_chunking_keeps_order_and_limit() {
        let items = fragments(&["aaaa", "bbbb", "cccc", "dddd"]);
        // 分隔符长 22 个字符，4 + 22 + 4 = 30
        let chunks = chunk_fragments(&items, 30);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 2);
        assert_eq!(chunks[1].len(), 2);
        assert_eq!(chunks[1][0].text(), "cccc");

        let single = chunk_fragments(&items, 10_000);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].len(), 4);
    }

    #[test]
    fn test_chunking_oversized_fragment() {
        let long = "x".repeat(50);
        let items = fragments(&["short", &long, "tail"]);
        let chunks = chunk_fragments(&items, 20);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![1, 1, 1]);
        assert!(chunk_fragments::<usize>(&[], 20).is_empty());
    }
}
