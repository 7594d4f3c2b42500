//! 翻译缓存模块
//!
//! 以批次为单位缓存译文：键是批次内容与目标语言的摘要，值是按顺序排列的译文。
//! 只存在于内存中，会话结束即丢弃。

use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use lru::LruCache;

use crate::translation::config::constants;

/// 缓存统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    /// 命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheInner {
    entries: LruCache<String, Vec<String>>,
    stats: CacheStats,
}

/// 翻译缓存
pub struct TranslationCache {
    inner: Mutex<CacheInner>,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::with_capacity(constants::DEFAULT_CACHE_CAPACITY)
    }

    /// 指定容量（批次数），0 按 1 处理
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
        }
    }

    /// 查找缓存，命中时刷新最近使用顺序
    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let found = inner.entries.get(key).cloned();

        match found {
            Some(translations) => {
                inner.stats.hits += 1;
                tracing::debug!("缓存命中: {}", &key[..key.len().min(12)]);
                Some(translations)
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&self, key: String, translations: Vec<String>) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.stats.insertions += 1;

        if let Some((evicted, _)) = inner.entries.push(key.clone(), translations) {
            // push 在键已存在时返回旧值，此时不算驱逐
            if evicted != key {
                inner.stats.evictions += 1;
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        CacheStats {
            entries: inner.entries.len(),
            ..inner.stats.clone()
        }
    }
}
