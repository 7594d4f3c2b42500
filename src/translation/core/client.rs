//! 翻译客户端
//!
//! 把一组文本拼成一个批次，依次经过缓存、限流和可取消的 HTTP 请求。
//! 翻译只是增强功能，`translate_batch` 从不返回错误：所有失败都记录日志并
//! 以 [`BatchOutcome::Skipped`] 交还给调用方，页面保持原文。

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::{AbortHandle, AbortRegistration, Abortable, BoxFuture};
use serde::{Deserialize, Serialize};
use url::Url;

use super::rate_limit::RateLimiter;
use crate::translation::error::{helpers, TranslationError, TranslationResult};
use crate::translation::language::LanguageCode;
use crate::translation::pipeline::batch::TranslationBatch;
use crate::translation::storage::cache::TranslationCache;

/// `POST /api/translate` 请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub content: String,
    pub target_language: String,
    pub source_language: String,
}

/// `POST /api/translate` 响应体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranslateResponse {
    /// 取出译文，`success: false` 或缺少内容都视为服务错误
    pub fn into_content(self) -> TranslationResult<String> {
        if !self.success {
            return Err(TranslationError::ServiceError(
                self.error
                    .unwrap_or_else(|| "服务端返回 success: false".to_string()),
            ));
        }

        self.translated_content.ok_or_else(|| {
            TranslationError::ServiceError("响应中缺少 translatedContent".to_string())
        })
    }
}

/// 翻译请求的发送方式
pub trait TranslateTransport: Send + Sync {
    /// 发送一次请求，成功时返回 `translatedContent`
    fn send<'a>(&'a self, request: &'a TranslateRequest) -> BoxFuture<'a, TranslationResult<String>>;
}

/// 基于 reqwest 的 HTTP 传输
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(api_url: &str, timeout: Option<Duration>) -> TranslationResult<Self> {
        let endpoint = Url::parse(api_url)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(helpers::config_error(format!(
                "翻译端点只支持 http/https: {}",
                api_url
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| helpers::config_error(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post(&self, request: &TranslateRequest) -> TranslationResult<String> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(TranslationError::RateLimitExceeded {
                server_signaled: true,
            });
        }
        if !status.is_success() {
            return Err(TranslationError::ServerError {
                status: status.as_u16(),
            });
        }

        let body: TranslateResponse = response.json().await?;
        body.into_content()
    }
}

impl TranslateTransport for HttpTransport {
    fn send<'a>(&'a self, request: &'a TranslateRequest) -> BoxFuture<'a, TranslationResult<String>> {
        Box::pin(self.post(request))
    }
}

#[derive(Default)]
struct AbortInner {
    aborted: AtomicBool,
    in_flight: Mutex<Option<AbortHandle>>,
}

/// 可克隆的取消信号
///
/// `abort()` 设置取消标志并中止正在进行的请求。每一轮翻译开始时调用 `reset()`。
#[derive(Clone, Default)]
pub struct AbortSignal {
    inner: Arc<AbortInner>,
}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortSignal")
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.inner.aborted.store(true, Ordering::SeqCst);
        let handle = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            tracing::debug!("中止进行中的翻译请求");
            handle.abort();
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.inner.aborted.store(false, Ordering::SeqCst);
    }

    /// 为即将发出的请求登记中止句柄
    ///
    /// 在锁内检查取消标志，登记前到达的 `abort()` 不会丢失。
    pub fn register(&self) -> AbortRegistration {
        let (handle, registration) = AbortHandle::new_pair();
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.is_aborted() {
            handle.abort();
        } else {
            *in_flight = Some(handle);
        }
        registration
    }

    /// 请求结束后移除句柄
    pub fn clear(&self) {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// 批次被跳过的原因
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// 目标语言就是默认语言
    DefaultLanguage,
    Empty,
    TooSmall,
    /// 本地限流器拒绝
    RateLimited,
    /// 服务端返回 429
    ServerRateLimited,
    Aborted,
    Failed(TranslationError),
}

/// 一个批次的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Translated {
        translations: Vec<String>,
        from_cache: bool,
    },
    Skipped(SkipReason),
}

impl BatchOutcome {
    pub fn translations(&self) -> Option<&[String]> {
        match self {
            BatchOutcome::Translated { translations, .. } => Some(translations),
            BatchOutcome::Skipped(_) => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, BatchOutcome::Skipped(SkipReason::Aborted))
    }
}

/// 客户端统计
#[derive(Debug, Default)]
pub struct ClientStats {
    pub requests_sent: AtomicU64,
    pub cache_hits: AtomicU64,
    pub skipped: AtomicU64,
    pub failures: AtomicU64,
}

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStatsSnapshot {
    pub requests_sent: u64,
    pub cache_hits: u64,
    pub skipped: u64,
    pub failures: u64,
}

impl ClientStats {
    pub fn snapshot(&self) -> ClientStatsSnapshot {
        ClientStatsSnapshot {
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// 翻译客户端
pub struct TranslationClient {
    transport: Arc<dyn TranslateTransport>,
    limiter: Arc<RateLimiter>,
    cache: Arc<TranslationCache>,
    source_lang: String,
    stats: ClientStats,
}

impl TranslationClient {
    pub fn new(
        transport: Arc<dyn TranslateTransport>,
        limiter: Arc<RateLimiter>,
        cache: Arc<TranslationCache>,
        source_lang: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            limiter,
            cache,
            source_lang: source_lang.into(),
            stats: ClientStats::default(),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }

    /// 翻译一批文本
    pub async fn translate_batch(
        &self,
        texts: &[String],
        target: LanguageCode,
        signal: &AbortSignal,
    ) -> BatchOutcome {
        if target.is_default() {
            return self.skip(SkipReason::DefaultLanguage);
        }
        if texts.is_empty() {
            return self.skip(SkipReason::Empty);
        }

        let batch = TranslationBatch::new(texts, target);
        let cache_key = batch.cache_key();

        // 缓存命中不受限流影响
        if let Some(translations) = self.cache.get(&cache_key) {
            if translations.len() == batch.len() {
                self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                return BatchOutcome::Translated {
                    translations,
                    from_cache: true,
                };
            }
        }

        if batch.is_too_small() {
            return self.skip(SkipReason::TooSmall);
        }
        if signal.is_aborted() {
            return self.skip(SkipReason::Aborted);
        }
        if !self.limiter.can_make_request() {
            tracing::warn!("已达到请求上限，跳过 {} 段文本", batch.len());
            return self.skip(SkipReason::RateLimited);
        }

        self.limiter.record_request();
        self.stats.requests_sent.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "发送翻译请求: {} 段文本，{} 个字符，目标语言 {}",
            batch.len(),
            batch.payload().chars().count(),
            target
        );

        let request = TranslateRequest {
            content: batch.payload().to_string(),
            target_language: target.code().to_string(),
            source_language: self.source_lang.clone(),
        };

        let registration = signal.register();
        let result = Abortable::new(self.transport.send(&request), registration).await;
        signal.clear();

        match result {
            Err(futures::future::Aborted) | Ok(Err(TranslationError::Aborted)) => {
                tracing::info!("翻译请求已被取消");
                self.skip(SkipReason::Aborted)
            }
            Ok(Ok(content)) => match batch.split_response(&content) {
                Ok(translations) => {
                    self.cache.insert(cache_key, translations.clone());
                    BatchOutcome::Translated {
                        translations,
                        from_cache: false,
                    }
                }
                Err(error) => {
                    tracing::warn!("丢弃整个批次: {}", error);
                    self.fail(error)
                }
            },
            Ok(Err(TranslationError::RateLimitExceeded {
                server_signaled: true,
            })) => {
                self.limiter.saturate();
                self.skip(SkipReason::ServerRateLimited)
            }
            Ok(Err(error)) => {
                helpers::log_error(&error);
                self.fail(error)
            }
        }
    }

    fn skip(&self, reason: SkipReason) -> BatchOutcome {
        self.stats.skipped.fetch_add(1, Ordering::Relaxed);
        BatchOutcome::Skipped(reason)
    }

    fn fail(&self, error: TranslationError) -> BatchOutcome {
        self.stats.failures.fetch_add(1, Ordering::Relaxed);
        self.skip(SkipReason::Failed(error))
    }
}
