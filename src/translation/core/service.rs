//! 翻译服务：语言状态机与整页翻译流程
//!
//! 切换到非默认语言需要先确认；确认后按固定顺序逐个区域翻译，区域之间
//! 固定等待一段时间以配合限流。切回默认语言时直接还原整页，不需要确认。
//!
//! ```text
//! Idle(default) ──change_language(L)──▶ PendingConfirmation ──confirm──▶ Translating(L)
//!      ▲                                     │ decline                      │
//!      │                                     ▼                              ├─ 完成 ─▶ Translated(L)
//!      └──────── change_language(default)：整页还原 ◀────────────────────────┴─ 取消 ─▶ Idle(原语言)
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::client::{AbortSignal, BatchOutcome, HttpTransport, SkipReason, TranslationClient};
use super::clock::{Clock, Pacer, SystemClock, TokioPacer};
use super::engine::BatchApplier;
use super::rate_limit::RateLimiter;
use crate::translation::config::{constants, TranslationConfig};
use crate::translation::dom::DomAdapter;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::language::{LanguageCode, LanguageStore};
use crate::translation::pipeline::batch::chunk_fragments;
use crate::translation::pipeline::collector::{content_regions, TextExtractor, TextFragment};
use crate::translation::storage::cache::TranslationCache;
use crate::translation::storage::preferences::{
    FilePreferenceStore, MemoryPreferenceStore, PreferenceStore,
};

/// 翻译状态
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationState {
    /// 页面显示 `language`，没有进行中的翻译
    Idle { language: LanguageCode },
    /// 等待用户确认切换到 `to`
    PendingConfirmation {
        from: Box<TranslationState>,
        to: LanguageCode,
    },
    Translating { language: LanguageCode },
    Translated { language: LanguageCode },
}

impl TranslationState {
    /// 页面当前显示的语言
    pub fn displayed_language(&self) -> LanguageCode {
        match self {
            TranslationState::Idle { language }
            | TranslationState::Translating { language }
            | TranslationState::Translated { language } => *language,
            TranslationState::PendingConfirmation { from, .. } => from.displayed_language(),
        }
    }

    pub fn is_translating(&self) -> bool {
        matches!(self, TranslationState::Translating { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TranslationState::PendingConfirmation { .. })
    }
}

impl Default for TranslationState {
    fn default() -> Self {
        TranslationState::Idle {
            language: LanguageCode::default(),
        }
    }
}

/// `change_language` 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageChange {
    /// 与当前语言相同，没有变化
    Unchanged,
    /// 切回默认语言，已还原 `elements` 个元素
    Reverted { elements: usize },
    /// 需要用户确认后调用 `confirm`
    ConfirmationRequired { target: LanguageCode },
}

/// 一轮翻译的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Completed,
    Aborted,
}

/// 一轮整页翻译的汇总
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub language: LanguageCode,
    pub regions_total: usize,
    pub regions_translated: usize,
    pub fragments_translated: usize,
    pub batches_skipped: usize,
    pub outcome: PassOutcome,
}

impl PassReport {
    fn new(language: LanguageCode, regions_total: usize) -> Self {
        Self {
            language,
            regions_total,
            regions_translated: 0,
            fragments_translated: 0,
            batches_skipped: 0,
            outcome: PassOutcome::Completed,
        }
    }
}

/// 服务运行统计
#[derive(Debug, Default)]
pub struct ServiceStats {
    pub passes_started: AtomicU64,
    pub passes_completed: AtomicU64,
    pub passes_aborted: AtomicU64,
    pub fragments_translated: AtomicU64,
    pub elements_reverted: AtomicU64,
}

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStatsSnapshot {
    pub passes_started: u64,
    pub passes_completed: u64,
    pub passes_aborted: u64,
    pub fragments_translated: u64,
    pub elements_reverted: u64,
}

impl ServiceStats {
    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        ServiceStatsSnapshot {
            passes_started: self.passes_started.load(Ordering::Relaxed),
            passes_completed: self.passes_completed.load(Ordering::Relaxed),
            passes_aborted: self.passes_aborted.load(Ordering::Relaxed),
            fragments_translated: self.fragments_translated.load(Ordering::Relaxed),
            elements_reverted: self.elements_reverted.load(Ordering::Relaxed),
        }
    }
}

/// 一个区域（或子树）的翻译结果
#[derive(Debug, Default)]
struct SubtreeResult {
    fragments_translated: usize,
    batches_skipped: usize,
    aborted: bool,
}

/// 单次翻译的占用标记
///
/// 离开作用域时（包括翻译 future 被中途丢弃）写入结束状态并释放占用。
struct FlightGuard<'a> {
    service: &'a TranslationService,
    on_exit: TranslationState,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        // 翻译途中切回了默认语言，页面已经还原
        let exit = if self.service.revert_requested.swap(false, Ordering::SeqCst) {
            TranslationState::default()
        } else {
            std::mem::take(&mut self.on_exit)
        };
        *self.service.lock_state() = exit;
        self.service.in_flight.store(false, Ordering::SeqCst);
    }
}

/// 翻译服务
pub struct TranslationService {
    client: TranslationClient,
    applier: BatchApplier,
    extractor: TextExtractor,
    languages: LanguageStore,
    pacer: Arc<dyn Pacer>,
    signal: AbortSignal,
    state: Mutex<TranslationState>,
    in_flight: AtomicBool,
    revert_requested: AtomicBool,
    pacing_delay: Duration,
    max_batch_chars: usize,
    stats: ServiceStats,
}

impl TranslationService {
    pub fn new(client: TranslationClient, languages: LanguageStore, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            client,
            applier: BatchApplier::default(),
            extractor: TextExtractor::new(),
            languages,
            pacer,
            signal: AbortSignal::new(),
            state: Mutex::new(TranslationState::default()),
            in_flight: AtomicBool::new(false),
            revert_requested: AtomicBool::new(false),
            pacing_delay: constants::PACING_DELAY,
            max_batch_chars: constants::MAX_BATCH_CHARS,
            stats: ServiceStats::default(),
        }
    }

    /// 按配置组装：HTTP 传输、系统时钟、tokio 定时器和文件偏好存储
    pub fn from_config(config: &TranslationConfig) -> TranslationResult<Self> {
        config.validate()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        let limiter = Arc::new(RateLimiter::new(
            config.max_requests_per_window,
            config.rate_window(),
            clock,
        ));
        let transport = Arc::new(HttpTransport::new(
            &config.api_url,
            config.request_timeout(),
        )?);
        let cache = Arc::new(TranslationCache::with_capacity(config.cache_capacity));
        let client = TranslationClient::new(transport, limiter, cache, config.source_lang.clone());

        let preferences: Box<dyn PreferenceStore> = match &config.preferences_path {
            Some(path) => Box::new(FilePreferenceStore::from_config_path(path)),
            None => match FilePreferenceStore::default_location() {
                Some(path) => Box::new(FilePreferenceStore::new(path)),
                None => {
                    tracing::warn!("无法确定配置目录，语言偏好只保存在内存中");
                    Box::new(MemoryPreferenceStore::new())
                }
            },
        };

        Ok(Self::new(client, LanguageStore::new(preferences), Arc::new(TokioPacer))
            .with_pacing_delay(config.pacing_delay())
            .with_max_batch_chars(config.max_batch_chars)
            .with_applier(BatchApplier::new(config.marker_attribute.clone())))
    }

    pub fn with_pacing_delay(mut self, delay: Duration) -> Self {
        self.pacing_delay = delay;
        self
    }

    pub fn with_max_batch_chars(mut self, max_chars: usize) -> Self {
        self.max_batch_chars = max_chars.max(1);
        self
    }

    pub fn with_applier(mut self, applier: BatchApplier) -> Self {
        self.applier = applier;
        self
    }

    pub fn with_extractor(mut self, extractor: TextExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    fn lock_state(&self) -> MutexGuard<'_, TranslationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> TranslationState {
        self.lock_state().clone()
    }

    /// 页面当前显示的语言
    pub fn current_language(&self) -> LanguageCode {
        self.lock_state().displayed_language()
    }

    /// 持久化的语言偏好
    pub fn preferred_language(&self) -> LanguageCode {
        self.languages.current()
    }

    /// 启动时读取保存的语言偏好，只返回偏好，不触发翻译
    pub fn restore(&self) -> LanguageCode {
        self.languages.restore()
    }

    pub fn is_translating(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) || self.lock_state().is_translating()
    }

    pub fn client(&self) -> &TranslationClient {
        &self.client
    }

    pub fn applier(&self) -> &BatchApplier {
        &self.applier
    }

    pub fn stats(&self) -> &ServiceStats {
        &self.stats
    }

    /// 共享的取消信号
    pub fn abort_signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// 取消当前翻译：停止后续区域并中止进行中的请求
    pub fn abort(&self) {
        if self.is_translating() {
            tracing::info!("用户取消翻译");
        }
        self.signal.abort();
    }

    /// 请求切换语言
    ///
    /// 切回默认语言不需要确认，无论当前处于什么状态都会还原整页；
    /// 有翻译正在进行时先取消它。
    pub fn change_language<D: DomAdapter>(
        &self,
        dom: &D,
        target: LanguageCode,
    ) -> TranslationResult<LanguageChange> {
        let mut state = self.lock_state();
        let in_flight = self.in_flight.load(Ordering::SeqCst) || state.is_translating();

        if target.is_default() {
            if in_flight {
                tracing::info!("翻译进行中切回默认语言，取消当前翻译");
                self.revert_requested.store(true, Ordering::SeqCst);
                self.signal.abort();
            }

            let was_default = state.displayed_language().is_default();
            let elements = self.applier.revert(dom, &dom.root());
            *state = TranslationState::Idle { language: target };
            drop(state);

            self.languages.set_current(target);
            if elements == 0 && was_default && !in_flight {
                return Ok(LanguageChange::Unchanged);
            }

            self.stats
                .elements_reverted
                .fetch_add(elements as u64, Ordering::Relaxed);
            tracing::info!("已切回默认语言，还原 {} 个元素", elements);
            return Ok(LanguageChange::Reverted { elements });
        }

        if in_flight {
            return Err(TranslationError::TranslationInProgress);
        }

        if target == state.displayed_language() {
            if let TranslationState::PendingConfirmation { from, .. } = &*state {
                let previous = (**from).clone();
                *state = previous;
            }
            return Ok(LanguageChange::Unchanged);
        }

        let previous = match &*state {
            TranslationState::PendingConfirmation { from, .. } => (**from).clone(),
            other => other.clone(),
        };
        *state = TranslationState::PendingConfirmation {
            from: Box::new(previous),
            to: target,
        };

        tracing::debug!("等待确认切换到 {}", target);
        Ok(LanguageChange::ConfirmationRequired { target })
    }

    /// 用户拒绝切换，回到之前的状态
    pub fn decline(&self) -> TranslationResult<()> {
        let mut state = self.lock_state();
        match &*state {
            TranslationState::PendingConfirmation { from, .. } => {
                let previous = (**from).clone();
                *state = previous;
                Ok(())
            }
            other => Err(TranslationError::InvalidState(format!(
                "没有等待确认的语言切换: {:?}",
                other
            ))),
        }
    }

    /// 用户确认切换，执行整页翻译
    pub async fn confirm<D: DomAdapter>(&self, dom: &D) -> TranslationResult<PassReport> {
        let (target, prior) = {
            let mut state = self.lock_state();
            let TranslationState::PendingConfirmation { from, to } = &*state else {
                return Err(TranslationError::InvalidState(format!(
                    "没有等待确认的语言切换: {:?}",
                    *state
                )));
            };
            let (target, prior) = (*to, from.displayed_language());

            if self.in_flight.swap(true, Ordering::SeqCst) {
                return Err(TranslationError::TranslationInProgress);
            }
            *state = TranslationState::Translating { language: target };
            (target, prior)
        };

        let mut guard = FlightGuard {
            service: self,
            on_exit: TranslationState::Idle { language: prior },
        };

        self.signal.reset();
        self.revert_requested.store(false, Ordering::SeqCst);
        self.stats.passes_started.fetch_add(1, Ordering::Relaxed);
        tracing::info!("开始翻译整页: {} -> {}", prior, target);

        // 从原文开始翻译，清掉之前的译文（包括被取消的那一轮留下的）
        let reverted = self.applier.revert(dom, &dom.root());
        if reverted > 0 {
            tracing::debug!("翻译前还原了 {} 个元素", reverted);
        }

        let regions = content_regions(dom, &dom.root());
        let mut report = PassReport::new(target, regions.len());
        let last = regions.len().saturating_sub(1);

        for (index, region) in regions.iter().enumerate() {
            if self.signal.is_aborted() {
                report.outcome = PassOutcome::Aborted;
                break;
            }

            let fragments = self.pending_fragments(dom, region);
            if fragments.is_empty() {
                continue;
            }

            let result = self.translate_fragments(dom, &fragments, target).await;
            report.fragments_translated += result.fragments_translated;
            report.batches_skipped += result.batches_skipped;
            if result.fragments_translated > 0 {
                report.regions_translated += 1;
            }

            if result.aborted {
                report.outcome = PassOutcome::Aborted;
                break;
            }

            if index < last && !self.signal.is_aborted() {
                tracing::debug!("区域间等待 {:?}", self.pacing_delay);
                self.pacer.pause(self.pacing_delay).await;
            }
        }

        if report.outcome == PassOutcome::Aborted || self.signal.is_aborted() {
            report.outcome = PassOutcome::Aborted;
            self.stats.passes_aborted.fetch_add(1, Ordering::Relaxed);
            tracing::info!(
                "翻译已取消：{}/{} 个区域已翻译，保留现有译文",
                report.regions_translated,
                report.regions_total
            );
        } else {
            guard.on_exit = TranslationState::Translated { language: target };
            self.languages.set_current(target);
            self.stats.passes_completed.fetch_add(1, Ordering::Relaxed);
            tracing::info!(
                "翻译完成: {} 个区域，{} 段文本，跳过 {} 个批次",
                report.regions_translated,
                report.fragments_translated,
                report.batches_skipped
            );
        }

        self.stats
            .fragments_translated
            .fetch_add(report.fragments_translated as u64, Ordering::Relaxed);
        drop(guard);
        Ok(report)
    }

    /// 把一个子树翻译成当前已翻译的语言，返回写入的文本节点数
    ///
    /// 页面处于默认语言时什么都不做。已带标记的元素不会再次翻译。
    pub async fn translate_region<D: DomAdapter>(
        &self,
        dom: &D,
        root: &D::Node,
    ) -> TranslationResult<usize> {
        let target = match self.state() {
            TranslationState::Translated { language } => language,
            TranslationState::Translating { .. } => {
                return Err(TranslationError::TranslationInProgress)
            }
            _ => return Ok(0),
        };

        let fragments = self.pending_fragments(dom, root);
        if fragments.is_empty() {
            return Ok(0);
        }
        // 没有整页翻译在进行，清掉上一次取消留下的标志
        self.signal.reset();

        let result = self.translate_fragments(dom, &fragments, target).await;
        self.stats
            .fragments_translated
            .fetch_add(result.fragments_translated as u64, Ordering::Relaxed);
        Ok(result.fragments_translated)
    }

    /// 提取子树中尚未翻译、并且是父元素还原目标的片段
    fn pending_fragments<D: DomAdapter>(&self, dom: &D, root: &D::Node) -> Vec<TextFragment<D::Node>> {
        self.extractor
            .extract(dom, root)
            .into_iter()
            .filter(|fragment| {
                !self.applier.is_marked(dom, &fragment.parent)
                    && self.applier.is_restore_target(dom, fragment)
            })
            .collect()
    }

    async fn translate_fragments<D: DomAdapter>(
        &self,
        dom: &D,
        fragments: &[TextFragment<D::Node>],
        target: LanguageCode,
    ) -> SubtreeResult {
        let mut result = SubtreeResult::default();

        for chunk in chunk_fragments(fragments, self.max_batch_chars) {
            if self.signal.is_aborted() {
                result.aborted = true;
                break;
            }

            let texts: Vec<String> = chunk.iter().map(|f| f.text().to_string()).collect();
            match self.client.translate_batch(&texts, target, &self.signal).await {
                BatchOutcome::Translated { translations, .. } => {
                    match self.applier.apply(dom, chunk, &translations) {
                        Ok(written) => result.fragments_translated += written,
                        Err(e) => {
                            tracing::warn!("译文写回失败: {}", e);
                            result.batches_skipped += 1;
                        }
                    }
                }
                BatchOutcome::Skipped(SkipReason::Aborted) => {
                    result.aborted = true;
                    break;
                }
                BatchOutcome::Skipped(reason) => {
                    tracing::debug!("批次被跳过: {:?}", reason);
                    result.batches_skipped += 1;
                }
            }
        }

        result
    }
}
