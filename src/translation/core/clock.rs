//! 时间来源与节流等待
//!
//! 限流器和编排器都不直接读系统时间，而是通过 [`Clock`] 和 [`Pacer`]，
//! 测试中可以换成手动推进的 [`ManualClock`]。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;

/// 单调时间来源，返回自某个固定起点以来经过的时间
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// 异步等待
pub trait Pacer: Send + Sync {
    fn pause(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

/// 基于 `Instant` 的系统时钟
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// 使用 tokio 定时器的真实等待
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    fn pause(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// 手动推进的时钟
///
/// 作为 [`Pacer`] 使用时不真正等待，只把时钟向前推进并记录每次等待的时长。
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
    pauses: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.millis
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, now: Duration) {
        self.millis.store(now.as_millis() as u64, Ordering::SeqCst);
    }

    /// 迄今为止记录的全部等待
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

impl Pacer for ManualClock {
    fn pause(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.pauses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(duration);
            self.advance(duration);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        clock.advance(Duration::from_secs(61));
        assert_eq!(clock.now(), Duration::from_secs(61));

        clock.set(Duration::from_millis(5));
        assert_eq!(clock.now(), Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_manual_pacer_records_pauses() {
        let clock = ManualClock::new();
        clock.pause(Duration::from_millis(1000)).await;
        clock.pause(Duration::from_millis(250)).await;

        assert_eq!(
            clock.pauses(),
            vec![Duration::from_millis(1000), Duration::from_millis(250)]
        );
        assert_eq!(clock.now(), Duration::from_millis(1250));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
