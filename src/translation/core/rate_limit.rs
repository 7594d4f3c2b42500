//! 请求限流
//!
//! 滚动窗口计数：窗口内最多发出 `max_requests` 个请求。距上一次请求超过一个
//! 窗口后计数清零。服务端返回 429 时直接把计数打满，直到窗口过去。

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::clock::Clock;
use crate::translation::config::constants;

/// 限流器状态快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    pub count: u32,
    pub max_requests: u32,
    pub last_request: Option<Duration>,
    pub window: Duration,
}

impl RateLimitSnapshot {
    pub fn remaining(&self) -> u32 {
        self.max_requests.saturating_sub(self.count)
    }
}

#[derive(Debug, Default)]
struct LimiterState {
    count: u32,
    last_request: Option<Duration>,
}

/// 请求限流器
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests,
            window,
            clock,
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// 默认限额：每 60 秒 10 个请求
    pub fn with_defaults(clock: Arc<dyn Clock>) -> Self {
        Self::new(
            constants::MAX_REQUESTS_PER_WINDOW,
            constants::RATE_WINDOW,
            clock,
        )
    }

    /// 当前是否允许发出请求
    ///
    /// 距上一次请求严格超过一个窗口时先清零计数。
    pub fn can_make_request(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(last) = state.last_request {
            if now.saturating_sub(last) > self.window {
                tracing::debug!("限流窗口已过，计数清零");
                state.count = 0;
            }
        }

        state.count < self.max_requests
    }

    /// 记录一次已发出的请求
    pub fn record_request(&self) {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.count = state.count.saturating_add(1);
        state.last_request = Some(now);
    }

    /// 服务端返回 429：计数打满，时间戳不变
    pub fn saturate(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.count = self.max_requests;
        tracing::warn!("服务端要求限流，本窗口内不再发出请求");
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        RateLimitSnapshot {
            count: state.count,
            max_requests: self.max_requests,
            last_request: state.last_request,
            window: self.window,
        }
    }
}
