//! 翻译核心
//!
//! ```text
//! TranslationService (service.rs)
//!     ├── TextExtractor / content_regions (pipeline/collector.rs)
//!     ├── TranslationClient (client.rs)
//!     │       ├── TranslationCache (storage/cache.rs)
//!     │       ├── RateLimiter (rate_limit.rs) ── Clock (clock.rs)
//!     │       └── TranslateTransport ── HttpTransport
//!     ├── BatchApplier (engine.rs)
//!     └── LanguageStore (language.rs) ── PreferenceStore (storage/preferences.rs)
//! ```

pub mod client;
pub mod clock;
pub mod engine;
pub mod rate_limit;
pub mod service;

pub use client::{
    AbortSignal, BatchOutcome, ClientStats, ClientStatsSnapshot, HttpTransport, SkipReason,
    TranslateRequest, TranslateResponse, TranslateTransport, TranslationClient,
};
pub use clock::{Clock, ManualClock, Pacer, SystemClock, TokioPacer};
pub use engine::BatchApplier;
pub use rate_limit::{RateLimitSnapshot, RateLimiter};
pub use service::{
    LanguageChange, PassOutcome, PassReport, ServiceStats, ServiceStatsSnapshot,
    TranslationService, TranslationState,
};
