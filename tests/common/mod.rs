// 集成测试公共模块
//
// 提供脚本化的假翻译端点、手动时钟和 HTML 样例

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use bharatverse::parsers::html_to_dom;
use bharatverse::translation::core::{
    ManualClock, RateLimiter, TranslateRequest, TranslateTransport, TranslationClient,
};
use bharatverse::translation::{
    AbortSignal, DomAdapter, LanguageCode, LanguageStore, MemoryPreferenceStore, NodeKind,
    PreferenceStore, RcDomAdapter, TranslationCache, TranslationError, TranslationResult,
    TranslationService,
};

/// 假端点对一次请求的回应
#[derive(Debug, Clone)]
pub enum Reply {
    /// 把请求内容转成大写返回，分隔符保持不变
    Upper,
    Text(String),
    Error(TranslationError),
    /// 触发取消信号，然后永远不返回
    AbortThenHang,
    Hang,
}

/// 按脚本回应的翻译端点，记录收到的所有请求
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<TranslateRequest>>,
    signal: Mutex<Option<AbortSignal>>,
    yield_first: bool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    /// 回应前先让出一次执行权
    pub fn yielding() -> Self {
        Self {
            yield_first: true,
            ..Self::default()
        }
    }

    pub fn push_reply(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn set_signal(&self, signal: AbortSignal) {
        *self.signal.lock().unwrap() = Some(signal);
    }

    pub fn requests(&self) -> Vec<TranslateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// 每个请求拆分后的原文片段
    pub fn request_texts(&self) -> Vec<Vec<String>> {
        self.requests()
            .iter()
            .map(|request| {
                request
                    .content
                    .split("\n---TEXT_SEPARATOR---\n")
                    .map(str::to_string)
                    .collect()
            })
            .collect()
    }
}

impl TranslateTransport for FakeTransport {
    fn send<'a>(&'a self, request: &'a TranslateRequest) -> BoxFuture<'a, TranslationResult<String>> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Upper);

        Box::pin(async move {
            if self.yield_first {
                tokio::task::yield_now().await;
            }

            match reply {
                Reply::Upper => Ok(request.content.to_uppercase()),
                Reply::Text(content) => Ok(content),
                Reply::Error(error) => Err(error),
                Reply::AbortThenHang => {
                    let signal = self.signal.lock().unwrap().clone();
                    if let Some(signal) = signal {
                        signal.abort();
                    }
                    futures::future::pending().await
                }
                Reply::Hang => futures::future::pending().await,
            }
        })
    }
}

/// 客户端及其依赖
pub struct ClientHarness {
    pub clock: Arc<ManualClock>,
    pub transport: Arc<FakeTransport>,
    pub client: TranslationClient,
}

pub fn client_harness(transport: FakeTransport) -> ClientHarness {
    let clock = Arc::new(ManualClock::new());
    let transport = Arc::new(transport);
    let client = TranslationClient::new(
        transport.clone(),
        Arc::new(RateLimiter::with_defaults(clock.clone())),
        Arc::new(TranslationCache::new()),
        "en",
    );
    ClientHarness {
        clock,
        transport,
        client,
    }
}

/// 服务及其依赖
pub struct ServiceHarness {
    pub clock: Arc<ManualClock>,
    pub transport: Arc<FakeTransport>,
    pub service: TranslationService,
}

pub fn service_harness(transport: FakeTransport) -> ServiceHarness {
    service_harness_with_store(transport, Box::new(MemoryPreferenceStore::new()))
}

pub fn service_harness_with_store(
    transport: FakeTransport,
    preferences: Box<dyn PreferenceStore>,
) -> ServiceHarness {
    let ClientHarness {
        clock,
        transport,
        client,
    } = client_harness(transport);

    let service = TranslationService::new(client, LanguageStore::new(preferences), clock.clone());
    transport.set_signal(service.abort_signal());

    ServiceHarness {
        clock,
        transport,
        service,
    }
}

pub fn lang(code: &str) -> LanguageCode {
    LanguageCode::from_code(code).unwrap()
}

pub fn parse(html: &str) -> RcDomAdapter {
    RcDomAdapter::new(html_to_dom(html.as_bytes(), "utf-8").unwrap())
}

/// 文档中所有文本节点的内容（按文档顺序）
pub fn all_text<D: DomAdapter>(dom: &D) -> Vec<String> {
    let mut texts = Vec::new();
    dom.visit_preorder(&dom.root(), &mut |node| {
        if dom.kind(node) == NodeKind::Text {
            if let Some(text) = dom.text(node) {
                texts.push(text);
            }
        }
    });
    texts
}

pub fn first_element<D: DomAdapter>(dom: &D, tag: &str) -> D::Node {
    dom.descendants_by_tag(&dom.root(), tag).remove(0)
}

pub const HELLO_WORLD_PAGE: &str =
    "<html><head><title>Shop</title></head><body><main><h1>Hello</h1><p>World</p></main></body></html>";

pub const MARKETPLACE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>BharatVerse Marketplace</title>
    <style>body { color: #333; }</style>
</head>
<body>
    <footer><p>Made by local artisans</p></footer>
    <header><h1>Handloom Sarees</h1></header>
    <nav><a href="/">Home</a> <a href="/cart">Your cart</a></nav>
    <main>
        <p>Woven by hand in Varanasi.</p>
        <span>1499</span>
        <span>+91 (22) 555-0199</span>
        <div style="display: none"><p>Hidden promotion</p></div>
        <script>var price = 1499;</script>
        <section><p>Free shipping across India</p></section>
    </main>
</body>
</html>"#;
