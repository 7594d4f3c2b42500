//! 翻译管道集成测试
//!
//! 在 html5ever 解析出的真实文档上测试提取、写回和还原

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use bharatverse::parsers::serialize_document;
use bharatverse::translation::{
    content_regions, BatchApplier, DomAdapter, LanguageChange, PassOutcome, TextExtractor,
    TranslationState,
};

use common::{all_text, first_element, lang, parse, service_harness, FakeTransport, Reply};

/// 按区域提取，跳过脚本、隐藏内容和数字
#[test]
fn test_extract_marketplace_page_by_region() {
    let dom = parse(common::MARKETPLACE_PAGE);
    let extractor = TextExtractor::new();

    let regions = content_regions(&dom, &dom.root());
    let tags: Vec<String> = regions
        .iter()
        .map(|region| dom.tag_name(region).unwrap())
        .collect();
    assert_eq!(tags, vec!["nav", "header", "main", "footer"]);

    let per_region: Vec<Vec<String>> = regions
        .iter()
        .map(|region| {
            extractor
                .extract(&dom, region)
                .iter()
                .map(|f| f.text().to_string())
                .collect()
        })
        .collect();

    assert_eq!(per_region[0], vec!["Home", "Your cart"]);
    assert_eq!(per_region[1], vec!["Handloom Sarees"]);
    assert_eq!(
        per_region[2],
        vec!["Woven by hand in Varanasi.", "Free shipping across India"]
    );
    assert_eq!(per_region[3], vec!["Made by local artisans"]);
}

#[test]
fn test_extraction_is_deterministic_and_read_only() {
    let dom = parse(common::MARKETPLACE_PAGE);
    let extractor = TextExtractor::new();
    let before = all_text(&dom);

    let first: Vec<String> = extractor
        .extract(&dom, &dom.root())
        .into_iter()
        .map(|f| f.original)
        .collect();
    let second: Vec<String> = extractor
        .extract(&dom, &dom.root())
        .into_iter()
        .map(|f| f.original)
        .collect();

    assert_eq!(first, second);
    assert_eq!(all_text(&dom), before);
}

/// Hello/World → नमस्ते/दुनिया，再切回英文
#[tokio::test]
async fn test_hello_world_scenario() {
    let transport = FakeTransport::with_replies(vec![Reply::Text(
        "नमस्ते\n---TEXT_SEPARATOR---\nदुनिया".to_string(),
    )]);
    let harness = service_harness(transport);
    let service = &harness.service;
    let dom = parse(common::HELLO_WORLD_PAGE);
    let original = all_text(&dom);

    let change = service.change_language(&dom, lang("hi")).unwrap();
    assert_eq!(
        change,
        LanguageChange::ConfirmationRequired { target: lang("hi") }
    );

    let report = service.confirm(&dom).await.unwrap();
    assert_eq!(report.outcome, PassOutcome::Completed);
    assert_eq!(report.fragments_translated, 2);
    assert_eq!(
        harness.transport.request_texts(),
        vec![vec!["Hello".to_string(), "World".to_string()]]
    );

    let h1 = first_element(&dom, "h1");
    let p = first_element(&dom, "p");
    assert_eq!(dom.text(&dom.children(&h1)[0]).unwrap(), "नमस्ते");
    assert_eq!(dom.text(&dom.children(&p)[0]).unwrap(), "दुनिया");
    assert_eq!(
        dom.attr(&h1, "data-bharatverse-original"),
        Some("Hello".to_string())
    );
    assert_eq!(
        service.state(),
        TranslationState::Translated { language: lang("hi") }
    );

    let change = service.change_language(&dom, lang("en")).unwrap();
    assert_eq!(change, LanguageChange::Reverted { elements: 2 });
    assert_eq!(all_text(&dom), original);
    assert_eq!(dom.attr(&h1, "data-bharatverse-original"), None);
}

/// 多次写回/还原后文本与最初完全一致
#[test]
fn test_apply_revert_cycles_restore_exact_text() {
    let dom = parse(
        "<html><body><main><p>  Fresh mangoes\n</p><p>Organic <b>spices</b> from Kerala</p></main></body></html>",
    );
    let extractor = TextExtractor::new();
    let applier = BatchApplier::default();
    let original = all_text(&dom);

    for round in 0..3 {
        let fragments = extractor.extract(&dom, &dom.root());
        let translations: Vec<String> = fragments
            .iter()
            .map(|f| format!("अनुवाद {} {}", round, f.text()))
            .collect();

        applier.apply(&dom, &fragments, &translations).unwrap();
        assert_ne!(all_text(&dom), original);

        applier.revert(&dom, &dom.root());
        assert_eq!(all_text(&dom), original);
    }
}

/// 标记保存在序列化结果中，可以由另一个进程还原
#[test]
fn test_markers_survive_serialization() {
    let dom = parse(common::HELLO_WORLD_PAGE);
    let extractor = TextExtractor::new();
    let applier = BatchApplier::default();

    let fragments = extractor.extract(&dom, &dom.root());
    applier
        .apply(
            &dom,
            &fragments,
            &["नमस्ते".to_string(), "दुनिया".to_string()],
        )
        .unwrap();

    let html = String::from_utf8(serialize_document(dom.into_dom(), "utf-8").unwrap()).unwrap();
    assert!(html.contains(r#"<h1 data-bharatverse-original="Hello">नमस्ते</h1>"#));

    let reparsed = parse(&html);
    assert_eq!(applier.revert(&reparsed, &reparsed.root()), 2);
    let html = String::from_utf8(serialize_document(reparsed.into_dom(), "utf-8").unwrap()).unwrap();
    assert!(html.contains("<h1>Hello</h1><p>World</p>"));
}

/// 同一元素下有多个文本节点时，切换语言再切回后文本逐字节一致
#[tokio::test]
async fn test_mixed_content_restores_every_text_node() {
    let harness = service_harness(FakeTransport::new());
    let dom = parse("<html><body><main><p>Hello there <b>bold</b> World here</p></main></body></html>");
    let original = all_text(&dom);

    harness.service.change_language(&dom, lang("hi")).unwrap();
    let report = harness.service.confirm(&dom).await.unwrap();
    assert_eq!(report.fragments_translated, 2);

    let p = first_element(&dom, "p");
    assert_eq!(
        dom.attr(&p, "data-bharatverse-original"),
        Some("Hello there ".to_string())
    );

    let change = harness.service.change_language(&dom, lang("en")).unwrap();
    assert_eq!(change, LanguageChange::Reverted { elements: 2 });
    assert_eq!(all_text(&dom), original);
}
