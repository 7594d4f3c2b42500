//! 译文写回与还原
//!
//! 写回译文前，把原文记录在父元素的标记属性上；还原时按标记写回原文并删除标记。
//! 标记一旦存在就不会被覆盖，所以多次翻译之后还原得到的仍是最初的原文。
//!
//! 每个元素只有一个标记，因此只翻译元素的第一个非空白直接文本子节点，
//! 同一元素下其余的文本节点保持原文。

use crate::translation::config::constants;
use crate::translation::dom::{DomAdapter, NodeKind};
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::pipeline::collector::TextFragment;

/// 批次写回器
#[derive(Debug, Clone)]
pub struct BatchApplier {
    marker: String,
}

impl Default for BatchApplier {
    fn default() -> Self {
        Self::new(constants::MARKER_ATTRIBUTE)
    }
}

impl BatchApplier {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// 标记属性名
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// 元素是否已经带有还原标记
    pub fn is_marked<D: DomAdapter>(&self, dom: &D, element: &D::Node) -> bool {
        dom.attr(element, &self.marker).is_some()
    }

    /// 片段是否是其父元素的还原目标
    pub fn is_restore_target<D: DomAdapter>(&self, dom: &D, fragment: &TextFragment<D::Node>) -> bool {
        self.restore_target(dom, &fragment.parent)
            .map(|target| dom.same_node(&target, &fragment.node))
            .unwrap_or(false)
    }

    /// 按顺序把译文写回对应的文本节点，返回写入的节点数
    ///
    /// 片段数与译文数不一致时拒绝写入任何内容。空译文保留原文，
    /// 不是还原目标的片段直接跳过。
    pub fn apply<D: DomAdapter>(
        &self,
        dom: &D,
        fragments: &[TextFragment<D::Node>],
        translations: &[String],
    ) -> TranslationResult<usize> {
        if fragments.len() != translations.len() {
            return Err(TranslationError::MalformedResponse {
                expected: fragments.len(),
                received: translations.len(),
            });
        }

        let mut written = 0;
        for (fragment, translation) in fragments.iter().zip(translations) {
            let translated = translation.trim();
            if translated.is_empty() {
                tracing::debug!("空译文，保留原文: {}", fragment.text());
                continue;
            }
            if !self.is_restore_target(dom, fragment) {
                tracing::debug!("元素已有其他文本节点作为还原目标，跳过: {}", fragment.text());
                continue;
            }

            if !self.is_marked(dom, &fragment.parent) {
                dom.set_attr(&fragment.parent, &self.marker, Some(&fragment.original));
            }
            dom.set_text(&fragment.node, translated);
            written += 1;
        }

        Ok(written)
    }

    /// 还原 `root`（含）下所有带标记的元素，返回还原的元素数
    pub fn revert<D: DomAdapter>(&self, dom: &D, root: &D::Node) -> usize {
        let marked = dom.elements_with_attr(root, &self.marker);

        for element in &marked {
            if let Some(original) = dom.attr(element, &self.marker) {
                match self.restore_target(dom, element) {
                    Some(text_node) => dom.set_text(&text_node, &original),
                    None => tracing::warn!("带标记的元素没有文本子节点，只移除标记"),
                }
            }
            dom.set_attr(element, &self.marker, None);
        }

        if !marked.is_empty() {
            tracing::debug!("还原了 {} 个元素", marked.len());
        }
        marked.len()
    }

    /// 元素的还原目标：第一个有非空白内容的直接文本子节点，没有则取第一个文本子节点
    pub fn restore_target<D: DomAdapter>(&self, dom: &D, element: &D::Node) -> Option<D::Node> {
        let text_children: Vec<D::Node> = dom
            .children(element)
            .into_iter()
            .filter(|child| dom.kind(child) == NodeKind::Text)
            .collect();

        text_children
            .iter()
            .find(|child| {
                dom.text(child)
                    .map(|text| !text.trim().is_empty())
                    .unwrap_or(false)
            })
            .or_else(|| text_children.first())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::dom::MemoryTree;
    use crate::translation::pipeline::collector::TextExtractor;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_apply_then_revert() {
        let tree = MemoryTree::new("body");
        let (h1, _) = tree.element_with_text(tree.root(), "h1", "Hello");
        let (p, _) = tree.element_with_text(tree.root(), "p", " World ");

        let applier = BatchApplier::default();
        let fragments = TextExtractor::new().extract(&tree, &tree.root());

        let written = applier
            .apply(&tree, &fragments, &strings(&["नमस्ते", "दुनिया"]))
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(tree.text_content(h1), "नमस्ते");
        assert_eq!(tree.text_content(p), "दुनिया");
        assert_eq!(tree.attr(&p, applier.marker()), Some(" World ".to_string()));

        assert_eq!(applier.revert(&tree, &tree.root()), 2);
        assert_eq!(tree.text_content(h1), "Hello");
        assert_eq!(tree.text_content(p), " World ");
        assert!(!applier.is_marked(&tree, &p));

        // 再次还原没有任何效果
        assert_eq!(applier.revert(&tree, &tree.root()), 0);
        assert_eq!(tree.text_content(p), " World ");
    }

    #[test]
    fn test_marker_is_never_overwritten() {
        let tree = MemoryTree::new("body");
        let (p, _) = tree.element_with_text(tree.root(), "p", "Hello");
        let applier = BatchApplier::default();
        let extractor = TextExtractor::new();

        let fragments = extractor.extract(&tree, &tree.root());
        applier.apply(&tree, &fragments, &strings(&["नमस्ते"])).unwrap();

        let fragments = extractor.extract(&tree, &tree.root());
        applier.apply(&tree, &fragments, &strings(&["வணக்கம்"])).unwrap();
        assert_eq!(tree.attr(&p, applier.marker()), Some("Hello".to_string()));

        applier.revert(&tree, &tree.root());
        assert_eq!(tree.text_content(p), "Hello");
    }

    #[test]
    fn test_length_mismatch_writes_nothing() {
        let tree = MemoryTree::new("body");
        let (p, _) = tree.element_with_text(tree.root(), "p", "Hello");
        let applier = BatchApplier::default();
        let fragments = TextExtractor::new().extract(&tree, &tree.root());

        let result = applier.apply(&tree, &fragments, &strings(&["a", "b"]));
        assert!(matches!(
            result,
            Err(TranslationError::MalformedResponse {
                expected: 1,
                received: 2
            })
        ));
        assert_eq!(tree.text_content(p), "Hello");
        assert!(!applier.is_marked(&tree, &p));
    }

    #[test]
    fn test_empty_translation_keeps_original() {
        let tree = MemoryTree::new("body");
        let (p, _) = tree.element_with_text(tree.root(), "p", "Hello");
        let applier = BatchApplier::default();
        let fragments = TextExtractor::new().extract(&tree, &tree.root());

        assert_eq!(applier.apply(&tree, &fragments, &strings(&["  "])).unwrap(), 0);
        assert_eq!(tree.text_content(p), "Hello");
        assert!(!applier.is_marked(&tree, &p));
    }

    #[test]
    fn test_revert_picks_non_blank_text_child() {
        let tree = MemoryTree::new("body");
        let p = tree.element(tree.root(), "p");
        tree.append_text(p, "\n  ");
        let text = tree.append_text(p, "Hello");
        let applier = BatchApplier::default();

        let fragments = TextExtractor::new().extract(&tree, &tree.root());
        assert_eq!(fragments.len(), 1);
        applier.apply(&tree, &fragments, &strings(&["नमस्ते"])).unwrap();
        assert_eq!(tree.text(&text), Some("नमस्ते".to_string()));

        applier.revert(&tree, &tree.root());
        assert_eq!(tree.text(&text), Some("Hello".to_string()));
        assert_eq!(tree.text_content(p), "\n  Hello");
    }

    #[test]
    fn test_mixed_content_only_translates_restore_target() {
        let tree = MemoryTree::new("body");
        let p = tree.element(tree.root(), "p");
        tree.append_text(p, "Hello there ");
        tree.element_with_text(p, "b", "bold");
        let tail = tree.append_text(p, " World here");
        let applier = BatchApplier::default();

        let fragments = TextExtractor::new().extract(&tree, &tree.root());
        assert_eq!(fragments.len(), 3);
        assert!(!applier.is_restore_target(&tree, &fragments[2]));

        let written = applier
            .apply(&tree, &fragments, &strings(&["नमस्ते", "मोटा", "दुनिया"]))
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(tree.text(&tail), Some(" World here".to_string()));

        applier.revert(&tree, &tree.root());
        assert_eq!(tree.text_content(p), "Hello there bold World here");
    }
}
