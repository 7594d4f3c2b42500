//! 文本收集器模块
//!
//! 从树的某个子树中按文档顺序收集可翻译的文本节点，并确定页面的内容区域。

use crate::translation::config::constants;
use crate::translation::dom::{DomAdapter, NodeKind};
use crate::translation::pipeline::filters::TextFilter;

/// 一个可翻译的文本节点
///
/// `original` 保存节点的原始文本（含空白），用于写入还原标记；
/// 送去翻译的是去掉首尾空白后的 [`TextFragment::text`]。
#[derive(Debug, Clone)]
pub struct TextFragment<N> {
    pub node: N,
    pub parent: N,
    pub original: String,
}

impl<N> TextFragment<N> {
    pub fn text(&self) -> &str {
        self.original.trim()
    }
}

/// 文本提取器
///
/// 只读遍历，不修改树。同一棵未变化的树两次提取结果相同。
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    filter: TextFilter,
}

impl TextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(filter: TextFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &TextFilter {
        &self.filter
    }

    /// 收集 `root` 下的可翻译文本节点
    pub fn extract<D: DomAdapter>(&self, dom: &D, root: &D::Node) -> Vec<TextFragment<D::Node>> {
        let mut fragments = Vec::new();

        dom.visit_preorder(root, &mut |node| {
            if dom.kind(node) != NodeKind::Text {
                return;
            }
            if let Some(fragment) = self.accept(dom, node) {
                fragments.push(fragment);
            }
        });

        tracing::debug!("收集到 {} 个文本片段", fragments.len());
        fragments
    }

    fn accept<D: DomAdapter>(&self, dom: &D, node: &D::Node) -> Option<TextFragment<D::Node>> {
        let parent = dom.parent(node)?;
        let tag = dom.tag_name(&parent)?;

        if self.filter.is_skipped_tag(&tag) || !dom.is_rendered(&parent) {
            return None;
        }

        let original = dom.text(node)?;
        if !self.filter.should_translate(&original) {
            return None;
        }

        Some(TextFragment {
            node: node.clone(),
            parent,
            original,
        })
    }
}

/// 按固定顺序列出页面的内容区域
///
/// 依次查找 nav、header、main、article、section、footer；
/// 已选区域内部嵌套的区域元素不再单独列出，避免同一段文本被处理两次。
/// 页面没有任何区域元素时退回到 `body`，再退回到根节点。
pub fn content_regions<D: DomAdapter>(dom: &D, root: &D::Node) -> Vec<D::Node> {
    let mut regions: Vec<D::Node> = Vec::new();

    for tag in constants::REGION_TAGS {
        for candidate in dom.descendants_by_tag(root, tag) {
            let nested = regions
                .iter()
                .any(|region| dom.is_ancestor(region, &candidate));
            if nested {
                tracing::debug!("跳过嵌套区域 <{}>", tag);
                continue;
            }
            regions.push(candidate);
        }
    }

    if regions.is_empty() {
        let fallback = dom
            .descendants_by_tag(root, "body")
            .into_iter()
            .next()
            .unwrap_or_else(|| root.clone());
        regions.push(fallback);
    }

    regions
}
