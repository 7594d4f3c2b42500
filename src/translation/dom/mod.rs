//! 文本树抽象
//!
//! 翻译管道不直接依赖浏览器 DOM，而是通过 [`DomAdapter`] 访问一棵带文本的树。
//! 这样同一套收集、批次、缓存和限流逻辑既能作用于 html5ever 解析出的文档
//! ([`RcDomAdapter`])，也能作用于测试中的内存树 ([`MemoryTree`])。

pub mod memory;
pub mod rcdom;

pub use memory::{MemoryTree, NodeId};
pub use rcdom::RcDomAdapter;

/// 节点种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    /// 注释、文档类型等与翻译无关的节点
    Other,
}

/// 对带文本的树结构的访问接口
///
/// 所有写操作都通过 `&self` 完成，实现方使用内部可变性。
pub trait DomAdapter {
    type Node: Clone;

    /// 文档根节点
    fn root(&self) -> Self::Node;

    fn kind(&self, node: &Self::Node) -> NodeKind;

    /// 元素标签名（小写），非元素返回 `None`
    fn tag_name(&self, node: &Self::Node) -> Option<String>;

    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// 文本节点内容，非文本节点返回 `None`
    fn text(&self, node: &Self::Node) -> Option<String>;

    fn set_text(&self, node: &Self::Node, text: &str);

    fn attr(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// 设置属性，`None` 表示删除
    fn set_attr(&self, node: &Self::Node, name: &str, value: Option<&str>);

    /// 元素是否被渲染：计算后的 display 不为 none，且 visibility 不为 hidden
    fn is_rendered(&self, element: &Self::Node) -> bool;

    fn same_node(&self, a: &Self::Node, b: &Self::Node) -> bool;

    /// 按文档顺序（先序）查找指定标签的后代元素，包含 `root` 本身
    fn descendants_by_tag(&self, root: &Self::Node, tag: &str) -> Vec<Self::Node> {
        let mut found = Vec::new();
        self.visit_preorder(root, &mut |node| {
            if self.tag_name(node).as_deref() == Some(tag) {
                found.push(node.clone());
            }
        });
        found
    }

    /// 按文档顺序查找带有指定属性的元素，包含 `root` 本身
    fn elements_with_attr(&self, root: &Self::Node, name: &str) -> Vec<Self::Node> {
        let mut found = Vec::new();
        self.visit_preorder(root, &mut |node| {
            if self.kind(node) == NodeKind::Element && self.attr(node, name).is_some() {
                found.push(node.clone());
            }
        });
        found
    }

    /// `ancestor` 是否为  `node`（含自身）
    fn is_ancestor(&self, ancestor: &Self::Node, node: &Self::Node) -> bool {
        let mut current = Some(node.clone());
        while let Some(candidate) = current {
            if self.same_node(ancestor, &candidate) {
                return true;
            }
            current = self.parent(&candidate);
        }
        false
    }

    /// 先序遍历
    fn visit_preorder(&self, root: &Self::Node, visitor: &mut dyn FnMut(&Self::Node)) {
        let mut stack = vec![root.clone()];
        while let Some(node) = stack.pop() {
            visitor(&node);
            let mut children = self.children(&node);
            children.reverse();
            stack.extend(children);
        }
    }
}
