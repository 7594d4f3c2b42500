//! 内存中的文本树
//!
//! 每个节点只记录 `{tag, text, visible, attrs}`，用于在没有真实文档的情况下
//! 驱动整套翻译管道。

use std::cell::RefCell;

use super::{DomAdapter, NodeKind};

/// 节点句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum MemoryData {
    Element {
        tag: String,
        visible: bool,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct MemoryNode {
    data: MemoryData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// 基于数组的内存树
#[derive(Debug)]
pub struct MemoryTree {
    nodes: RefCell<Vec<MemoryNode>>,
}

impl MemoryTree {
    /// 创建只有根元素的树
    pub fn new(root_tag: &str) -> Self {
        let root = MemoryNode {
            data: MemoryData::Element {
                tag: root_tag.to_ascii_lowercase(),
                visible: true,
                attrs: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: RefCell::new(vec![root]),
        }
    }

    fn push(&self, parent: NodeId, data: MemoryData) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(MemoryNode {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        nodes[parent.0].children.push(id);
        id
    }

    /// 追加可见元素
    pub fn element(&self, parent: NodeId, tag: &str) -> NodeId {
        self.push(
            parent,
            MemoryData::Element {
                tag: tag.to_ascii_lowercase(),
                visible: true,
                attrs: Vec::new(),
            },
        )
    }

    /// 追加不可见元素
    pub fn hidden_element(&self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.element(parent, tag);
        self.set_visible(id, false);
        id
    }

    /// 追加文本节点
    pub fn append_text(&self, parent: NodeId, content: &str) -> NodeId {
        self.push(parent, MemoryData::Text(content.to_string()))
    }

    /// 追加元素及其唯一的文本子节点，返回 `(元素, 文本)`
    pub fn element_with_text(&self, parent: NodeId, tag: &str, content: &str) -> (NodeId, NodeId) {
        let element = self.element(parent, tag);
        let text = self.append_text(element, content);
        (element, text)
    }

    pub fn set_visible(&self, id: NodeId, value: bool) {
        if let MemoryData::Element { visible, .. } = &mut self.nodes.borrow_mut()[id.0].data {
            *visible = value;
        }
    }

    /// 元素的全部文本（按文档顺序拼接）
    pub fn text_content(&self, id: NodeId) -> String {
        let mut content = String::new();
        self.visit_preorder(&id, &mut |node| {
            if let Some(text) = self.text(node) {
                content.push_str(&text);
            }
        });
        content
    }
}

impl DomAdapter for MemoryTree {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn kind(&self, node: &NodeId) -> NodeKind {
        match self.nodes.borrow().get(node.0).map(|n| &n.data) {
            Some(MemoryData::Element { .. }) => NodeKind::Element,
            Some(MemoryData::Text(_)) => NodeKind::Text,
            None => NodeKind::Other,
        }
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        match &self.nodes.borrow().get(node.0)?.data {
            MemoryData::Element { tag, .. } => Some(tag.clone()),
            MemoryData::Text(_) => None,
        }
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .get(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(node.0)?.parent
    }

    fn text(&self, node: &NodeId) -> Option<String> {
        match &self.nodes.borrow().get(node.0)?.data {
            MemoryData::Text(text) => Some(text.clone()),
            MemoryData::Element { .. } => None,
        }
    }

    fn set_text(&self, node: &NodeId, text: &str) {
        if let Some(MemoryData::Text(content)) =
            self.nodes.borrow_mut().get_mut(node.0).map(|n| &mut n.data)
        {
            *content = text.to_string();
        }
    }

    fn attr(&self, node: &NodeId, name: &str) -> Option<String> {
        match &self.nodes.borrow().get(node.0)?.data {
            MemoryData::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone()),
            MemoryData::Text(_) => None,
        }
    }

    fn set_attr(&self, node: &NodeId, name: &str, value: Option<&str>) {
        let mut nodes = self.nodes.borrow_mut();
        let Some(MemoryData::Element { attrs, .. }) = nodes.get_mut(node.0).map(|n| &mut n.data)
        else {
            return;
        };

        match value {
            Some(value) => match attrs.iter_mut().find(|(key, _)| key == name) {
                Some(existing) => existing.1 = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            },
            None => attrs.retain(|(key, _)| key != name),
        }
    }

    /// 元素及其所有祖先都可见时才算被渲染
    fn is_rendered(&self, element: &NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = Some(*element);

        while let Some(id) = current {
            let Some(node) = nodes.get(id.0) else {
                return false;
            };
            if let MemoryData::Element { visible: false, .. } = node.data {
                return false;
            }
            current = node.parent;
        }

        matches!(
            nodes.get(element.0).map(|n| &n.data),
            Some(MemoryData::Element { .. })
        )
    }

    fn same_node(&self, a: &NodeId, b: &NodeId) -> bool {
        a == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_walk() {
        let tree = MemoryTree::new("body");
        let root = tree.root();
        let (main, _) = tree.element_with_text(root, "main", "Hello");
        let (p, text) = tree.element_with_text(main, "p", " World");

        assert_eq!(tree.tag_name(&p), Some("p".to_string()));
        assert_eq!(tree.parent(&text), Some(p));
        assert_eq!(tree.text_content(main), "Hello World");
        assert_eq!(tree.descendants_by_tag(&root, "p"), vec![p]);
        assert!(tree.is_ancestor(&main, &text));
        assert!(!tree.is_ancestor(&p, &main));
    }

    #[test]
    fn test_attributes() {
        let tree = MemoryTree::new("body");
        let (p, text) = tree.element_with_text(tree.root(), "p", "Hi");

        tree.set_attr(&p, "data-x", Some("1"));
        tree.set_attr(&p, "data-x", Some("2"));
        assert_eq!(tree.attr(&p, "data-x"), Some("2".to_string()));
        assert_eq!(tree.elements_with_attr(&tree.root(), "data-x"), vec![p]);

        tree.set_attr(&p, "data-x", None);
        assert_eq!(tree.attr(&p, "data-x"), None);

        // 文本节点没有属性
        tree.set_attr(&text, "data-x", Some("1"));
        assert_eq!(tree.attr(&text, "data-x"), None);
    }

    #[test]
    fn test_visibility_flag() {
        let tree = MemoryTree::new("body");
        let shown = tree.element(tree.root(), "div");
        let hidden = tree.hidden_element(tree.root(), "div");
        assert!(tree.is_rendered(&shown));
        assert!(!tree.is_rendered(&hidden));
    }
}
