//! html5ever / rcdom 文档的适配器

use std::rc::Rc;

use html5ever::tendril::StrTendril;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::{DomAdapter, NodeKind};
use crate::parsers::html::{
    find_nodes, get_node_attr, get_node_name, get_parent_node, set_node_attr,
};

/// 基于 `markup5ever_rcdom` 的适配器
///
/// 没有样式引擎，可见性由内联 `style` 声明和 `hidden` 属性推断：
/// 任一祖先声明 `display: none` 即不可见；`visibility` 取最近一次声明的值。
pub struct RcDomAdapter {
    dom: RcDom,
}

impl RcDomAdapter {
    pub fn new(dom: RcDom) -> Self {
        Self { dom }
    }

    pub fn dom(&self) -> &RcDom {
        &self.dom
    }

    pub fn into_dom(self) -> RcDom {
        self.dom
    }
}

/// 从内联样式中读取某个属性的值（小写，去掉 `!important`）
fn inline_style_value(style: &str, property: &str) -> Option<String> {
    style
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case(property))
        .map(|(_, value)| {
            value
                .trim()
                .trim_end_matches("!important")
                .trim()
                .to_ascii_lowercase()
        })
        .last()
}

impl DomAdapter for RcDomAdapter {
    type Node = Handle;

    fn root(&self) -> Handle {
        self.dom.document.clone()
    }

    fn kind(&self, node: &Handle) -> NodeKind {
        match node.data {
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text { .. } => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    fn tag_name(&self, node: &Handle) -> Option<String> {
        get_node_name(node).map(|name| name.to_ascii_lowercase())
    }

    fn children(&self, node: &Handle) -> Vec<Handle> {
        node.children.borrow().clone()
    }

    fn parent(&self, node: &Handle) -> Option<Handle> {
        get_parent_node(node)
    }

    fn text(&self, node: &Handle) -> Option<String> {
        match &node.data {
            NodeData::Text { contents } => Some(contents.borrow().to_string()),
            _ => None,
        }
    }

    fn set_text(&self, node: &Handle, text: &str) {
        if let NodeData::Text { contents } = &node.data {
            *contents.borrow_mut() = StrTendril::from_slice(text);
        }
    }

    fn attr(&self, node: &Handle, name: &str) -> Option<String> {
        get_node_attr(node, name)
    }

    fn set_attr(&self, node: &Handle, name: &str, value: Option<&str>) {
        set_node_attr(node, name, value.map(str::to_string));
    }

    fn is_rendered(&self, element: &Handle) -> bool {
        let mut visibility_decided = false;
        let mut current = Some(element.clone());

        while let Some(node) = current {
            if self.kind(&node) == NodeKind::Element {
                if get_node_attr(&node, "hidden").is_some() {
                    return false;
                }

                if let Some(style) = get_node_attr(&node, "style") {
                    if inline_style_value(&style, "display").as_deref() == Some("none") {
                        return false;
                    }

                    if !visibility_decided {
                        if let Some(visibility) = inline_style_value(&style, "visibility") {
                            if visibility == "hidden" || visibility == "collapse" {
                                return false;
                            }
                            visibility_decided = true;
                        }
                    }
                }
            }
            current = get_parent_node(&node);
        }

        true
    }

    fn same_node(&self, a: &Handle, b: &Handle) -> bool {
        Rc::ptr_eq(a, b)
    }

    fn descendants_by_tag(&self, root: &Handle, tag: &str) -> Vec<Handle> {
        find_nodes(root, &[tag])
    }
}
