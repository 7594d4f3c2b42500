use encoding_rs::Encoding;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::{namespace_url, ns};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::translation::error::{TranslationError, TranslationResult};

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> TranslationResult<RcDom> {
    let s = match Encoding::for_label(document_encoding.as_bytes()) {
        Some(encoding) => encoding.decode(data).0.to_string(),
        None => String::from_utf8_lossy(data).to_string(),
    };

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
        .map_err(|e| TranslationError::ParseError(format!("HTML解析失败: {}", e)))
}

/// 查找指定路径的DOM节点
pub fn find_nodes(node: &Handle, node_names: &[&str]) -> Vec<Handle> {
    let mut found_nodes = Vec::new();
    let Some((&node_name, rest)) = node_names.split_first() else {
        return found_nodes;
    };

    let matches = matches!(&node.data, NodeData::Element { name, .. } if &*name.local == node_name);

    if matches && rest.is_empty() {
        found_nodes.push(node.clone());
    }

    let next_names = if matches && !rest.is_empty() { rest } else { node_names };
    for child_node in node.children.borrow().iter() {
        found_nodes.append(&mut find_nodes(child_node, next_names));
    }

    found_nodes
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 获取父节点
///
/// rcdom 把父节点存放在 `Cell` 中，读取后需要放回。
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 设置节点属性，`None` 表示删除
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    use html5ever::interface::{Attribute, QualName};
    use html5ever::tendril::format_tendril;
    use html5ever::LocalName;

    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.as_deref() {
                    attrs_mut[i].value.clear();
                    attrs_mut[i].value.push_slice(attr_value);
                } else {
                    // Remove attr completely if attr_value is not defined
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            if let Some(attr_value) = attr_value {
                let name = LocalName::from(attr_name);

                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), name),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_nodes_by_path() {
        let dom = html_to_dom(
            b"<html><body><main><p>One</p></main><p>Two</p></body></html>",
            "utf-8",
        )
        .unwrap();

        assert_eq!(find_nodes(&dom.document, &["p"]).len(), 2);
        assert_eq!(find_nodes(&dom.document, &["main", "p"]).len(), 1);
        assert!(find_nodes(&dom.document, &[]).is_empty());
    }

    #[test]
    fn test_attr_set_and_remove() {
        let dom = html_to_dom(b"<html><body><p id=\"x\">Hi</p></body></html>", "utf-8").unwrap();
        let p = find_nodes(&dom.document, &["p"]).remove(0);

        set_node_attr(&p, "data-test", Some("value".to_string()));
        assert_eq!(get_node_attr(&p, "data-test"), Some("value".to_string()));

        set_node_attr(&p, "data-test", Some("other".to_string()));
        assert_eq!(get_node_attr(&p, "data-test"), Some("other".to_string()));

        set_node_attr(&p, "data-test", None);
        assert_eq!(get_node_attr(&p, "data-test"), None);
        assert_eq!(get_node_attr(&p, "id"), Some("x".to_string()));
    }

    #[test]
    fn test_parent_is_preserved_after_lookup() {
        let dom = html_to_dom(b"<html><body><p>Hi</p></body></html>", "utf-8").unwrap();
        let p = find_nodes(&dom.document, &["p"]).remove(0);

        let first = get_parent_node(&p).unwrap();
        let second = get_parent_node(&p).unwrap();
        assert_eq!(get_node_name(&first), Some("body"));
        assert_eq!(get_node_name(&second), Some("body"));
    }
}
