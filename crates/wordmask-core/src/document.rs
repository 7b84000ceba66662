//! 页面文档树：文本叶与元素节点
//!
//! 设计要点：
//! - 两种节点：文本叶 `{"text": ...}`、元素 `{"tag": ..., "children": [...]}`。
//!   serde untagged 按字段区分，`children` 缺省为空数组。
//! - `script` / `style`（标签名大小写不敏感）为不透明元素，遍历时整棵跳过。
//! - 纯文本输入按约定包装为单文本叶的 `body` 元素。
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 文档树节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentNode {
    Text {
        text: String,
    },
    Element {
        tag: String,
        #[serde(default)]
        children: Vec<DocumentNode>,
    },
}

impl DocumentNode {
    /// 构造文本叶
    pub fn text(text: impl Into<String>) -> Self {
        DocumentNode::Text { text: text.into() }
    }

    /// 构造元素节点
    pub fn element(tag: impl Into<String>, children: Vec<DocumentNode>) -> Self {
        DocumentNode::Element { tag: tag.into(), children }
    }

    /// 节点是否为不透明元素（其子树不参与扫描）
    pub fn is_opaque(&self) -> bool {
        match self {
            DocumentNode::Element { tag, .. } => is_opaque_tag(tag),
            DocumentNode::Text { .. } => false,
        }
    }

    /// 按文档序拼接全部文本叶内容
    pub fn text_content(&self) -> String {
        fn collect(node: &DocumentNode, out: &mut String) {
            match node {
                DocumentNode::Text { text } => out.push_str(text),
                DocumentNode::Element { children, .. } => {
                    for child in children {
                        collect(child, out);
                    }
                }
            }
        }
        let mut out = String::new();
        collect(self, &mut out);
        out
    }
}

/// 标签名是否标记不透明子树
pub fn is_opaque_tag(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style")
}

/// 从文件加载文档树
/// - `.json`：按文档树格式解析
/// - 其他扩展名：整个文件内容包装为 `body` 下的单个文本叶
pub fn read_document(path: &Path) -> Result<DocumentNode> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read document {}", path.display()))?;
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        let node = serde_json::from_str(&raw)
            .with_context(|| format!("parse document tree {}", path.display()))?;
        Ok(node)
    } else {
        Ok(DocumentNode::element("body", vec![DocumentNode::text(raw)]))
    }
}

/// 将文档树写回文件（格式与 `read_document` 对应）
pub fn write_document(path: &Path, node: &DocumentNode) -> Result<()> {
    let rendered = if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        let mut body = serde_json::to_string_pretty(node)
            .context("serialize document tree")?;
        body.push('\n');
        body
    } else {
        node.text_content()
    };
    fs::write(path, rendered)
        .with_context(|| format!("write document {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_leaf_parses_from_json() {
        let node: DocumentNode = serde_json::from_str(r#"{"text": "hello"}"#).unwrap();
        assert_eq!(node, DocumentNode::text("hello"));
    }

    #[test]
    fn element_children_default_to_empty() {
        let node: DocumentNode = serde_json::from_str(r#"{"tag": "br"}"#).unwrap();
        assert_eq!(node, DocumentNode::element("br", vec![]));
    }

    #[test]
    fn nested_tree_round_trips() {
        let tree = DocumentNode::element(
            "body",
            vec![
                DocumentNode::text("intro"),
                DocumentNode::element("p", vec![DocumentNode::text("inner")]),
            ],
        );
        let json = serde_json::to_string(&tree).unwrap();
        let back: DocumentNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn opaque_tags_ignore_ascii_case() {
        assert!(is_opaque_tag("script"));
        assert!(is_opaque_tag("SCRIPT"));
        assert!(is_opaque_tag("Style"));
        assert!(!is_opaque_tag("div"));
        assert!(!is_opaque_tag("p"));

        // 节点级判定只看元素标签，文本叶永远可见
        assert!(DocumentNode::element("Script", vec![]).is_opaque());
        assert!(!DocumentNode::element("div", vec![]).is_opaque());
        assert!(!DocumentNode::text("script").is_opaque());
    }

    #[test]
    fn text_content_follows_document_order() {
        let tree = DocumentNode::element(
            "div",
            vec![
                DocumentNode::text("a"),
                DocumentNode::element("span", vec![DocumentNode::text("b")]),
                DocumentNode::text("c"),
            ],
        );
        assert_eq!(tree.text_content(), "abc");
    }

    #[test]
    fn plain_file_wraps_as_body_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.txt");
        std::fs::write(&path, "damn fine day").unwrap();

        let node = read_document(&path).unwrap();
        assert_eq!(
            node,
            DocumentNode::element("body", vec![DocumentNode::text("damn fine day")])
        );
    }

    #[test]
    fn json_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.json");
        let tree = DocumentNode::element("body", vec![DocumentNode::text("hi")]);

        write_document(&path, &tree).unwrap();
        let back = read_document(&path).unwrap();
        assert_eq!(back, tree);
    }
}
