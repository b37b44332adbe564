//! Markup snapshots in either representation, and the parsed form every
//! detection layer reads.
//!
//! A browser collaborator may hand over raw markup or a serialized element
//! tree. The tree is rendered back to markup so that both representations
//! go through the same parser and the same layers.

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Elements that never carry children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// One node of a serialized DOM tree. A node whose tag is `#text` is a text node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomNode {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub children: Vec<DomNode>,
}

impl DomNode {
    /// Render this node and its subtree as markup.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        if self.tag == "#text" {
            if let Some(text) = &self.text {
                out.push_str(&escape_text(text));
            }
            return;
        }

        let tag = self.tag.to_ascii_lowercase();
        let valid_tag = !tag.is_empty()
            && tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
            && tag.starts_with(|c: char| c.is_ascii_alphabetic());
        if !valid_tag {
            // Unknown node kinds still contribute their subtree.
            for child in &self.children {
                child.write_markup(out);
            }
            return;
        }

        out.push('<');
        out.push_str(&tag);
        for (name, value) in &self.attributes {
            let valid_name = !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'));
            if !valid_name {
                continue;
            }
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        out.push('>');

        if VOID_ELEMENTS.contains(&tag.as_str()) {
            return;
        }
        if let Some(text) = &self.text {
            out.push_str(&escape_text(text));
        }
        for child in &self.children {
            child.write_markup(out);
        }
        out.push_str("</");
        out.push_str(&tag);
        out.push('>');
    }
}

/// A snapshot of a rendered interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "content", rename_all = "snake_case")]
pub enum MarkupSnapshot {
    Markup(String),
    Tree(DomNode),
}

impl MarkupSnapshot {
    pub fn to_markup(&self) -> Cow<'_, str> {
        match self {
            Self::Markup(markup) => Cow::Borrowed(markup),
            Self::Tree(root) => Cow::Owned(root.to_markup()),
        }
    }

    /// True when there is nothing to parse at all.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Markup(markup) => markup.trim().is_empty(),
            Self::Tree(root) => root.tag.trim().is_empty() && root.children.is_empty(),
        }
    }
}

/// A snapshot parsed into a queryable document.
pub struct ParsedSnapshot {
    document: Html,
}

impl ParsedSnapshot {
    pub fn parse(snapshot: &MarkupSnapshot) -> Self {
        Self {
            document: Html::parse_document(&snapshot.to_markup()),
        }
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Elements other than the implied `html`/`head`/`body` scaffolding.
    pub fn element_count(&self) -> usize {
        self.document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| !matches!(el.value().name(), "html" | "head" | "body"))
            .count()
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(tag: &str, attrs: &[(&str, &str)], children: Vec<DomNode>) -> DomNode {
        DomNode {
            tag: tag.to_string(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: None,
            children,
        }
    }

    fn text(value: &str) -> DomNode {
        DomNode {
            tag: "#text".to_string(),
            text: Some(value.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_tree_renders_to_markup() {
        let tree = node(
            "div",
            &[("id", "root")],
            vec![
                node("input", &[("type", "search")], vec![]),
                node("button", &[], vec![text("Go & find")]),
            ],
        );
        assert_eq!(
            tree.to_markup(),
            r#"<div id="root"><input type="search"><button>Go &amp; find</button></div>"#
        );
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let tree = node("div", &[("title", "say \"hi\"")], vec![]);
        assert_eq!(tree.to_markup(), r#"<div title="say &quot;hi&quot;"></div>"#);
    }

    #[test]
    fn test_invalid_tags_keep_children() {
        let tree = node("#document", &[], vec![node("p", &[], vec![text("x")])]);
        assert_eq!(tree.to_markup(), "<p>x</p>");
    }

    #[test]
    fn test_blank_snapshots() {
        assert!(MarkupSnapshot::Markup("   ".to_string()).is_blank());
        assert!(MarkupSnapshot::Tree(DomNode::default()).is_blank());
        assert!(!MarkupSnapshot::Markup("<p>x</p>".to_string()).is_blank());
    }

    #[test]
    fn test_element_count_ignores_scaffolding() {
        let empty = ParsedSnapshot::parse(&MarkupSnapshot::Markup("just text".to_string()));
        assert_eq!(empty.element_count(), 0);
        let one = ParsedSnapshot::parse(&MarkupSnapshot::Markup("<select></select>".to_string()));
        assert_eq!(one.element_count(), 1);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = r#"{
            "format": "tree",
            "content": { "tag": "select", "attributes": { "id": "breed" } }
        }"#;
        let snapshot: MarkupSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.to_markup().contains(r#"<select id="breed">"#));
    }
}
