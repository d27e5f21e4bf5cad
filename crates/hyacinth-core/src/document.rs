//! Parsed response documents.
//!
//! XML-like response bodies are parsed into a DOM for `responseXML`. HTML
//! goes through `html5ever`, every other XML type through `xml5ever`; both
//! build the same `markup5ever_rcdom` tree.

use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::fmt;

/// Which parser produced a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Parsed as HTML.
    Html,
    /// Parsed as XML.
    Xml,
}

/// A parsed markup document.
#[derive(Clone)]
pub struct Document {
    root: Handle,
    kind: DocumentKind,
}

impl Document {
    /// Parses `text` as HTML.
    #[must_use]
    pub fn parse_html(text: &str) -> Self {
        let dom = html5ever::parse_document(RcDom::default(), Default::default()).one(text);
        Self {
            root: dom.document,
            kind: DocumentKind::Html,
        }
    }

    /// Parses `text` as XML.
    #[must_use]
    pub fn parse_xml(text: &str) -> Self {
        let dom = xml5ever::driver::parse_document(RcDom::default(), Default::default()).one(text);
        Self {
            root: dom.document,
            kind: DocumentKind::Xml,
        }
    }

    /// Parses `text` with the parser matching `mime`.
    ///
    /// Returns `None` when `mime` is not XML-like.
    #[must_use]
    pub fn parse_for_mime(text: &str, mime: &str) -> Option<Self> {
        let essence = mime_essence(mime);
        if essence == "text/html" {
            Some(Self::parse_html(text))
        } else if is_xml_mime(&essence) {
            Some(Self::parse_xml(text))
        } else {
            None
        }
    }

    /// Returns the parser that produced this document.
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Returns the document node.
    #[must_use]
    pub fn root(&self) -> &Handle {
        &self.root
    }

    /// Returns the local name of the root element.
    #[must_use]
    pub fn document_element_name(&self) -> Option<String> {
        self.root.children.borrow().iter().find_map(|child| match &child.data {
            NodeData::Element { name, .. } => Some(name.local.to_string()),
            _ => None,
        })
    }

    /// Returns every element named `tag`, in document order.
    #[must_use]
    pub fn elements_by_tag_name(&self, tag: &str) -> Vec<Handle> {
        let mut found = Vec::new();
        collect_elements(&self.root, tag, &mut found);
        found
    }

    /// Returns the concatenated text of every text node.
    #[must_use]
    pub fn text_content(&self) -> String {
        text_content(&self.root)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("kind", &self.kind)
            .field("document_element", &self.document_element_name())
            .finish()
    }
}

/// Returns the lowercase `type/subtype` part of a MIME type.
#[must_use]
pub fn mime_essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Returns true for MIME types whose bodies populate `responseXML`.
///
/// `application/xml`, `text/xml`, `text/html` and any `+xml` type qualify.
#[must_use]
pub fn is_xml_mime(mime: &str) -> bool {
    let essence = mime_essence(mime);
    matches!(
        essence.as_str(),
        "application/xml" | "text/xml" | "text/html"
    ) || essence.ends_with("+xml")
}

fn collect_elements(handle: &Handle, tag: &str, found: &mut Vec<Handle>) {
    for child in handle.children.borrow().iter() {
        if let NodeData::Element { name, .. } = &child.data {
            if name.local.as_ref() == tag {
                found.push(child.clone());
            }
        }
        collect_elements(child, tag, found);
    }
}

fn text_content(handle: &Handle) -> String {
    let mut result = String::new();
    if let NodeData::Text { contents } = &handle.data {
        result.push_str(&contents.borrow());
    }
    for child in handle.children.borrow().iter() {
        result.push_str(&text_content(child));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_xml_mime() {
        assert!(is_xml_mime("application/xml"));
        assert!(is_xml_mime("text/xml; charset=utf-8"));
        assert!(is_xml_mime("TEXT/HTML"));
        assert!(is_xml_mime("image/svg+xml"));
        assert!(!is_xml_mime("application/json"));
        assert!(!is_xml_mime("text/plain"));
    }

    #[test]
    fn test_parse_xml() {
        let doc = Document::parse_xml("<root><item>a</item><item>b</item></root>");
        assert_eq!(doc.kind(), DocumentKind::Xml);
        assert_eq!(doc.document_element_name().as_deref(), Some("root"));
        assert_eq!(doc.elements_by_tag_name("item").len(), 2);
        assert_eq!(doc.text_content(), "ab");
    }

    #[test]
    fn test_parse_html() {
        let doc = Document::parse_html("<p>hello</p>");
        assert_eq!(doc.kind(), DocumentKind::Html);
        assert_eq!(doc.document_element_name().as_deref(), Some("html"));
        assert_eq!(doc.elements_by_tag_name("p").len(), 1);
        assert_eq!(doc.text_content(), "hello");
    }

    #[test]
    fn test_parse_for_mime() {
        assert!(Document::parse_for_mime("<a/>", "application/atom+xml").is_some());
        assert_eq!(
            Document::parse_for_mime("<p>x</p>", "text/html; charset=utf-8")
                .map(|doc| doc.kind()),
            Some(DocumentKind::Html)
        );
        assert!(Document::parse_for_mime("{}", "application/json").is_none());
    }
}
