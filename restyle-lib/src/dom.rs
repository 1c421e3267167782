use html5ever::QualName;
use std::cell::RefCell;
use std::rc::Rc;

pub mod dom_tree {
    use super::*;

    #[derive(Debug, Clone)]
    pub enum Node {
        DocumentRoot(DocumentRootNode),
        Element(ElementNode),
        Text(String),
    }

    #[derive(Debug, Clone)]
    pub struct DocumentRootNode {
        pub children: Vec<Rc<RefCell<Node>>>,
    }

    #[derive(Debug, Clone)]
    pub struct ElementNode {
        pub tag: String,
        pub qual_name: QualName,
        pub attributes: Vec<(String, String)>,
        pub children: Vec<Rc<RefCell<Node>>>,
        /// Inert content of a `<template>` element, kept out of `children`.
        pub template_contents: Option<Rc<RefCell<Node>>>,
    }

    #[derive(Debug)]
    pub struct Document {
        pub root: Rc<RefCell<Node>>,
        pub doctype: RefCell<Option<Doctype>>,
    }

    #[derive(Debug)]
    pub struct Doctype {
        pub name: String,
        pub public_id: String,
        pub system_id: String,
    }

    /// Where a stylesheet attached to the document comes from.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum SheetRef {
        /// Text of a `<style>` element.
        Inline(String),
        /// `href` of a `<link rel="stylesheet">` element, unresolved.
        Linked(String),
    }

    impl DocumentRootNode {
        pub fn new() -> Self {
            DocumentRootNode {
                children: Vec::new(),
            }
        }
    }

    impl Default for DocumentRootNode {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ElementNode {
        pub fn new(tag: String, qual_name: QualName) -> Self {
            ElementNode {
                tag,
                qual_name,
                attributes: Vec::new(),
                children: Vec::new(),
                template_contents: None,
            }
        }

        pub fn attribute(&self, name: &str) -> Option<&str> {
            self.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        /// Concatenated text of the direct text children.
        pub fn text_content(&self) -> String {
            let mut text = String::new();
            for child in &self.children {
                if let Node::Text(t) = &*child.borrow() {
                    text.push_str(t);
                }
            }
            text
        }

        fn is_stylesheet_link(&self) -> bool {
            self.tag.eq_ignore_ascii_case("link")
                && self.attribute("rel").is_some_and(|rel| {
                    rel.split_ascii_whitespace()
                        .any(|r| r.eq_ignore_ascii_case("stylesheet"))
                })
        }
    }

    impl Document {
        /// Every stylesheet attached to the document, in document order.
        pub fn style_sheets(&self) -> Vec<SheetRef> {
            let mut sheets = Vec::new();
            collect_sheets(&self.root, &mut sheets);
            sheets
        }

        /// Trimmed text of the first `<title>` element, if any.
        pub fn title(&self) -> Option<String> {
            find_title(&self.root)
        }
    }

    fn collect_sheets(node: &Rc<RefCell<Node>>, sheets: &mut Vec<SheetRef>) {
        match &*node.borrow() {
            Node::DocumentRoot(root) => {
                for child in &root.children {
                    collect_sheets(child, sheets);
                }
            }
            Node::Element(elem) => {
                if elem.tag.eq_ignore_ascii_case("style") {
                    sheets.push(SheetRef::Inline(elem.text_content()));
                    return;
                }
                if elem.is_stylesheet_link() {
                    if let Some(href) = elem.attribute("href") {
                        sheets.push(SheetRef::Linked(href.to_string()));
                    }
                }
                for child in &elem.children {
                    collect_sheets(child, sheets);
                }
            }
            Node::Text(_) => {}
        }
    }

    fn find_title(node: &Rc<RefCell<Node>>) -> Option<String> {
        match &*node.borrow() {
            Node::DocumentRoot(root) => root.children.iter().find_map(find_title),
            Node::Element(elem) => {
                if elem.tag.eq_ignore_ascii_case("title") {
                    return Some(elem.text_content().trim().to_string());
                }
                elem.children.iter().find_map(find_title)
            }
            Node::Text(_) => None,
        }
    }

    /// A parentless container node, used for documents and template fragments.
    pub fn new_fragment() -> Rc<RefCell<Node>> {
        Rc::new(RefCell::new(Node::DocumentRoot(DocumentRootNode::new())))
    }

    pub fn new_document() -> Document {
        Document {
            root: new_fragment(),
            doctype: RefCell::new(None),
        }
    }
}
