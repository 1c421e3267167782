//! Parses HTML into the crate's DOM tree.
//!
//! It uses html5ever as the HTML parser and builds a DOM tree defined in the
//! `crate::dom::dom_tree` module. Only what stylesheet discovery needs is kept:
//! elements, attributes and text. Comments and processing instructions become
//! empty text nodes.

use crate::dom::dom_tree;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, NodeOrText, QuirksMode, TreeSink},
    LocalName, Namespace, QualName,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

type Handle = Rc<RefCell<dom_tree::Node>>;

/// Creates a DOM tree from the provided HTML content.
pub fn create_dom_tree(html_content: &str) -> dom_tree::Document {
    let tree_sink = PageTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(html_content.to_string())
}

/// A custom TreeSink for building the DOM tree used by the parser.
///
/// It holds the Document being built, the current quirks mode, and a side table from each
/// attached node to its parent so the parser can move nodes around.
pub struct PageTreeSink {
    document: dom_tree::Document,
    quirks_mode: RefCell<QuirksMode>,
    parents: RefCell<HashMap<*const RefCell<dom_tree::Node>, Weak<RefCell<dom_tree::Node>>>>,
}

impl PageTreeSink {
    pub fn new() -> Self {
        Self {
            document: dom_tree::new_document(),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
            parents: RefCell::new(HashMap::new()),
        }
    }

    fn parent_of(&self, node: &Handle) -> Option<Handle> {
        self.parents
            .borrow()
            .get(&Rc::as_ptr(node))
            .and_then(Weak::upgrade)
    }

    fn set_parent(&self, node: &Handle, parent: &Handle) {
        self.parents
            .borrow_mut()
            .insert(Rc::as_ptr(node), Rc::downgrade(parent));
    }
}

impl Default for PageTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct PageElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for PageElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

fn children_mut(node: &mut dom_tree::Node) -> Option<&mut Vec<Handle>> {
    match node {
        dom_tree::Node::DocumentRoot(root) => Some(&mut root.children),
        dom_tree::Node::Element(element) => Some(&mut element.children),
        // Text nodes cannot have children.
        dom_tree::Node::Text(_) => None,
    }
}

/// Inserts `child` into `children` at `position`, merging it into the preceding text node
/// when both are text. Returns the inserted node, or `None` when the text was merged.
fn insert_child(
    children: &mut Vec<Handle>,
    position: usize,
    child: NodeOrText<Handle>,
) -> Option<Handle> {
    let node = match child {
        NodeOrText::AppendNode(node) => node,
        NodeOrText::AppendText(text) => {
            if let Some(previous) = position.checked_sub(1).and_then(|i| children.get(i)) {
                if let dom_tree::Node::Text(ref mut existing) = *previous.borrow_mut() {
                    existing.push_str(&text);
                    return None;
                }
            }
            Rc::new(RefCell::new(dom_tree::Node::Text(text.to_string())))
        }
    };
    children.insert(position, node.clone());
    Some(node)
}

impl TreeSink for PageTreeSink {
    type Handle = Rc<RefCell<dom_tree::Node>>;
    type Output = dom_tree::Document;
    type ElemName<'a>
        = PageElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self.document
    }

    fn parse_error(&self, msg: std::borrow::Cow<'static, str>) {
        log::trace!("html parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document.root.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match &*target.borrow() {
            dom_tree::Node::Element(elem) => PageElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            // html5ever only asks for names of handles it created as elements.
            _ => PageElemName {
                ns: Namespace::from(""),
                local: LocalName::from(""),
            },
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        flags: html5ever::interface::ElementFlags,
    ) -> Self::Handle {
        let mut element = dom_tree::ElementNode::new(name.local.to_string(), name);
        element.attributes = attrs
            .into_iter()
            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
            .collect();
        if flags.template {
            element.template_contents = Some(dom_tree::new_fragment());
        }
        Rc::new(RefCell::new(dom_tree::Node::Element(element)))
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(dom_tree::Node::Text(String::new())))
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(dom_tree::Node::Text(String::new())))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let inserted = match children_mut(&mut parent.borrow_mut()) {
            Some(children) => {
                let end = children.len();
                insert_child(children, end, child)
            }
            None => None,
        };
        if let Some(node) = inserted {
            self.set_parent(&node, parent);
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if self.parent_of(element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        *self.document.doctype.borrow_mut() = Some(dom_tree::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
    }

    fn mark_script_already_started(&self, _node: &Self::Handle) {}

    fn pop(&self, _node: &Self::Handle) {}

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        match &mut *target.borrow_mut() {
            dom_tree::Node::Element(element) => element
                .template_contents
                .get_or_insert_with(dom_tree::new_fragment)
                .clone(),
            _ => dom_tree::new_fragment(),
        }
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let Some(parent) = self.parent_of(sibling) else {
            return;
        };
        let inserted = match children_mut(&mut parent.borrow_mut()) {
            Some(children) => children
                .iter()
                .position(|c| Rc::ptr_eq(c, sibling))
                .and_then(|position| insert_child(children, position, child)),
            None => None,
        };
        if let Some(node) = inserted {
            self.set_parent(&node, &parent);
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<html5ever::Attribute>) {
        if let dom_tree::Node::Element(elem) = &mut *target.borrow_mut() {
            for attr in attrs {
                let key = attr.name.local.to_string();
                if !elem.attributes.iter().any(|(k, _)| k == &key) {
                    elem.attributes.push((key, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        let Some(parent) = self.parent_of(target) else {
            return;
        };
        self.parents.borrow_mut().remove(&Rc::as_ptr(target));
        if let Some(children) = children_mut(&mut parent.borrow_mut()) {
            children.retain(|c| !Rc::ptr_eq(c, target));
        };
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let moved = match children_mut(&mut node.borrow_mut()) {
            Some(children) => std::mem::take(children),
            None => return,
        };
        for child in &moved {
            self.set_parent(child, new_parent);
        }
        if let Some(children) = children_mut(&mut new_parent.borrow_mut()) {
            children.extend(moved);
        }
    }
}
