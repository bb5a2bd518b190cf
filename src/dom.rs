//! A small in-memory model of the host page.
//!
//! Only what the console widget touches is modelled: an element tree with
//! classes, raw HTML children, a vertical scroll position and the document's
//! fullscreen element.

use std::collections::HashMap;

/// Height every child of a scroll container contributes to its scroll height.
pub const LINE_HEIGHT_PX: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

#[derive(Debug, Clone)]
pub enum Node {
    Element(ElementId),
    Html(String),
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
    pub children: Vec<Node>,
    pub parent: Option<ElementId>,
    pub scroll_top: u32,
}

impl Element {
    fn new(tag: &str, classes: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            children: Vec::new(),
            parent: None,
            scroll_top: 0,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug, Default)]
pub struct Document {
    elements: HashMap<ElementId, Element>,
    next_id: u64,
    fullscreen: Option<ElementId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str, classes: &[&str]) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(id, Element::new(tag, classes));
        id
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if let Some(element) = self.elements.get_mut(&id) {
            if !element.has_class(class) {
                element.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, id: ElementId, class: &str) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.classes.retain(|c| c != class);
        }
    }

    pub fn append_element(
        &mut self,
        parent: ElementId,
        tag: &str,
        classes: &[&str],
    ) -> Option<ElementId> {
        self.insert_element(parent, tag, classes, false)
    }

    pub fn prepend_element(
        &mut self,
        parent: ElementId,
        tag: &str,
        classes: &[&str],
    ) -> Option<ElementId> {
        self.insert_element(parent, tag, classes, true)
    }

    fn insert_element(
        &mut self,
        parent: ElementId,
        tag: &str,
        classes: &[&str],
        front: bool,
    ) -> Option<ElementId> {
        if !self.contains(parent) {
            return None;
        }
        let child = self.create_element(tag, classes);
        if let Some(element) = self.elements.get_mut(&child) {
            element.parent = Some(parent);
        }
        let element = self.elements.get_mut(&parent)?;
        if front {
            element.children.insert(0, Node::Element(child));
        } else {
            element.children.push(Node::Element(child));
        }
        Some(child)
    }

    /// Appends a raw HTML fragment. Returns false if the element is gone.
    pub fn append_html(&mut self, id: ElementId, fragment: impl Into<String>) -> bool {
        match self.elements.get_mut(&id) {
            Some(element) => {
                element.children.push(Node::Html(fragment.into()));
                true
            }
            None => false,
        }
    }

    pub fn scroll_height(&self, id: ElementId) -> u32 {
        self.elements
            .get(&id)
            .map(|element| element.children.len() as u32 * LINE_HEIGHT_PX)
            .unwrap_or(0)
    }

    pub fn scroll_to(&mut self, id: ElementId, top: u32) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.scroll_top = top;
        }
    }

    pub fn scroll_top(&self, id: ElementId) -> u32 {
        self.elements.get(&id).map(|e| e.scroll_top).unwrap_or(0)
    }

    /// Removes an element and everything below it.
    pub fn remove(&mut self, id: ElementId) {
        let Some(element) = self.elements.remove(&id) else {
            return;
        };
        if let Some(parent) = element.parent.and_then(|p| self.elements.get_mut(&p)) {
            parent
                .children
                .retain(|node| !matches!(node, Node::Element(child) if *child == id));
        }
        for node in element.children {
            if let Node::Element(child) = node {
                if let Some(child_element) = self.elements.get_mut(&child) {
                    child_element.parent = None;
                }
                self.remove(child);
            }
        }
        if self.fullscreen == Some(id) {
            self.fullscreen = None;
        }
    }

    pub fn request_fullscreen(&mut self, id: ElementId) {
        if self.contains(id) {
            self.fullscreen = Some(id);
        }
    }

    pub fn exit_fullscreen(&mut self) {
        self.fullscreen = None;
    }

    pub fn fullscreen_element(&self) -> Option<ElementId> {
        self.fullscreen
    }

    /// Descendants of `root` carrying `class`, in document order.
    pub fn find_by_class(&self, root: ElementId, class: &str) -> Vec<ElementId> {
        let mut found = Vec::new();
        self.collect_by_class(root, class, &mut found);
        found
    }

    fn collect_by_class(&self, id: ElementId, class: &str, found: &mut Vec<ElementId>) {
        let Some(element) = self.elements.get(&id) else {
            return;
        };
        for node in &element.children {
            if let Node::Element(child) = node {
                if self.get(*child).is_some_and(|c| c.has_class(class)) {
                    found.push(*child);
                }
                self.collect_by_class(*child, class, found);
            }
        }
    }

    /// Raw HTML children of an element, in order.
    pub fn html_children(&self, id: ElementId) -> Vec<&str> {
        self.elements
            .get(&id)
            .map(|element| {
                element
                    .children
                    .iter()
                    .filter_map(|node| match node {
                        Node::Html(html) => Some(html.as_str()),
                        Node::Element(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn inner_html(&self, id: ElementId) -> String {
        let mut out = String::new();
        if let Some(element) = self.elements.get(&id) {
            for node in &element.children {
                match node {
                    Node::Html(html) => out.push_str(html),
                    Node::Element(child) => out.push_str(&self.outer_html(*child)),
                }
            }
        }
        out
    }

    pub fn outer_html(&self, id: ElementId) -> String {
        let Some(element) = self.elements.get(&id) else {
            return String::new();
        };
        let class_attr = if element.classes.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", element.classes.join(" "))
        };
        format!(
            "<{tag}{class_attr}>{inner}</{tag}>",
            tag = element.tag,
            inner = self.inner_html(id)
        )
    }
}
