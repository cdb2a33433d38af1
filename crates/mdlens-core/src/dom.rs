//! Arena-backed document tree used as the viewer's display surface.
//!
//! Node ids carry the generation of the render that created them. Loading new
//! content bumps the generation, so any id held across a reload (pending
//! highlight timers, stale focus targets) resolves to nothing instead of
//! aliasing a node of the new render.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::text::escape_html;

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input"];
const BLOCK_TAGS: &[&str] = &[
    "address",
    "blockquote",
    "dd",
    "div",
    "dl",
    "dt",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "hr",
    "li",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tbody",
    "td",
    "th",
    "thead",
    "tr",
    "ul",
];

/// Serializable node tree. This is the wire form of a rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Markup {
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        attrs: Vec<(String, String)>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<Markup>,
    },
    Text {
        text: String,
    },
}

impl Markup {
    #[must_use]
    pub fn element(tag: impl Into<String>, children: Vec<Markup>) -> Self {
        Self::Element {
            tag: tag.into(),
            attrs: Vec::new(),
            children,
        }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Serializes a fragment to HTML.
#[must_use]
pub fn markup_to_html(nodes: &[Markup]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_markup(node, &mut out);
    }
    out
}

fn write_markup(node: &Markup, out: &mut String) {
    match node {
        Markup::Text { text } => out.push_str(&escape_html(text)),
        Markup::Element {
            tag,
            attrs,
            children,
        } => {
            write_open_tag(tag, attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())), out);
            if VOID_TAGS.contains(&tag.as_str()) {
                return;
            }
            for child in children {
                write_markup(child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn write_open_tag<'a>(
    tag: &str,
    attrs: impl Iterator<Item = (&'a str, &'a str)>,
    out: &mut String,
) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_html(value).replace('"', "&quot;"));
        out.push('"');
    }
    out.push('>');
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    generation: u64,
    index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub classes: Vec<String>,
    pub style: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

#[derive(Debug, Clone)]
pub struct Document {
    generation: u64,
    nodes: Vec<Node>,
    root: NodeId,
    root_tag: String,
    root_id: Option<String>,
}

impl Document {
    /// Creates an empty document whose root is `<root_tag id="root_id">`.
    #[must_use]
    pub fn new(root_tag: &str, root_id: Option<&str>) -> Self {
        let mut doc = Self {
            generation: 0,
            nodes: Vec::new(),
            root: NodeId {
                generation: 0,
                index: 0,
            },
            root_tag: root_tag.to_string(),
            root_id: root_id.map(str::to_string),
        };
        doc.reset();
        doc
    }

    #[must_use]
    pub fn from_markup(root_tag: &str, root_id: Option<&str>, fragment: &[Markup]) -> Self {
        let mut doc = Self::new(root_tag, root_id);
        doc.load(fragment);
        doc
    }

    /// Replaces the whole content with `fragment`. Ids from before the call
    /// become stale.
    pub fn load(&mut self, fragment: &[Markup]) {
        self.reset();
        let root = self.root;
        for node in fragment {
            let child = self.build(node);
            self.append_child(root, child);
        }
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.nodes.clear();
        let mut attrs = Vec::new();
        if let Some(id) = &self.root_id {
            attrs.push(("id".to_string(), id.clone()));
        }
        self.root = self.push(NodeData::Element(Element {
            tag: self.root_tag.clone(),
            attrs,
            classes: Vec::new(),
            style: BTreeMap::new(),
        }));
    }

    fn build(&mut self, markup: &Markup) -> NodeId {
        match markup {
            Markup::Text { text } => self.create_text(text),
            Markup::Element {
                tag,
                attrs,
                children,
            } => {
                let id = self.create_element(tag);
                for (name, value) in attrs {
                    self.set_attr(id, name, value);
                }
                for child in children {
                    let child = self.build(child);
                    self.append_child(id, child);
                }
                id
            }
        }
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId {
            generation: self.generation,
            index: self.nodes.len(),
        };
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        if id.generation != self.generation {
            return None;
        }
        self.nodes.get(id.index)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.generation != self.generation {
            return None;
        }
        self.nodes.get_mut(id.index)
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.node(id)?.data {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// True when `id` belongs to the current render.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// True when `id` belongs to the current render and is reachable from the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cursor = id;
        loop {
            if cursor == self.root {
                return self.contains(id);
            }
            match self.node(cursor).and_then(|node| node.parent) {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            classes: Vec::new(),
            style: BTreeMap::new(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    /// Appends `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) || parent == child {
            return;
        }
        self.detach(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    /// Removes `id` from its parent. The subtree stays in the arena, detached.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).and_then(|node| node.parent) else {
            return;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|child| *child != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    /// Splices `replacements` into the position of `old`, which is detached.
    /// Siblings of `old` are left untouched.
    pub fn replace_with(&mut self, old: NodeId, replacements: &[NodeId]) -> bool {
        let Some(parent) = self.node(old).and_then(|node| node.parent) else {
            return false;
        };
        for replacement in replacements.iter().filter(|r| **r != old) {
            self.detach(*replacement);
        }
        let Some(position) = self
            .node(parent)
            .and_then(|node| node.children.iter().position(|child| *child == old))
        else {
            return false;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children
                .splice(position..=position, replacements.iter().copied());
        }
        for replacement in replacements {
            if let Some(node) = self.node_mut(*replacement) {
                node.parent = Some(parent);
            }
        }
        if let Some(node) = self.node_mut(old) {
            node.parent = None;
        }
        true
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.node(id).map(|node| &node.data)
    }

    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag.as_str())
    }

    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Text(text) => Some(text.as_str()),
            NodeData::Element(_) => None,
        }
    }

    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute. `class` is split into the class list.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if name == "class" {
            for class in value.split_whitespace() {
                self.add_class(id, class);
            }
            return;
        }
        let Some(element) = self.element_mut(id) else {
            return;
        };
        match element.attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => element.attrs.push((name.to_string(), value.to_string())),
        }
    }

    #[must_use]
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id)
            .is_some_and(|element| element.classes.iter().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(element) = self.element_mut(id)
            && !element.classes.iter().any(|c| c == class)
        {
            element.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(element) = self.element_mut(id) {
            element.classes.retain(|c| c != class);
        }
    }

    /// Returns whether the class is present after toggling.
    pub fn toggle_class(&mut self, id: NodeId, class: &str) -> bool {
        if self.has_class(id, class) {
            self.remove_class(id, class);
            false
        } else {
            self.add_class(id, class);
            self.has_class(id, class)
        }
    }

    #[must_use]
    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.element(id)?.style.get(property).map(String::as_str)
    }

    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            if value.is_empty() {
                element.style.remove(property);
            } else {
                element
                    .style
                    .insert(property.to_string(), value.to_string());
            }
        }
    }

    /// Pre-order descendants of `id`, excluding `id` itself.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = self.children(id);
        stack.reverse();
        while let Some(next) = stack.pop() {
            out.push(next);
            let mut children = self.children(next);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Descendant elements of `id` whose tag is one of `tags`, in document order.
    #[must_use]
    pub fn select_tags(&self, id: NodeId, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|node| self.tag(*node).is_some_and(|tag| tags.contains(&tag)))
            .collect()
    }

    /// First attached element carrying the `id` attribute `element_id`.
    #[must_use]
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|node| self.attr(*node, "id") == Some(element_id))
    }

    /// Rendered text, with block-level boundaries turned into line breaks.
    #[must_use]
    pub fn inner_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_text(id, &mut out);
        out.trim().to_string()
    }

    fn write_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element(element) => {
                let tag = element.tag.as_str();
                if tag == "br" {
                    out.push('\n');
                    return;
                }
                if matches!(tag, "script" | "style") {
                    return;
                }
                let is_block = BLOCK_TAGS.contains(&tag);
                if is_block && !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                for child in &node.children {
                    self.write_text(*child, out);
                }
                if is_block && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }

    /// Serialized children of `id`.
    #[must_use]
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_html(child, &mut out);
        }
        out
    }

    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => out.push_str(&escape_html(text)),
            NodeData::Element(element) => {
                let class = element.classes.join(" ");
                let style = element
                    .style
                    .iter()
                    .map(|(key, value)| format!("{key}: {value}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                let extra = [("class", class.as_str()), ("style", style.as_str())];
                let attrs = element
                    .attrs
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .chain(extra.into_iter().filter(|(_, value)| !value.is_empty()));
                write_open_tag(&element.tag, attrs, out);
                if VOID_TAGS.contains(&element.tag.as_str()) {
                    return;
                }
                for child in &node.children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
        }
    }
}
