//! File tree and table-of-contents projection into the sidebar.

use std::collections::HashMap;
use std::iter::Peekable;
use std::vec::IntoIter;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dom::{Document, NodeId};

pub const TREE_CLASS: &str = "tree";
pub const TREE_ENTRY_CLASS: &str = "tree-entry";
pub const TREE_COLLAPSED_CLASS: &str = "tree-collapsed";
pub const NESTED_CLASS: &str = "nested";
const TREE_DEPTH_PROPERTY: &str = "--tree-depth";
const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// One entry of the served directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeItem {
    Directory {
        name: String,
        #[serde(default)]
        children: Vec<TreeItem>,
    },
    File {
        name: String,
        path: String,
    },
}

impl TreeItem {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Directory { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Parses a listing leniently: entries missing a required field are logged
/// and skipped, the rest of the tree is kept.
#[must_use]
pub fn parse_listing(value: &Value) -> Vec<TreeItem> {
    let Some(entries) = value.as_array() else {
        tracing::warn!("tree listing is not an array");
        return Vec::new();
    };
    entries.iter().filter_map(parse_entry).collect()
}

fn parse_entry(entry: &Value) -> Option<TreeItem> {
    let name = entry.get("name").and_then(Value::as_str);
    match entry.get("type").and_then(Value::as_str) {
        Some("directory") => {
            let Some(name) = name else {
                tracing::warn!(%entry, "skipping directory entry without a name");
                return None;
            };
            let children = entry
                .get("children")
                .map(parse_listing)
                .unwrap_or_default();
            Some(TreeItem::Directory {
                name: name.to_string(),
                children,
            })
        }
        Some("file") => {
            let path = entry.get("path").and_then(Value::as_str);
            match (name, path) {
                (Some(name), Some(path)) => Some(TreeItem::File {
                    name: name.to_string(),
                    path: path.to_string(),
                }),
                _ => {
                    tracing::warn!(%entry, "skipping file entry without a name or path");
                    None
                }
            }
        }
        other => {
            tracing::warn!(kind = ?other, "skipping tree entry of unknown type");
            None
        }
    }
}

/// File paths of `items`, depth-first.
#[must_use]
pub fn flatten_files(items: &[TreeItem]) -> Vec<String> {
    let mut out = Vec::new();
    collect_files(items, &mut out);
    out
}

fn collect_files(items: &[TreeItem], out: &mut Vec<String>) {
    for item in items {
        match item {
            TreeItem::Directory { children, .. } => collect_files(children, out),
            TreeItem::File { path, .. } => out.push(path.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub id: String,
    pub level: u8,
    pub title: String,
    pub children: Vec<TocEntry>,
}

/// Assigns `toc-h{level}-{index}` ids to every heading of the document and
/// nests them by level.
pub fn build_toc(document: &mut Document) -> Vec<TocEntry> {
    let root = document.root();
    let headings = document.select_tags(root, HEADING_TAGS);
    let mut flat = Vec::with_capacity(headings.len());
    for (index, heading) in headings.into_iter().enumerate() {
        let level = document
            .tag(heading)
            .and_then(|tag| tag.strip_prefix('h'))
            .and_then(|digit| digit.parse::<u8>().ok())
            .unwrap_or(1);
        let id = format!("toc-h{level}-{index}");
        document.set_attr(heading, "id", &id);
        flat.push(TocEntry {
            id,
            level,
            title: document.inner_text(heading),
            children: Vec::new(),
        });
    }

    nest(&mut flat.into_iter().peekable(), 0)
}

/// Consumes every entry deeper than `parent_level` as children.
fn nest(flat: &mut Peekable<IntoIter<TocEntry>>, parent_level: u8) -> Vec<TocEntry> {
    let mut out = Vec::new();
    while let Some(next) = flat.peek() {
        if next.level <= parent_level {
            break;
        }
        let Some(mut entry) = flat.next() else {
            break;
        };
        entry.children = nest(flat, entry.level);
        out.push(entry);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeAction {
    ToggleDirectory,
    OpenFile { path: String },
    ScrollToHeading { id: String },
}

/// A rendered sidebar tree plus the actions bound to its entries.
#[derive(Debug)]
pub struct TreeView {
    document: Document,
    actions: HashMap<NodeId, TreeAction>,
}

impl TreeView {
    #[must_use]
    pub fn new(container_id: &str) -> Self {
        Self {
            document: Document::new("div", Some(container_id)),
            actions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Replaces the view with the directory tree. Directories start collapsed.
    pub fn render(&mut self, items: &[TreeItem]) {
        self.reset();
        let list = self.list(self.document.root(), TREE_CLASS);
        self.render_items(list, items, 0);
    }

    /// Replaces the view with a table of contents.
    pub fn render_toc(&mut self, entries: &[TocEntry]) {
        self.reset();
        let root = self.document.root();
        if entries.is_empty() {
            let placeholder = self.document.create_element("div");
            self.document.add_class(placeholder, "toc-empty");
            let text = self.document.create_text("No headings found");
            self.document.append_child(placeholder, text);
            self.document.append_child(root, placeholder);
            return;
        }
        let list = self.list(root, TREE_CLASS);
        self.render_toc_entries(list, entries, 0);
    }

    #[must_use]
    pub fn action(&self, entry: NodeId) -> Option<&TreeAction> {
        self.actions.get(&entry)
    }

    /// Runs the local part of an entry's action and hands the action back.
    /// Directories toggle in place; opening files and scrolling are up to
    /// the caller.
    pub fn activate(&mut self, entry: NodeId) -> Option<TreeAction> {
        let action = self.actions.get(&entry)?.clone();
        if action == TreeAction::ToggleDirectory
            && let Some(item) = self.document.parent(entry)
        {
            self.document.toggle_class(item, TREE_COLLAPSED_CLASS);
        }
        Some(action)
    }

    #[must_use]
    pub fn is_collapsed(&self, entry: NodeId) -> bool {
        self.document
            .parent(entry)
            .is_some_and(|item| self.document.has_class(item, TREE_COLLAPSED_CLASS))
    }

    /// Entry anchors in document order, with their labels.
    #[must_use]
    pub fn entries(&self) -> Vec<(NodeId, String)> {
        self.document
            .descendants(self.document.root())
            .into_iter()
            .filter(|node| self.document.has_class(*node, TREE_ENTRY_CLASS))
            .map(|node| (node, self.document.inner_text(node)))
            .collect()
    }

    #[must_use]
    pub fn entry_named(&self, label: &str) -> Option<NodeId> {
        self.entries()
            .into_iter()
            .find(|(_, text)| text == label)
            .map(|(node, _)| node)
    }

    fn reset(&mut self) {
        self.document.load(&[]);
        self.actions.clear();
    }

    fn list(&mut self, parent: NodeId, class: &str) -> NodeId {
        let list = self.document.create_element("ul");
        self.document.add_class(list, class);
        self.document.append_child(parent, list);
        list
    }

    fn entry(
        &mut self,
        list: NodeId,
        label: &str,
        depth: usize,
        collapsed: bool,
    ) -> (NodeId, NodeId) {
        let item = self.document.create_element("li");
        self.document.add_class(item, TREE_CLASS);
        if collapsed {
            self.document.add_class(item, TREE_COLLAPSED_CLASS);
        }
        let anchor = self.document.create_element("a");
        self.document.add_class(anchor, TREE_ENTRY_CLASS);
        self.document
            .set_style(anchor, TREE_DEPTH_PROPERTY, &depth.to_string());
        let text = self.document.create_text(label);
        self.document.append_child(anchor, text);
        self.document.append_child(item, anchor);
        self.document.append_child(list, item);
        (item, anchor)
    }

    fn render_items(&mut self, list: NodeId, items: &[TreeItem], depth: usize) {
        for item in items {
            match item {
                TreeItem::Directory { name, children } => {
                    let (li, anchor) = self.entry(list, name, depth, true);
                    self.actions.insert(anchor, TreeAction::ToggleDirectory);
                    if !children.is_empty() {
                        let nested = self.list(li, NESTED_CLASS);
                        self.render_items(nested, children, depth + 1);
                    }
                }
                TreeItem::File { name, path } => {
                    let (_, anchor) = self.entry(list, name, depth, false);
                    self.actions
                        .insert(anchor, TreeAction::OpenFile { path: path.clone() });
                }
            }
        }
    }

    fn render_toc_entries(&mut self, list: NodeId, entries: &[TocEntry], depth: usize) {
        for entry in entries {
            let (li, anchor) = self.entry(list, &entry.title, depth, false);
            self.actions.insert(
                anchor,
                TreeAction::ScrollToHeading {
                    id: entry.id.clone(),
                },
            );
            if !entry.children.is_empty() {
                let nested = self.list(li, NESTED_CLASS);
                self.render_toc_entries(nested, &entry.children, depth + 1);
            }
        }
    }
}
