use crate::dom::{Document, NodeId};
use crate::text::normalize;

/// Tags collected as relocation blocks. Nested matches are collected too, so a
/// cell and its row both appear.
pub const BLOCK_SELECTOR: &[&str] = &[
    "p", "li", "pre", "div", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "td", "th",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub node: NodeId,
    pub tokens: Vec<String>,
}

/// Block-level descendants of `root` in document order, each with its
/// normalized token sequence.
#[must_use]
pub fn collect_blocks(document: &Document, root: NodeId) -> Vec<Block> {
    document
        .select_tags(root, BLOCK_SELECTOR)
        .into_iter()
        .map(|node| Block {
            node,
            tokens: normalize(&document.inner_text(node)),
        })
        .collect()
}
