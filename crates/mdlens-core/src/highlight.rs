use crate::dom::{Document, NodeData, NodeId};
use crate::text::word_pattern;

pub const MARKER_TAG: &str = "span";
pub const MARKER_CLASS: &str = "temp-highlight";

/// Elements whose text is never rewritten: scripts, styles and spans. Spans
/// cover existing markers, so a second pass cannot wrap a marker again.
const OPAQUE_TAGS: &[&str] = &["script", "style", MARKER_TAG];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightOutcome {
    /// Markers in document order.
    pub markers: Vec<NodeId>,
    /// The marker to scroll to, if any was created.
    pub focus: Option<NodeId>,
}

/// Wraps every word containing a query token (case-insensitive) found in
/// text under `roots` in a marker element. Casing of the text is kept.
pub fn highlight<S: AsRef<str>>(
    document: &mut Document,
    roots: &[NodeId],
    query_tokens: &[S],
) -> HighlightOutcome {
    let Some(pattern) = word_pattern(query_tokens) else {
        return HighlightOutcome::default();
    };

    let mut markers = Vec::new();
    for root in roots {
        for text_node in text_runs(document, *root) {
            let Some(text) = document.text(text_node).map(str::to_string) else {
                continue;
            };
            let mut parts = Vec::new();
            let mut last = 0;
            for found in pattern.find_iter(&text) {
                if found.start() > last {
                    parts.push(document.create_text(&text[last..found.start()]));
                }
                let marker = document.create_element(MARKER_TAG);
                document.add_class(marker, MARKER_CLASS);
                let content = document.create_text(found.as_str());
                document.append_child(marker, content);
                parts.push(marker);
                markers.push(marker);
                last = found.end();
            }
            if parts.is_empty() {
                continue;
            }
            if last < text.len() {
                parts.push(document.create_text(&text[last..]));
            }
            document.replace_with(text_node, &parts);
        }
    }

    let focus = markers.first().copied();
    tracing::debug!(markers = markers.len(), roots = roots.len(), "highlighted query tokens");
    HighlightOutcome { markers, focus }
}

/// Non-blank text nodes under `root`, skipping opaque elements.
fn text_runs(document: &Document, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    collect_text_runs(document, root, &mut out);
    out
}

fn collect_text_runs(document: &Document, node: NodeId, out: &mut Vec<NodeId>) {
    match document.data(node) {
        Some(NodeData::Text(text)) => {
            if !text.trim().is_empty() {
                out.push(node);
            }
        }
        Some(NodeData::Element(element)) => {
            if OPAQUE_TAGS.contains(&element.tag.as_str()) {
                return;
            }
            for child in document.children(node) {
                collect_text_runs(document, child, out);
            }
        }
        None => {}
    }
}
