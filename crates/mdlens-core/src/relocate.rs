//! Relocates a remembered passage inside freshly rendered content.
//!
//! A search hit carries a short preview of the text around the match. After
//! the document is rendered again, the preview is matched against every run
//! of up to [`MAX_WINDOW`] consecutive blocks. A run is only eligible when it
//! contains every query token; eligible runs are ranked by how many preview
//! tokens they reproduce in order.

use crate::blocks::Block;
use crate::text::normalize;

pub const MAX_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// No context was supplied; the whole document is the target.
    WholeDocument,
    /// Inclusive block range.
    Range { start: usize, end: usize },
}

impl Window {
    /// The blocks covered by a range window, clamped to `blocks`. An inverted
    /// range selects nothing.
    /// `WholeDocument` selects nothing here; callers use the document root.
    #[must_use]
    pub fn select<'a>(&self, blocks: &'a [Block]) -> &'a [Block] {
        match *self {
            Self::WholeDocument => &[],
            Self::Range { start, end } => {
                if start > end || start >= blocks.len() {
                    return &[];
                }
                &blocks[start..=end.min(blocks.len() - 1)]
            }
        }
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        match *self {
            Self::WholeDocument => true,
            Self::Range { start, end } => (start..=end).contains(&index),
        }
    }
}

/// Picks the window of blocks that best matches `context_text`.
///
/// Ties keep the earliest window. When no window contains all query tokens
/// the result is the first block, `Range { start: 0, end: 0 }`.
#[must_use]
pub fn locate<S: AsRef<str>>(context_text: &str, query_tokens: &[S], blocks: &[Block]) -> Window {
    let context = normalize(context_text);
    if context.is_empty() {
        return Window::WholeDocument;
    }

    let target = context.len() as i64;
    let mut best = Window::Range { start: 0, end: 0 };
    let mut best_score: i64 = -1;

    for start in 0..blocks.len() {
        let mut joined: Vec<&str> = Vec::new();
        for end in start..blocks.len().min(start + MAX_WINDOW) {
            joined.extend(blocks[end].tokens.iter().map(String::as_str));
            let score = ordered_match_score(&context, &joined, query_tokens) as i64;
            if score > best_score {
                best_score = score;
                best = Window::Range { start, end };
            }
            if score == target {
                break;
            }
        }
        if best_score == target {
            break;
        }
    }

    tracing::debug!(?best, best_score, blocks = blocks.len(), "relocated context window");
    best
}

/// Ordered subsequence score of `context` inside `joined`, seeded at 1.
/// Zero when some query token is not a substring of any joined token.
#[must_use]
pub fn ordered_match_score<S: AsRef<str>>(
    context: &[String],
    joined: &[&str],
    query_tokens: &[S],
) -> usize {
    let gate_passes = query_tokens.iter().all(|query| {
        joined
            .iter()
            .any(|token| token.contains(query.as_ref()))
    });
    if !gate_passes {
        return 0;
    }

    let mut score = 1;
    let mut ci = 0;
    for token in joined {
        if ci == context.len() {
            break;
        }
        if context[ci] == *token {
            score += 1;
            ci += 1;
        }
    }
    score
}
