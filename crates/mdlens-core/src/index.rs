//! In-memory line index over the markdown files of a document root.

use std::fs;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::config::IndexConfig;
use crate::error::Result;
use crate::fs::DocumentRoot;

const WORD_CONTEXT_LINES: usize = 2;

/// A content search hit. `preview` is the raw block of lines that matched,
/// `lineno` is the 1-based line where it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextHit {
    pub path: String,
    pub preview: String,
    #[serde(default)]
    pub lineno: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    files: Vec<(String, String)>,
}

impl ContentIndex {
    /// Reads every markdown document under `root`. Unreadable files are
    /// indexed as empty.
    pub fn index_directory(root: &DocumentRoot) -> Result<Self> {
        let mut files = Vec::new();
        for (relative, absolute) in root.documents()? {
            let content = fs::read_to_string(&absolute).unwrap_or_else(|err| {
                tracing::warn!(
                    path = %relative,
                    error = %err,
                    "indexing unreadable document as empty"
                );
                String::new()
            });
            files.push((relative, content));
        }
        tracing::info!(files = files.len(), root = %root.path().display(), "content index built");
        Ok(Self { files })
    }

    #[must_use]
    pub fn from_documents(files: Vec<(String, String)>) -> Self {
        Self { files }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Blocks of `block_size` consecutive lines that contain every word
    /// (case-insensitive substring). After a hit the scan resumes right
    /// past the block, so hits within one file never overlap.
    #[must_use]
    pub fn context_search<S: AsRef<str>>(
        &self,
        words: &[S],
        block_size: usize,
        limit: usize,
    ) -> Vec<ContextHit> {
        let block_size = block_size.max(1);
        let words = words
            .iter()
            .map(|word| word.as_ref().to_lowercase())
            .collect::<Vec<_>>();
        let mut hits = Vec::new();
        if limit == 0 {
            return hits;
        }

        for (path, content) in &self.files {
            let lines = content.lines().collect::<Vec<_>>();
            let lowered = lines.iter().map(|line| line.to_lowercase()).collect::<Vec<_>>();
            let mut start = 0;
            while start + block_size <= lines.len() {
                let block = &lowered[start..start + block_size];
                let all_present = words
                    .iter()
                    .all(|word| block.iter().any(|line| line.contains(word.as_str())));
                if !all_present {
                    start += 1;
                    continue;
                }
                hits.push(ContextHit {
                    path: path.clone(),
                    preview: lines[start..start + block_size].join("\n"),
                    lineno: start + 1,
                });
                if hits.len() >= limit {
                    return hits;
                }
                start += block_size;
            }
        }
        hits
    }

    /// Whole-word search for a single word with two lines of context on each
    /// side. Queries containing whitespace match nothing.
    #[must_use]
    pub fn search(&self, word: &str, limit: usize) -> Vec<ContextHit> {
        let word = word.trim();
        if word.is_empty() || word.contains(char::is_whitespace) || limit == 0 {
            return Vec::new();
        }
        let Ok(pattern) = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(word)))
            .case_insensitive(true)
            .build()
        else {
            return Vec::new();
        };

        let mut hits = Vec::new();
        for (path, content) in &self.files {
            let lines = content.lines().collect::<Vec<_>>();
            for (idx, line) in lines.iter().enumerate() {
                if !pattern.is_match(line) {
                    continue;
                }
                let start = idx.saturating_sub(WORD_CONTEXT_LINES);
                let end = (idx + WORD_CONTEXT_LINES + 1).min(lines.len());
                hits.push(ContextHit {
                    path: path.clone(),
                    preview: lines[start..end].join("\n"),
                    lineno: idx + 1,
                });
                if hits.len() >= limit {
                    return hits;
                }
            }
        }
        hits
    }

    /// Runs a content query the way the `/search` endpoint does: split on
    /// whitespace, then block search with the configured sizes.
    #[must_use]
    pub fn query(&self, query: &str, config: &IndexConfig) -> Vec<ContextHit> {
        let words = query.split_whitespace().collect::<Vec<_>>();
        if words.is_empty() {
            return Vec::new();
        }
        self.context_search(&words, config.context_block_size, config.context_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(files: &[(&str, &str)]) -> ContentIndex {
        ContentIndex::from_documents(
            files
                .iter()
                .map(|(path, content)| ((*path).to_string(), (*content).to_string()))
                .collect(),
        )
    }

    #[test]
    fn context_search_requires_every_word_in_one_block() {
        let idx = index(&[(
            "a.md",
            "alpha\nbeta\ngamma\ndelta\nepsilon\nzeta\neta\ntheta\niota\nkappa\nALPHA again\nlambda",
        )]);
        let hits = idx.context_search(&["alpha", "gamma"], 5, 20);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].lineno, 1);
        assert_eq!(hits[0].preview, "alpha\nbeta\ngamma\ndelta\nepsilon");

        assert!(idx.context_search(&["alpha", "lambda", "zeta"], 5, 20).is_empty());
    }

    #[test]
    fn context_search_jumps_past_a_hit() {
        let content = (1..=12).map(|n| format!("line {n} word")).collect::<Vec<_>>();
        let idx = index(&[("a.md", &content.join("\n"))]);
        let starts = idx
            .context_search(&["word"], 5, 20)
            .into_iter()
            .map(|hit| hit.lineno)
            .collect::<Vec<_>>();
        // Lines 11-12 do not fill a whole block.
        assert_eq!(starts, vec![1, 6]);
    }

    #[test]
    fn context_search_stops_at_limit_across_files() {
        let body = "x\nx\nx\nx\nx\nx\nx\nx\nx\nx";
        let idx = index(&[("a.md", body), ("b.md", body)]);
        let hits = idx.context_search(&["x"], 5, 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[2].path, "b.md");
    }

    #[test]
    fn short_files_yield_no_blocks() {
        let idx = index(&[("a.md", "needle\nhay")]);
        assert!(idx.context_search(&["needle"], 5, 20).is_empty());
        assert_eq!(idx.context_search(&["needle"], 2, 20).len(), 1);
    }

    #[test]
    fn word_search_matches_whole_words_with_context() {
        let idx = index(&[(
            "a.md",
            "one\ntwo\nthe Needle here\nfour\nfive\nsix\nneedles plural",
        )]);
        let hits = idx.search("needle", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].lineno, 3);
        assert_eq!(hits[0].preview, "one\ntwo\nthe Needle here\nfour\nfive");
        assert!(idx.search("two words", 10).is_empty());
        assert!(idx.search("   ", 10).is_empty());
    }

    #[test]
    fn query_splits_words_and_uses_config() {
        let idx = index(&[("a.md", "a b\nc\nd\ne\nf")]);
        let config = IndexConfig::default();
        assert_eq!(idx.query("A  b", &config).len(), 1);
        assert!(idx.query("   ", &config).is_empty());
    }
}
