use std::time::Duration;

use crate::lifecycle::HighlightTiming;

mod env;

const ENV_DEBOUNCE_MS: &str = "MDLENS_DEBOUNCE_MS";
const ENV_HIGHLIGHT_HOLD_MS: &str = "MDLENS_HIGHLIGHT_HOLD_MS";
const ENV_HIGHLIGHT_FADE_MS: &str = "MDLENS_HIGHLIGHT_FADE_MS";
const ENV_TOC_HOLD_MS: &str = "MDLENS_TOC_HOLD_MS";
const ENV_TOC_FADE_MS: &str = "MDLENS_TOC_FADE_MS";
const ENV_CONTEXT_BLOCK_SIZE: &str = "MDLENS_CONTEXT_BLOCK_SIZE";
const ENV_CONTEXT_LIMIT: &str = "MDLENS_CONTEXT_LIMIT";
const ENV_WORD_LIMIT: &str = "MDLENS_WORD_LIMIT";

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_HIGHLIGHT_HOLD_MS: u64 = 4000;
pub const DEFAULT_HIGHLIGHT_FADE_MS: u64 = 700;
pub const DEFAULT_TOC_HOLD_MS: u64 = 1000;
pub const DEFAULT_TOC_FADE_MS: u64 = 300;
pub const DEFAULT_CONTEXT_BLOCK_SIZE: usize = 5;
pub const DEFAULT_CONTEXT_LIMIT: usize = 20;
pub const DEFAULT_WORD_LIMIT: usize = 10;

/// Runtime knobs for the viewer and the content index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LensConfig {
    pub search: SearchConfig,
    pub content_highlight: HighlightTiming,
    pub toc_highlight: HighlightTiming,
    pub index: IndexConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub debounce: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    pub context_block_size: usize,
    pub context_limit: usize,
    /// Hit limit for whole-word search.
    pub word_limit: usize,
}

impl LensConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            search: SearchConfig {
                debounce: Duration::from_millis(env::read_env_u64(
                    ENV_DEBOUNCE_MS,
                    DEFAULT_DEBOUNCE_MS,
                    0,
                )),
            },
            content_highlight: HighlightTiming::from_millis(
                env::read_env_u64(ENV_HIGHLIGHT_HOLD_MS, DEFAULT_HIGHLIGHT_HOLD_MS, 0),
                env::read_env_u64(ENV_HIGHLIGHT_FADE_MS, DEFAULT_HIGHLIGHT_FADE_MS, 0),
            ),
            toc_highlight: HighlightTiming::from_millis(
                env::read_env_u64(ENV_TOC_HOLD_MS, DEFAULT_TOC_HOLD_MS, 0),
                env::read_env_u64(ENV_TOC_FADE_MS, DEFAULT_TOC_FADE_MS, 0),
            ),
            index: IndexConfig {
                context_block_size: env::read_env_usize(
                    ENV_CONTEXT_BLOCK_SIZE,
                    DEFAULT_CONTEXT_BLOCK_SIZE,
                    1,
                ),
                context_limit: env::read_env_usize(ENV_CONTEXT_LIMIT, DEFAULT_CONTEXT_LIMIT, 1),
                word_limit: env::read_env_usize(ENV_WORD_LIMIT, DEFAULT_WORD_LIMIT, 1),
            },
        }
    }
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            content_highlight: HighlightTiming::from_millis(
                DEFAULT_HIGHLIGHT_HOLD_MS,
                DEFAULT_HIGHLIGHT_FADE_MS,
            ),
            toc_highlight: HighlightTiming::from_millis(DEFAULT_TOC_HOLD_MS, DEFAULT_TOC_FADE_MS),
            index: IndexConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            context_block_size: DEFAULT_CONTEXT_BLOCK_SIZE,
            context_limit: DEFAULT_CONTEXT_LIMIT,
            word_limit: DEFAULT_WORD_LIMIT,
        }
    }
}
