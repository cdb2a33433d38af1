use regex::{Regex, RegexBuilder};

/// Lowercases `text`, strips everything that is not a word character or
/// whitespace (underscores included) and splits it into tokens.
#[must_use]
pub fn normalize(text: &str) -> Vec<String> {
    let cleaned = text
        .to_lowercase()
        .chars()
        .filter(|ch| (ch.is_alphanumeric() && *ch != '_') || ch.is_whitespace())
        .collect::<String>();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Splits a user query into lowercase search words. Punctuation is kept.
#[must_use]
pub fn query_tokens(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

/// Case-insensitive alternation over `words`, each escaped literally.
/// Returns `None` when there is nothing to match.
#[must_use]
pub fn query_pattern<S: AsRef<str>>(words: &[S]) -> Option<Regex> {
    let alternatives = words
        .iter()
        .map(AsRef::as_ref)
        .filter(|word| !word.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>();
    if alternatives.is_empty() {
        return None;
    }
    RegexBuilder::new(&alternatives.join("|"))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Like [`query_pattern`], but each match grows to cover the whole word it
/// sits in, so `cat` marks all of `Cats`.
#[must_use]
pub fn word_pattern<S: AsRef<str>>(words: &[S]) -> Option<Regex> {
    let alternatives = words
        .iter()
        .map(AsRef::as_ref)
        .filter(|word| !word.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>();
    if alternatives.is_empty() {
        return None;
    }
    RegexBuilder::new(&format!(r"\w*(?:{})\w*", alternatives.join("|")))
        .case_insensitive(true)
        .build()
        .ok()
}

#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes `text` for markup and wraps every case-insensitive occurrence of
/// a query word in `<mark>`. Matching runs on the raw text, so entities added
/// by escaping are never matched.
#[must_use]
pub fn highlight_matches(text: &str, query: &str) -> String {
    let words = query.split_whitespace().collect::<Vec<_>>();
    let Some(pattern) = query_pattern(&words) else {
        return escape_html(text);
    };
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for found in pattern.find_iter(text) {
        out.push_str(&escape_html(&text[last..found.start()]));
        out.push_str("<mark>");
        out.push_str(&escape_html(found.as_str()));
        out.push_str("</mark>");
        last = found.end();
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_underscores_and_case() {
        assert_eq!(
            normalize("Hello, World! snake_case  it's\n\tDONE."),
            vec!["hello", "world", "snakecase", "its", "done"]
        );
    }

    #[test]
    fn normalize_of_empty_or_symbol_only_input_is_empty() {
        assert!(normalize("").is_empty());
        assert!(normalize("  -- *** __ ").is_empty());
    }

    #[test]
    fn normalize_is_idempotent_over_its_own_output() {
        for input in [
            "Section A: details (continued)",
            "İstanbul ǅemal _under_ score",
            "`code` | table | cell |",
            "tabs\tand\nnewlines  ",
        ] {
            let once = normalize(input);
            let twice = normalize(&once.join(" "));
            assert_eq!(once, twice, "input: {input:?}");
        }
    }

    #[test]
    fn query_tokens_lowercase_without_stripping() {
        assert_eq!(query_tokens("  Foo  c++ "), vec!["foo", "c++"]);
        assert!(query_tokens("   ").is_empty());
    }

    #[test]
    fn query_pattern_escapes_special_characters() {
        let pattern = query_pattern(&["c++", "a.b"]).expect("pattern");
        assert!(pattern.is_match("I like C++"));
        assert!(pattern.is_match("A.B"));
        assert!(!pattern.is_match("axb"));
        assert!(query_pattern::<&str>(&[]).is_none());
    }

    #[test]
    fn word_pattern_extends_partial_matches_to_the_word() {
        let pattern = word_pattern(&["cat", "dog"]).expect("pattern");
        let found = pattern
            .find_iter("Cats and dogs, hotdog")
            .map(|m| m.as_str())
            .collect::<Vec<_>>();
        assert_eq!(found, vec!["Cats", "dogs", "hotdog"]);
    }

    #[test]
    fn escape_html_replaces_markup_characters() {
        assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    }

    #[test]
    fn highlight_matches_preserves_original_casing() {
        assert_eq!(
            highlight_matches("Read the README first", "readme"),
            "Read the <mark>README</mark> first"
        );
        assert_eq!(
            highlight_matches("docs/Guide.md", "guide docs"),
            "<mark>docs</mark>/<mark>Guide</mark>.md"
        );
        assert_eq!(highlight_matches("untouched", "   "), "untouched");
    }

    #[test]
    fn highlight_matches_never_matches_inside_escaped_entities() {
        assert_eq!(highlight_matches("a & b < c", "amp lt"), "a &amp; b &lt; c");
        assert_eq!(
            highlight_matches("x<y & <z>", "y z"),
            "x&lt;<mark>y</mark> &amp; &lt;<mark>z</mark>&gt;"
        );
        assert_eq!(highlight_matches("<b>", ""), "&lt;b&gt;");
    }
}
