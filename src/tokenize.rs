//! Word tokenizer.
//!
//! A token is a maximal run of letters (a Unicode letter followed by letters
//! or combining marks). Digits, punctuation and whitespace only separate
//! tokens. Every token is lower-cased so frequency counts are
//! case-insensitive.

use regex::Regex;
use std::sync::LazyLock;

static WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{L}[\p{L}\p{M}]*").expect("word regex is valid"));

/// Split `text` into lower-cased word tokens, in order.
pub fn tokenize(text: &str) -> Vec<String> {
    WORD_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Tokenize each line of a corpus as its own document.
///
/// Blank lines still produce an (empty) document so row indices line up
/// with corpus lines.
pub fn tokenize_documents(corpus: &str) -> Vec<Vec<String>> {
    corpus.lines().map(tokenize).collect()
}
