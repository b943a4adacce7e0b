//! Cosmetic clean-up of model output.
//!
//! Two independent, pure string transforms applied in order by
//! [`clean_response`]. Both are heuristics over raw characters and know
//! nothing about markdown structure or sentence boundaries.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Characters removed by [`strip_markdown`].
pub const MARKDOWN_CHARS: &[char] = &['_', '*', '~', '`', '<', '>', '#', '[', ']'];

/// A period, optional whitespace, then digits.
static PERIOD_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\.\s*[0-9]+)").expect("period number pattern"));

/// An exclamation mark directly ahead of a numbered continuation.
static EXCLAMATION_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!(\s*[0-9])").expect("exclamation number pattern"));

/// Remove every occurrence of ``_ * ~ ` < > # [ ]``.
///
/// Each character is dropped on its own; pairs are not matched, so a lone
/// `*` goes just like the two around `**bold**`.
pub fn strip_markdown(text: &str) -> String {
    text.chars().filter(|c| !MARKDOWN_CHARS.contains(c)).collect()
}

/// Start each numbered continuation on a new line.
///
/// Every `<period><optional whitespace><digits>` group gets `".\n"`
/// inserted in front of it, so `"X. 2 more text"` becomes
/// `"X.\n. 2 more text"`. Decimals are caught too (`"3.14"` becomes
/// `"3.\n.14"`).
///
/// After `!` the break goes straight after the mark instead:
/// `"Hi there! 2 more"` becomes `"Hi there!\n 2 more"`. No other
/// punctuation is touched.
pub fn reflow_numbered(text: &str) -> String {
    let text = PERIOD_NUMBER.replace_all(text, ".\n${1}");
    EXCLAMATION_NUMBER
        .replace_all(&text, "!\n${1}")
        .into_owned()
}

/// Markdown-strip, then reflow.
pub fn clean_response(raw: &str) -> String {
    reflow_numbered(&strip_markdown(raw))
}
