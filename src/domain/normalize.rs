//! Canonical form of track titles used for guess comparison

use regex::Regex;
use std::sync::OnceLock;

/// `(...)` segments, shortest match first
fn parenthetical_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?s)\(.*?\)").expect("invalid parenthetical regex"))
}

/// a featuring marker and the credit after it, up to the next
/// hyphen, en-dash, em-dash, comma or open paren
fn featuring_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\b(?:featuring|feat|ft)\b\.?[^\-\x{2013}\x{2014},(]*")
            .expect("invalid featuring regex")
    })
}

const STRIPPED_PUNCTUATION: &[char] = &[
    '"', '\'', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '.', '!', '?', ',', ';', ':', '-',
    '\u{2013}', '\u{2014}', '/', '\\',
];

/// Normalizes a title for equality comparison.
///
/// Lowercases, drops `(...)` segments and featuring credits, strips
/// punctuation and collapses whitespace. Total: any input, including an
/// empty one, yields a string.
///
/// Removing punctuation can join characters into a new featuring marker
/// (`f.t. someone`), so the pass is repeated until the text is stable.
/// Every pass after the first only deletes characters, which bounds the loop.
pub fn normalize(text: &str) -> String {
    let mut current = normalize_pass(text);
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_pass(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_parens = parenthetical_regex().replace_all(&lowered, "");
    let without_featuring = featuring_regex().replace_all(&without_parens, "");

    let stripped: String = without_featuring
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
