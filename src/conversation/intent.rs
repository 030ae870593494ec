//! Intent detectors for yes/skip/revise replies.
//!
//! All matching is case-insensitive on whole words or whole phrases, so
//! "nope" never fires inside "canopener" and "ok" never fires inside "token".

use std::sync::LazyLock;

use regex::Regex;

const NEGATION_MARKERS: &[&str] = &["not", "don't", "no", "never"];

const AFFIRMATIVE_PHRASES: &[&str] = &[
    "yes",
    "yeah",
    "yep",
    "sure",
    "ok",
    "okay",
    "please",
    "go ahead",
    "proceed",
    "create",
    "generate",
    "ready",
    "let's do it",
    "sounds good",
    "perfect",
];

const SKIP_PHRASES: &[&str] = &[
    "no",
    "nope",
    "skip",
    "pass",
    "none",
    "nothing",
    "no thanks",
    "that's ok",
    "that's okay",
    "not needed",
    "not necessary",
    "don't need",
    "doesn't matter",
];

const REVISION_PHRASES: &[&str] = &[
    "regenerate",
    "rewrite",
    "redo",
    "revise",
    "try again",
    "another version",
    "start over",
];

static NEGATION: LazyLock<Regex> = LazyLock::new(|| phrase_regex(NEGATION_MARKERS));
static AFFIRMATIVE: LazyLock<Regex> = LazyLock::new(|| phrase_regex(AFFIRMATIVE_PHRASES));
static SKIP: LazyLock<Regex> = LazyLock::new(|| phrase_regex(SKIP_PHRASES));
static REVISION: LazyLock<Regex> = LazyLock::new(|| phrase_regex(REVISION_PHRASES));

/// Compile a whole-word alternation over `phrases`.
fn phrase_regex(phrases: &[&str]) -> Regex {
    let alternation = phrases
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("static phrase pattern")
}

/// Trim, lowercase, and fold typographic apostrophes to ASCII.
fn normalize(text: &str) -> String {
    text.trim().to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

/// Whether the user is agreeing to have the draft written.
///
/// Any negation marker vetoes the answer outright, so "not ready yet" is a no.
pub fn user_wants_draft(text: &str) -> bool {
    let text = normalize(text);
    if NEGATION.is_match(&text) {
        return false;
    }
    AFFIRMATIVE.is_match(&text)
}

/// Whether the user is declining an optional question.
pub fn user_wants_to_skip(text: &str) -> bool {
    SKIP.is_match(&normalize(text))
}

/// Whether the user is asking for the draft to be written again.
pub fn user_wants_revision(text: &str) -> bool {
    REVISION.is_match(&normalize(text))
}
