//! Heuristic fact extractors.
//!
//! These run on every user turn before any state-dependent branching. They
//! never fail: a miss is just `None`, and the state machine re-prompts.

use std::cmp::Reverse;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::form::{EulogyForm, Pronouns};

// ── Name ────────────────────────────────────────────────────────────

/// Utterances (and single words) that are never a name.
const NAME_STOPWORDS: &[&str] = &[
    "hi", "hello", "hey", "hiya", "howdy", "greetings", "hi there", "hello there", "hey there",
    "good morning", "good afternoon", "good evening", "thanks", "thank you", "thank", "yes",
    "yeah", "yep", "no", "nope", "ok", "okay", "sure", "fine", "well", "so", "and", "but", "she",
    "he", "they", "her", "his", "him", "their", "them", "my", "our", "the", "it", "we", "a", "an",
    "this", "that", "there", "i",
];

static MULTI_CAPITALIZED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\p{Lu}\p{Ll}+(?:\s\p{Lu}\p{Ll}+)+\b").expect("static name pattern")
});

static SINGLE_CAPITALIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\p{Lu}\p{Ll}+\b").expect("static name pattern"));

fn is_stopword(word: &str) -> bool {
    let lower = word.to_lowercase();
    NAME_STOPWORDS.contains(&lower.as_str())
}

/// Pull a person's name out of an utterance.
///
/// Two or more consecutive capitalised words win over a single capitalised
/// word. Greetings and acknowledgements are rejected outright.
pub fn extract_name(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.chars().count() < 2 {
        return None;
    }
    let bare = trimmed.trim_end_matches(['!', '.', ',', '?']);
    if is_stopword(bare) {
        return None;
    }

    if let Some(m) = MULTI_CAPITALIZED.find(trimmed) {
        // "Hi Margaret Jones" should not keep the greeting.
        let words: Vec<&str> = m
            .as_str()
            .split_whitespace()
            .skip_while(|w| is_stopword(w))
            .collect();
        if words.len() >= 2 {
            return Some(words.join(" "));
        }
        if let Some(word) = words.first() {
            return Some(word.to_string());
        }
    }

    SINGLE_CAPITALIZED
        .find_iter(trimmed)
        .map(|m| m.as_str())
        .find(|w| w.chars().count() >= 2 && !is_stopword(w))
        .map(String::from)
}

// ── Relationship ────────────────────────────────────────────────────

/// Keywords that resolve to one canonical relationship label.
#[derive(Debug)]
struct RelationshipGroup {
    label: &'static str,
    keywords: &'static [&'static str],
    /// Lower is more specific.
    tier: u8,
}

static RELATIONSHIP_GROUPS: &[RelationshipGroup] = &[
    RelationshipGroup {
        label: "grandmother",
        keywords: &["grandmother", "grandma", "granny", "nana"],
        tier: 1,
    },
    RelationshipGroup {
        label: "grandfather",
        keywords: &["grandfather", "grandpa", "granddad", "grandad"],
        tier: 1,
    },
    RelationshipGroup {
        label: "mother",
        keywords: &["mother", "mom", "mum", "mama"],
        tier: 1,
    },
    RelationshipGroup {
        label: "father",
        keywords: &["father", "dad", "papa"],
        tier: 1,
    },
    RelationshipGroup {
        label: "sister",
        keywords: &["sister"],
        tier: 1,
    },
    RelationshipGroup {
        label: "brother",
        keywords: &["brother"],
        tier: 1,
    },
    RelationshipGroup {
        label: "aunt",
        keywords: &["aunt", "auntie"],
        tier: 1,
    },
    RelationshipGroup {
        label: "uncle",
        keywords: &["uncle"],
        tier: 1,
    },
    RelationshipGroup {
        label: "cousin",
        keywords: &["cousin"],
        tier: 1,
    },
    RelationshipGroup {
        label: "niece",
        keywords: &["niece"],
        tier: 1,
    },
    RelationshipGroup {
        label: "nephew",
        keywords: &["nephew"],
        tier: 1,
    },
    RelationshipGroup {
        label: "daughter",
        keywords: &["daughter"],
        tier: 1,
    },
    RelationshipGroup {
        label: "son",
        keywords: &["son"],
        tier: 1,
    },
    RelationshipGroup {
        label: "wife",
        keywords: &["wife"],
        tier: 1,
    },
    RelationshipGroup {
        label: "husband",
        keywords: &["husband"],
        tier: 1,
    },
    RelationshipGroup {
        label: "spouse",
        keywords: &["spouse"],
        tier: 1,
    },
    RelationshipGroup {
        label: "partner",
        keywords: &["partner"],
        tier: 1,
    },
    RelationshipGroup {
        label: "best friend",
        keywords: &["best friend"],
        tier: 2,
    },
    RelationshipGroup {
        label: "colleague",
        keywords: &["colleague", "coworker", "co-worker"],
        tier: 3,
    },
    RelationshipGroup {
        label: "mentor",
        keywords: &["mentor"],
        tier: 3,
    },
    RelationshipGroup {
        label: "teacher",
        keywords: &["teacher"],
        tier: 3,
    },
    RelationshipGroup {
        label: "neighbor",
        keywords: &["neighbor", "neighbour"],
        tier: 3,
    },
    RelationshipGroup {
        label: "friend",
        keywords: &["friend"],
        tier: 4,
    },
];

const FEMALE_RELATIONSHIPS: &[&str] =
    &["mother", "grandmother", "sister", "aunt", "niece", "daughter", "wife"];
const MALE_RELATIONSHIPS: &[&str] =
    &["father", "grandfather", "brother", "uncle", "nephew", "son", "husband"];

/// Characters of preceding text inspected for a possessive cue.
const CONTEXT_WINDOW_CHARS: usize = 30;

const POSSESSIVE_CUES: &[&str] = &["my", "our", "the"];

/// Compiled matchers for one relationship keyword.
struct KeywordPattern {
    group: &'static RelationshipGroup,
    /// The keyword as a whole word.
    keyword: Regex,
    /// A possessive cue word directly before the keyword, anchored at its end.
    strong: Regex,
}

static RELATIONSHIP_PATTERNS: LazyLock<Vec<KeywordPattern>> = LazyLock::new(|| {
    let cues = POSSESSIVE_CUES.join("|");
    RELATIONSHIP_GROUPS
        .iter()
        .flat_map(|group| {
            let cues = cues.clone();
            group.keywords.iter().map(move |kw| {
                let kw = regex::escape(kw);
                KeywordPattern {
                    group,
                    keyword: Regex::new(&format!(r"(?i)\b{kw}\b"))
                        .expect("static relationship pattern"),
                    strong: Regex::new(&format!(r"(?i)\b(?:{cues})\s+{kw}$"))
                        .expect("static relationship pattern"),
                }
            })
        })
        .collect()
});

#[derive(Debug)]
struct RelationshipMatch {
    label: &'static str,
    tier: u8,
    offset: usize,
    strong: bool,
}

/// Byte index where the `chars`-character window ending at `end` begins.
fn window_start(text: &str, end: usize, chars: usize) -> usize {
    text[..end]
        .char_indices()
        .rev()
        .take(chars)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(end)
}

/// Find the relationship the speaker had with the person being remembered.
///
/// Every keyword occurrence is considered. Occurrences preceded by "my",
/// "our" or "the" are strong; if any are strong the rest are dropped. The
/// most specific tier wins, and within a tier the latest mention wins, so
/// "my mom's sister, my aunt" resolves to "aunt".
pub fn extract_relationship(text: &str) -> Option<String> {
    let mut matches = Vec::new();

    for pattern in RELATIONSHIP_PATTERNS.iter() {
        for m in pattern.keyword.find_iter(text) {
            let start = window_start(text, m.start(), CONTEXT_WINDOW_CHARS);
            let strong = pattern.strong.is_match(&text[start..m.end()]);
            matches.push(RelationshipMatch {
                label: pattern.group.label,
                tier: pattern.group.tier,
                offset: m.start(),
                strong,
            });
        }
    }

    if matches.iter().any(|m| m.strong) {
        matches.retain(|m| m.strong);
    }

    let best = matches
        .into_iter()
        .min_by_key(|m| (m.tier, Reverse(m.offset)))?;
    debug!(
        label = best.label,
        tier = best.tier,
        offset = best.offset,
        strong = best.strong,
        "Relationship extracted"
    );
    Some(best.label.to_string())
}

// ── Pronouns ────────────────────────────────────────────────────────

/// Pronouns implied by a gendered relationship label, if any.
pub fn pronouns_for_relationship(relationship: &str) -> Option<Pronouns> {
    let relationship = relationship.to_lowercase();
    if FEMALE_RELATIONSHIPS.contains(&relationship.as_str()) {
        Some(Pronouns::She)
    } else if MALE_RELATIONSHIPS.contains(&relationship.as_str()) {
        Some(Pronouns::He)
    } else {
        None
    }
}

/// Pronouns used directly in the utterance ("she ...", "... he ...").
pub fn pronouns_from_text(text: &str) -> Option<Pronouns> {
    let spaced: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let padded = format!(" {spaced} ");
    if padded.contains(" she ") {
        Some(Pronouns::She)
    } else if padded.contains(" he ") {
        Some(Pronouns::He)
    } else {
        None
    }
}

/// Apply inferred pronouns only while the form still holds the default.
pub fn apply_pronouns(form: &mut EulogyForm, inferred: Option<Pronouns>) -> bool {
    match inferred {
        Some(p) if form.pronouns == Pronouns::default() && p != Pronouns::default() => {
            debug!(pronouns = %p, "Pronouns inferred");
            form.pronouns = p;
            true
        }
        _ => false,
    }
}

// ── Age & lists ─────────────────────────────────────────────────────

static AGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(\d{1,3})\s*(?:years?|yrs?)(?:\s|-)*old\b").expect("static age pattern"),
        Regex::new(r"(?i)\baged?\s+(?:of\s+)?(\d{1,3})\b").expect("static age pattern"),
    ]
});

/// Age of the person, from "92 years old" or "age 92" phrasings.
pub fn extract_age(text: &str) -> Option<u32> {
    AGE_PATTERNS
        .iter()
        .filter_map(|re| re.captures(text))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .find(|age| (1..=130).contains(age))
}

static LIST_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:,|;|&|\band\b)\s*").expect("static list pattern"));

/// Split a list-like answer ("gardening, baking and long walks") into items.
pub fn split_list(text: &str) -> Vec<String> {
    LIST_SEPARATOR
        .split(text.trim())
        .map(|item| item.trim().trim_end_matches(['.', '!', '?']).trim())
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

// ── Whole-utterance pass ────────────────────────────────────────────

/// What a single extraction pass wrote into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub name: bool,
    pub relationship: bool,
    pub pronouns: bool,
    pub age: bool,
}

/// Relationship first, then any pronouns the relationship implies.
pub fn extract_relationship_into(form: &mut EulogyForm, text: &str, report: &mut ExtractionReport) {
    if form.relationship.is_some() {
        return;
    }
    if let Some(relationship) = extract_relationship(text) {
        report.pronouns |= apply_pronouns(form, pronouns_for_relationship(&relationship));
        form.relationship = Some(relationship);
        report.relationship = true;
    }
}

/// Name, lexical pronoun cues and age. Each slot is first-write-wins.
pub fn extract_remaining_into(form: &mut EulogyForm, text: &str, report: &mut ExtractionReport) {
    if form.subject_name.is_none() {
        if let Some(name) = extract_name(text) {
            debug!(name = %name, "Subject name extracted");
            form.subject_name = Some(name);
            report.name = true;
        }
    }
    report.pronouns |= apply_pronouns(form, pronouns_from_text(text));
    if form.age.is_none() {
        if let Some(age) = extract_age(text) {
            form.age = Some(age);
            report.age = true;
        }
    }
}
