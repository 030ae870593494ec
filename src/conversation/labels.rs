//! Classifier-label fallback mapping.
//!
//! The classifier's label is advisory. Rules are checked top to bottom and
//! the first whose predicate matches the lowercased label wins; order
//! matters because keywords overlap ("character" appears in two rules).
//! Scalar slots are only written while empty. List slots always append.

use tracing::debug;

use super::extract;
use super::form::{DraftLength, EulogyForm, Tone};

/// Label the classifier returns when it has nothing useful to say.
pub const UNKNOWN_LABEL: &str = "unknown";

/// One (predicate, effect) pair.
struct LabelRule {
    name: &'static str,
    matches: fn(&str) -> bool,
    /// Returns whether the form changed.
    apply: fn(&mut EulogyForm, &str) -> bool,
}

fn any_of(label: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| label.contains(n))
}

fn set_if_empty(slot: &mut Option<String>, text: &str) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(text.to_string());
    true
}

static LABEL_RULES: &[LabelRule] = &[
    LabelRule {
        name: "name",
        matches: |l| l.contains("name"),
        apply: |form, text| {
            if form.subject_name.is_some() {
                return false;
            }
            form.subject_name = extract::extract_name(text);
            form.subject_name.is_some()
        },
    },
    LabelRule {
        name: "relationship",
        matches: |l| any_of(l, &["relationship", "relation"]),
        apply: |form, text| {
            let mut report = extract::ExtractionReport::default();
            extract::extract_relationship_into(form, text, &mut report);
            report.relationship
        },
    },
    LabelRule {
        name: "impact",
        matches: |l| any_of(l, &["impact", "difference", "change"]),
        apply: |form, text| set_if_empty(&mut form.impact, text),
    },
    LabelRule {
        name: "funny_memory",
        matches: |l| any_of(l, &["funny", "humor", "lighthearted"]),
        apply: |form, text| {
            let set = set_if_empty(&mut form.funny_memory, text);
            form.add_anecdote(text) || set
        },
    },
    LabelRule {
        name: "character_memory",
        matches: |l| {
            l.contains("moment") && any_of(l, &["character", "defining", "shows who"])
        },
        apply: |form, text| {
            let set = set_if_empty(&mut form.character_memory, text);
            form.add_anecdote(text) || set
        },
    },
    LabelRule {
        name: "character_values",
        matches: |l| any_of(l, &["character", "value", "principle"]),
        apply: |form, text| form.set_character_values(text),
    },
    LabelRule {
        name: "traits",
        matches: |l| l.contains("trait"),
        apply: |form, text| {
            let added = form.add_trait(text);
            form.set_character_values(text) || added
        },
    },
    LabelRule {
        name: "hobbies",
        matches: |l| any_of(l, &["hobby", "interest"]),
        apply: |form, text| {
            let mut added = false;
            for item in extract::split_list(text) {
                added |= form.add_hobby(&item);
            }
            added
        },
    },
    LabelRule {
        name: "what_you_will_miss",
        matches: |l| any_of(l, &["miss", "remember"]),
        apply: |form, text| set_if_empty(&mut form.what_you_will_miss, text),
    },
    LabelRule {
        name: "challenges",
        matches: |l| any_of(l, &["challenge", "hardship", "overcome"]),
        apply: |form, text| set_if_empty(&mut form.challenges_overcome, text),
    },
    LabelRule {
        name: "small_details",
        matches: |l| any_of(l, &["detail", "quirk", "habit"]),
        apply: |form, text| set_if_empty(&mut form.small_details, text),
    },
    LabelRule {
        name: "anecdotes",
        matches: |l| any_of(l, &["anecdote", "story"]),
        apply: |form, text| form.add_anecdote(text),
    },
    LabelRule {
        name: "achievements",
        matches: |l| any_of(l, &["achievement", "milestone"]),
        apply: |form, text| form.add_achievement(text),
    },
    LabelRule {
        name: "beliefs",
        matches: |l| any_of(l, &["belief", "faith", "ritual"]),
        apply: |form, text| set_if_empty(&mut form.beliefs_or_rituals, text),
    },
    LabelRule {
        name: "final_thoughts",
        matches: |l| any_of(l, &["final", "else", "add"]),
        apply: |form, text| set_if_empty(&mut form.final_thoughts, text),
    },
    LabelRule {
        name: "tone",
        matches: |l| l.contains("tone"),
        apply: |form, text| {
            let tone = Tone::from_text(text);
            let changed = form.tone != tone;
            form.tone = tone;
            changed
        },
    },
    LabelRule {
        name: "length",
        matches: |l| l.contains("length"),
        apply: |form, text| {
            let length = DraftLength::from_text(text);
            let changed = form.length != length;
            form.length = length;
            changed
        },
    },
];

/// Result of mapping one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelOutcome {
    /// Which rule matched.
    pub rule: &'static str,
    /// Whether the form changed.
    pub changed: bool,
}

/// Map a classifier label onto the form using the raw utterance.
///
/// Returns `None` when the label is `unknown`, blank, or matches no rule.
pub fn apply_label(form: &mut EulogyForm, label: &str, text: &str) -> Option<LabelOutcome> {
    let label = label.trim().to_lowercase();
    let text = text.trim();
    if label.is_empty() || label == UNKNOWN_LABEL || text.is_empty() {
        return None;
    }

    let rule = LABEL_RULES.iter().find(|rule| (rule.matches)(&label))?;
    let changed = (rule.apply)(form, text);
    debug!(label = %label, rule = rule.name, changed, "Classifier label mapped");
    Some(LabelOutcome {
        rule: rule.name,
        changed,
    })
}
