//! Offline keyword classifier.

use async_trait::async_trait;

use super::IntentClassifier;
use crate::conversation::labels::UNKNOWN_LABEL;
use crate::error::ClassifierError;

/// (label, cue words) in priority order. The first label with a cue wins.
const KEYWORD_LABELS: &[(&str, &[&str])] = &[
    ("funny memory", &["funny", "hilarious", "laughed", "joke", "prank"]),
    ("hobby", &["hobby", "hobbies", "loved to", "enjoyed", "pastime"]),
    ("achievement", &["award", "graduated", "promoted", "founded", "medal"]),
    ("belief", &["church", "faith", "prayed", "temple", "mosque", "synagogue"]),
    ("challenge", &["cancer", "struggled", "overcame", "illness", "survived"]),
    ("tone", &["solemn", "celebratory", "upbeat"]),
    ("length", &["shorter", "longer", "brief"]),
];

/// Keyword-cue classifier for running without a model.
///
/// Deliberately conservative: anything without a clear cue is `unknown`.
#[derive(Debug, Default, Clone)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of [`IntentClassifier::classify`].
    pub fn label_for(&self, text: &str) -> &'static str {
        let lower = text.to_lowercase();
        KEYWORD_LABELS
            .iter()
            .find(|(_, cues)| cues.iter().any(|cue| lower.contains(cue)))
            .map(|(label, _)| *label)
            .unwrap_or(UNKNOWN_LABEL)
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn classify(&self, text: &str) -> Result<String, ClassifierError> {
        Ok(self.label_for(text).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_clear_cues() {
        let classifier = KeywordClassifier::new();
        assert_eq!(classifier.label_for("She told the funniest joke"), "funny memory");
        assert_eq!(classifier.label_for("He loved to fish"), "hobby");
        assert_eq!(classifier.label_for("She went to church every Sunday"), "belief");
        assert_eq!(classifier.label_for("Make it shorter"), "length");
    }

    #[test]
    fn unclear_text_is_unknown() {
        let classifier = KeywordClassifier::new();
        assert_eq!(classifier.label_for("Margaret Jones"), UNKNOWN_LABEL);
        assert_eq!(classifier.label_for(""), UNKNOWN_LABEL);
    }

    #[tokio::test]
    async fn classify_never_errors() {
        let classifier = KeywordClassifier::new();
        let label = classifier.classify("she survived the war").await.unwrap();
        assert_eq!(label, "challenge");
    }
}
