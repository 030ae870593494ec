//! The eulogy fact store and its derived views.

use serde::{Deserialize, Serialize};

/// Grammatical pronoun set for the person being remembered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Pronouns {
    She,
    He,
    #[default]
    They,
}

impl Pronouns {
    /// Subject form: she / he / they.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::She => "she",
            Self::He => "he",
            Self::They => "they",
        }
    }

    /// Possessive form: her / his / their.
    pub fn possessive(&self) -> &'static str {
        match self {
            Self::She => "her",
            Self::He => "his",
            Self::They => "their",
        }
    }

    /// Objective form: her / him / them.
    pub fn object(&self) -> &'static str {
        match self {
            Self::She => "her",
            Self::He => "him",
            Self::They => "them",
        }
    }

    /// Reflexive form: herself / himself / themself.
    pub fn reflexive(&self) -> &'static str {
        match self {
            Self::She => "herself",
            Self::He => "himself",
            Self::They => "themself",
        }
    }

    /// Past tense of "to be" agreeing with the subject form.
    pub fn was(&self) -> &'static str {
        match self {
            Self::They => "were",
            _ => "was",
        }
    }
}

impl std::fmt::Display for Pronouns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.subject())
    }
}

/// Emotional register of the eulogy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Solemn,
    #[default]
    Warm,
    Celebratory,
    Humorous,
}

impl Tone {
    /// Parse a tone from free text. Anything unrecognised is warm.
    pub fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("solemn") || lower.contains("formal") || lower.contains("serious") {
            Self::Solemn
        } else if lower.contains("celebrat") || lower.contains("joyful") {
            Self::Celebratory
        } else if lower.contains("humor") || lower.contains("humour") || lower.contains("funny")
        {
            Self::Humorous
        } else {
            Self::Warm
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Solemn => write!(f, "solemn"),
            Self::Warm => write!(f, "warm"),
            Self::Celebratory => write!(f, "celebratory"),
            Self::Humorous => write!(f, "humorous"),
        }
    }
}

/// Target length of the eulogy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DraftLength {
    Short,
    #[default]
    Standard,
    Long,
}

impl DraftLength {
    /// Parse a length from free text. Anything unrecognised is standard.
    pub fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("short") || lower.contains("brief") {
            Self::Short
        } else if lower.contains("long") || lower.contains("detailed") {
            Self::Long
        } else {
            Self::Standard
        }
    }
}

impl std::fmt::Display for DraftLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Short => write!(f, "short"),
            Self::Standard => write!(f, "standard"),
            Self::Long => write!(f, "long"),
        }
    }
}

/// Facts collected so far about the person being remembered.
///
/// `None` means "not yet collected". For the optional slots
/// (`challenges_overcome`, `small_details`, `beliefs_or_rituals`,
/// `final_thoughts`) an empty string means the user explicitly skipped it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EulogyForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(default)]
    pub pronouns: Pronouns,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub length: DraftLength,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_values: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default)]
    pub anecdotes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funny_memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_memory: Option<String>,
    #[serde(default)]
    pub hobbies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub what_you_will_miss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenges_overcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beliefs_or_rituals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_thoughts: Option<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    /// Legacy mirror of `character_values`, kept for older consumers.
    #[serde(default)]
    pub traits: Vec<String>,
}

impl EulogyForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether enough is known to offer a draft. Optional slots never gate this.
    pub fn is_ready_for_draft(&self) -> bool {
        self.subject_name.is_some()
            && self.relationship.is_some()
            && self.character_values.is_some()
            && self.impact.is_some()
            && self.what_you_will_miss.is_some()
            && self.has_memory()
            && !self.hobbies.is_empty()
    }

    /// At least one of the funny or defining-moment memories is present.
    pub fn has_memory(&self) -> bool {
        self.funny_memory.is_some() || self.character_memory.is_some()
    }

    /// Name to use in prose, falling back to "them" when unknown.
    pub fn display_name(&self) -> &str {
        self.subject_name.as_deref().unwrap_or("them")
    }

    /// Set `character_values` if unset, mirroring the first write into `traits`.
    pub fn set_character_values(&mut self, value: &str) -> bool {
        if self.character_values.is_some() {
            return false;
        }
        self.character_values = Some(value.to_string());
        push_unique(&mut self.traits, value);
        true
    }

    pub fn add_anecdote(&mut self, anecdote: &str) -> bool {
        push_unique(&mut self.anecdotes, anecdote)
    }

    pub fn add_hobby(&mut self, hobby: &str) -> bool {
        push_unique(&mut self.hobbies, hobby)
    }

    pub fn add_achievement(&mut self, achievement: &str) -> bool {
        push_unique(&mut self.achievements, achievement)
    }

    pub fn add_trait(&mut self, value: &str) -> bool {
        push_unique(&mut self.traits, value)
    }

    /// Render the progress checklist shown above each question.
    pub fn checklist(&self) -> String {
        let mandatory = [
            ("Name", self.subject_name.is_some()),
            ("Relationship", self.relationship.is_some()),
            ("Character & values", self.character_values.is_some()),
            ("Impact", self.impact.is_some()),
            ("A memorable moment", self.has_memory()),
            ("Hobbies & interests", !self.hobbies.is_empty()),
            ("What you'll miss", self.what_you_will_miss.is_some()),
        ];
        let optional = [
            ("Challenges overcome", self.challenges_overcome.is_some()),
            ("Small details", self.small_details.is_some()),
            ("Beliefs or rituals", self.beliefs_or_rituals.is_some()),
            ("Final thoughts", self.final_thoughts.is_some()),
        ];

        let mut lines = vec!["Progress:".to_string()];
        for (label, done) in mandatory {
            lines.push(format!("{} {}", mark(done), label));
        }
        for (label, done) in optional {
            lines.push(format!("{} {} (optional)", mark(done), label));
        }
        lines.join("\n")
    }
}

fn mark(done: bool) -> &'static str {
    if done { "✓" } else { "○" }
}

/// Append `value` unless an equal entry already exists. Blank values are ignored.
fn push_unique(list: &mut Vec<String>, value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || list.iter().any(|v| v == value) {
        return false;
    }
    list.push(value.to_string());
    true
}
