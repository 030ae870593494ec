//! Template-based draft generator.
//!
//! Assembles a eulogy from the form without any model. Tone picks the
//! opening and closing, length decides which optional paragraphs appear.

use async_trait::async_trait;

use super::DraftGenerator;
use crate::conversation::form::{DraftLength, EulogyForm, Tone};
use crate::error::GenerationError;

#[derive(Debug, Default, Clone)]
pub struct TemplateDraftGenerator;

impl TemplateDraftGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of [`DraftGenerator::generate`].
    pub fn compose(&self, form: &EulogyForm) -> Result<String, GenerationError> {
        let name = form
            .subject_name
            .as_deref()
            .ok_or_else(|| GenerationError::Failed {
                reason: "no name has been collected yet".to_string(),
            })?;
        let subject = capitalize(form.pronouns.subject());
        let poss = form.pronouns.possessive();
        let full = form.length != DraftLength::Short;

        let mut paragraphs = vec![opening(form.tone, name)];

        let mut intro = match form.relationship.as_deref() {
            Some(rel) => format!("{name} was my {rel}"),
            None => format!("{name} meant so much to so many of us"),
        };
        if let Some(age) = form.age {
            intro.push_str(&format!(
                ", and {} lived {age} remarkable years",
                form.pronouns.subject()
            ));
        }
        intro.push('.');
        paragraphs.push(intro);

        if let Some(values) = present(&form.character_values) {
            paragraphs.push(format!(
                "When I think about {poss} character, this is what comes to mind: {}.",
                clause(values)
            ));
        }
        if full {
            if let Some(impact) = present(&form.impact) {
                paragraphs.push(format!(
                    "{name} shaped the people around {} in ways we are still discovering. {}.",
                    form.pronouns.object(),
                    capitalize(clause(impact))
                ));
            }
        }

        let mut memories = Vec::new();
        if let Some(funny) = present(&form.funny_memory) {
            memories.push(format!("I still smile when I remember this: {}.", clause(funny)));
        }
        if let Some(moment) = present(&form.character_memory) {
            memories.push(format!(
                "One moment captures who {name} was better than anything else: {}.",
                clause(moment)
            ));
        }
        if full {
            for anecdote in &form.anecdotes {
                if Some(anecdote.as_str()) != form.funny_memory.as_deref()
                    && Some(anecdote.as_str()) != form.character_memory.as_deref()
                {
                    memories.push(format!("{}.", capitalize(clause(anecdote))));
                }
            }
        }
        if !memories.is_empty() {
            paragraphs.push(memories.join(" "));
        }

        if !form.hobbies.is_empty() {
            paragraphs.push(format!("{subject} found joy in {}.", join_list(&form.hobbies)));
        }
        if full && !form.achievements.is_empty() {
            paragraphs.push(format!(
                "Among the things {} {} proud of: {}.",
                form.pronouns.subject(),
                form.pronouns.was(),
                join_list(&form.achievements)
            ));
        }

        if full {
            if let Some(challenges) = present(&form.challenges_overcome) {
                paragraphs.push(format!(
                    "Life was not always easy for {name}. {}. Through it all, {} kept going.",
                    capitalize(clause(challenges)),
                    form.pronouns.subject()
                ));
            }
            if let Some(details) = present(&form.small_details) {
                paragraphs.push(format!(
                    "It is the little things I hold onto: {}.",
                    clause(details)
                ));
            }
            if let Some(beliefs) = present(&form.beliefs_or_rituals) {
                paragraphs.push(format!(
                    "{subject} drew strength from {poss} beliefs and traditions: {}.",
                    clause(beliefs)
                ));
            }
        }

        if let Some(miss) = present(&form.what_you_will_miss) {
            paragraphs.push(format!("What I will miss most is {}.", clause(miss)));
        }
        if let Some(final_thoughts) = present(&form.final_thoughts) {
            paragraphs.push(format!("{}.", capitalize(clause(final_thoughts))));
        }
        if form.length == DraftLength::Long {
            paragraphs.push(format!(
                "Each of us carries a piece of {name} with us now, in the way we listen, the way we \
                 laugh, and the way we show up for one another."
            ));
        }

        paragraphs.push(closing(form.tone, name));
        Ok(paragraphs.join("\n\n"))
    }
}

#[async_trait]
impl DraftGenerator for TemplateDraftGenerator {
    fn name(&self) -> &str {
        "template"
    }

    async fn generate(&self, form: &EulogyForm) -> Result<String, GenerationError> {
        self.compose(form)
    }
}

fn opening(tone: Tone, name: &str) -> String {
    match tone {
        Tone::Solemn => format!("We gather today to honor the life of {name}."),
        Tone::Warm => format!("Thank you all for being here to remember {name} with me."),
        Tone::Celebratory => {
            format!("We are here today to celebrate the wonderful life of {name}.")
        }
        Tone::Humorous => format!(
            "{name} would probably tell us all to stop fussing and get to the food, but please bear with me."
        ),
    }
}

fn closing(tone: Tone, name: &str) -> String {
    match tone {
        Tone::Solemn => format!("May {name} rest in peace."),
        Tone::Warm => format!("We love you, {name}, and we will carry you with us always."),
        Tone::Celebratory => format!("Here's to {name}, and to a life truly well lived."),
        Tone::Humorous => format!("Thank you, {name}, for every laugh. We'll take it from here."),
    }
}

/// A filled slot that was not explicitly skipped.
fn present(slot: &Option<String>) -> Option<&str> {
    slot.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// User text trimmed of trailing sentence punctuation.
fn clause(text: &str) -> &str {
    text.trim().trim_end_matches(['.', '!', '?', ','])
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn join_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}
