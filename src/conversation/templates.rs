//! Response template bank.
//!
//! Every question category has a handful of hand-written phrasings; one is
//! picked uniformly at random from the caller's RNG so replays are
//! deterministic under a seeded generator. Phrasings adapt to the known
//! name and pronouns and fall back to "them" when no name is known yet.

use rand::Rng;
use rand::seq::SliceRandom;

use super::form::{EulogyForm, Pronouns};
use super::state::QuestionType;

/// Opening line of every conversation.
pub const GREETING: &str = "I'm so sorry for your loss. I'm here to help you put together a \
eulogy, one question at a time. You can answer as briefly or as fully as you like.";

/// Shown when the draft generator fails; the conversation stays resumable.
pub const GENERATION_FAILED: &str =
    "I encountered an issue while writing the draft. Could we try again? Just say \"yes\" when you're ready.";

/// Shown when an in-flight draft is cancelled.
pub const GENERATION_CANCELLED: &str =
    "Okay, I've cancelled writing the draft. Nothing you shared has been lost. Say \"yes\" whenever you'd like me to try again.";

const ACKNOWLEDGMENTS: &[&str] = &[
    "Thank you for sharing that.",
    "That's beautiful.",
    "I appreciate you telling me.",
    "That says so much.",
    "Thank you.",
];

/// Grammatical view of the person being remembered.
struct Subject<'a> {
    name: Option<&'a str>,
    pronouns: Pronouns,
}

impl<'a> Subject<'a> {
    fn from_form(form: &'a EulogyForm) -> Self {
        Self {
            name: form.subject_name.as_deref(),
            pronouns: form.pronouns,
        }
    }

    /// Name in object position; "them" when unknown.
    fn object(&self) -> &str {
        self.name.unwrap_or("them")
    }

    /// Name in subject position; the subject pronoun when unknown.
    fn subject(&self) -> &str {
        self.name.unwrap_or(self.pronouns.subject())
    }

    /// "Margaret's", or the possessive pronoun when unknown.
    fn possessive(&self) -> String {
        match self.name {
            Some(name) => format!("{name}'s"),
            None => self.pronouns.possessive().to_string(),
        }
    }

    /// Verb agreeing with [`subject`](Self::subject).
    fn was(&self) -> &'static str {
        match self.name {
            Some(_) => "was",
            None => self.pronouns.was(),
        }
    }
}

fn pick<R: Rng + ?Sized>(variants: Vec<String>, rng: &mut R) -> String {
    variants.choose(rng).cloned().unwrap_or_default()
}

/// Render one question for `category`.
pub fn question<R: Rng + ?Sized>(category: QuestionType, form: &EulogyForm, rng: &mut R) -> String {
    let s = Subject::from_form(form);
    let name = s.object();
    let who = s.subject();
    let whose = s.possessive();
    let was = s.was();
    let poss = s.pronouns.possessive();
    let obj = s.pronouns.object();
    let refl = s.pronouns.reflexive();

    let variants = match category {
        QuestionType::Name => vec![
            "To begin, what was the name of the person you'd like to honor?".to_string(),
            "Let's start with the basics. What was their full name?".to_string(),
            "Who are we remembering today? Please share their name.".to_string(),
        ],
        QuestionType::Relationship => vec![
            format!("How were you related to {name}?"),
            format!("What was your relationship with {name}?"),
            format!("How did you know {name}?"),
        ],
        QuestionType::CharacterValues => vec![
            format!("What values or principles guided {name} through life?"),
            format!("How would you describe {whose} character? What mattered most to {obj}?"),
            format!(
                "What qualities made {name} who {} {}?",
                s.pronouns.subject(),
                s.pronouns.was()
            ),
        ],
        QuestionType::Impact => vec![
            format!("How did {name} shape your life, or the lives of others?"),
            format!("What difference did {name} make for the people around {obj}?"),
            format!("In what ways did {name} change you?"),
        ],
        QuestionType::FunnyMemory => vec![
            format!("Is there a funny or lighthearted memory of {name} that still makes you smile?"),
            format!("What's a story about {name} that always gets a laugh?"),
            format!("Did {name} have a sense of humor? Tell me about a moment that showed it."),
        ],
        QuestionType::CharacterMemory => vec![
            format!("Can you share a moment that really showed who {who} {was}?"),
            format!("Is there a defining moment that captures {whose} character?"),
        ],
        QuestionType::Hobbies => vec![
            format!("What did {name} love to do in {poss} free time?"),
            format!("What hobbies or interests filled {whose} days?"),
            format!("Were there passions or pastimes {who} {was} known for?"),
        ],
        QuestionType::WhatYouWillMiss => vec![
            format!("What will you miss most about {name}?"),
            format!("When you think about the days ahead, what about {name} will you miss the most?"),
        ],
        QuestionType::Challenges => vec![
            format!("Did {name} face any hardships or challenges with courage? (Optional, feel free to say \"skip\".)"),
            format!("Were there struggles {who} overcame that shaped {obj}? You can skip this one if you'd rather."),
        ],
        QuestionType::SmallDetails => vec![
            format!("Were there any small details, quirks or habits that were so uniquely {name}? (Optional)"),
            format!("Sometimes the little things say the most. Any habits or quirks of {whose} you'd like included? You can skip this."),
        ],
        QuestionType::Beliefs => vec![
            format!("Were there beliefs, faith traditions or rituals that were important to {obj}? (Optional)"),
            format!("Did {name} hold any beliefs or rituals close to {poss} heart? Feel free to skip."),
        ],
        QuestionType::FinalThoughts => vec![
            format!("Is there anything else you'd like to include about {name}? (Optional)"),
            format!("Before I write, is there anything else {who} would have wanted said about {refl}? You can skip this."),
        ],
    };
    pick(variants, rng)
}

/// Offer to write the draft now that enough is known.
pub fn draft_confirmation<R: Rng + ?Sized>(form: &EulogyForm, rng: &mut R) -> String {
    let s = Subject::from_form(form);
    let name = s.object();
    let whose = s.possessive();
    pick(
        vec![
            format!("I think I have enough to write a first draft of {whose} eulogy. Would you like me to create it now?"),
            format!("Thank you for everything you've shared about {name}. Shall I write a draft of the eulogy?"),
            format!("We have a lovely picture of {name}. Are you ready for me to generate a first draft?"),
        ],
        rng,
    )
}

/// Free-form continuation once a draft exists.
pub fn review_prompt<R: Rng + ?Sized>(form: &EulogyForm, rng: &mut R) -> String {
    let name = Subject::from_form(form).object().to_string();
    pick(
        vec![
            format!("How does the draft feel? Tell me anything you'd like to add or change about {name}, or ask me to rewrite it."),
            "Is there anything you'd like to adjust? You can share more details, or ask me to try again.".to_string(),
            format!("Take your time with it. If something about {name} is missing, just tell me and I can revise the draft."),
        ],
        rng,
    )
}

/// Prefix `next` with a short acknowledgment of what the user just said.
pub fn acknowledge_and_ask<R: Rng + ?Sized>(next: &str, rng: &mut R) -> String {
    let ack = ACKNOWLEDGMENTS.choose(rng).copied().unwrap_or("Thank you.");
    format!("{ack} {next}")
}
