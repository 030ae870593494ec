//! Conversation state machine: decides what to ask next.
//!
//! The machine is a pure function of the fact store plus two pieces of
//! bookkeeping (which categories were already asked, and whether the draft
//! has been offered). It never fails; "nothing left to learn" is a valid
//! steady state.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::form::EulogyForm;
use super::intent;
use super::templates;

/// Where the conversation currently is.
///
/// Advances forward through the collecting states as slots fill, reaches
/// `ReadyForDraft`, and sticks at `ReviewingDraft` once a draft exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Greeting,
    CollectingName,
    CollectingRelationship,
    CollectingTraits,
    CollectingHobbies,
    CollectingStories,
    CollectingChallenges,
    CollectingSmallDetails,
    CollectingBeliefs,
    CollectingFinalThoughts,
    ReadyForDraft,
    ReviewingDraft,
}

impl ConversationState {
    /// The optional category collected in this state, if it is an optional state.
    pub fn optional_category(&self) -> Option<QuestionType> {
        match self {
            Self::CollectingChallenges => Some(QuestionType::Challenges),
            Self::CollectingSmallDetails => Some(QuestionType::SmallDetails),
            Self::CollectingBeliefs => Some(QuestionType::Beliefs),
            Self::CollectingFinalThoughts => Some(QuestionType::FinalThoughts),
            _ => None,
        }
    }

    /// Whether a "skip" answer is meaningful in this state.
    pub fn is_optional(&self) -> bool {
        self.optional_category().is_some()
    }

    /// Whether this state is sticky for the rest of the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ReviewingDraft)
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Greeting => "greeting",
            Self::CollectingName => "collecting_name",
            Self::CollectingRelationship => "collecting_relationship",
            Self::CollectingTraits => "collecting_traits",
            Self::CollectingHobbies => "collecting_hobbies",
            Self::CollectingStories => "collecting_stories",
            Self::CollectingChallenges => "collecting_challenges",
            Self::CollectingSmallDetails => "collecting_small_details",
            Self::CollectingBeliefs => "collecting_beliefs",
            Self::CollectingFinalThoughts => "collecting_final_thoughts",
            Self::ReadyForDraft => "ready_for_draft",
            Self::ReviewingDraft => "reviewing_draft",
        };
        write!(f, "{s}")
    }
}

/// Question topic associated with one slot or slot group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Name,
    Relationship,
    CharacterValues,
    Impact,
    FunnyMemory,
    CharacterMemory,
    Hobbies,
    WhatYouWillMiss,
    Challenges,
    SmallDetails,
    Beliefs,
    FinalThoughts,
}

impl QuestionType {
    /// Every category, in the order the machine asks them.
    pub const PRIORITY: [QuestionType; 12] = [
        Self::Name,
        Self::Relationship,
        Self::CharacterValues,
        Self::Impact,
        Self::FunnyMemory,
        Self::CharacterMemory,
        Self::Hobbies,
        Self::WhatYouWillMiss,
        Self::Challenges,
        Self::SmallDetails,
        Self::Beliefs,
        Self::FinalThoughts,
    ];

    /// The collecting state this category belongs to.
    pub fn state(&self) -> ConversationState {
        use ConversationState::*;
        match self {
            Self::Name => CollectingName,
            Self::Relationship => CollectingRelationship,
            Self::CharacterValues | Self::Impact => CollectingTraits,
            Self::FunnyMemory | Self::CharacterMemory => CollectingStories,
            Self::Hobbies | Self::WhatYouWillMiss => CollectingHobbies,
            Self::Challenges => CollectingChallenges,
            Self::SmallDetails => CollectingSmallDetails,
            Self::Beliefs => CollectingBeliefs,
            Self::FinalThoughts => CollectingFinalThoughts,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            Self::Challenges | Self::SmallDetails | Self::Beliefs | Self::FinalThoughts
        )
    }

    /// Whether the form already satisfies this category.
    ///
    /// The two memory categories share one condition: either memory will do.
    pub fn is_answered(&self, form: &EulogyForm) -> bool {
        match self {
            Self::Name => form.subject_name.is_some(),
            Self::Relationship => form.relationship.is_some(),
            Self::CharacterValues => form.character_values.is_some(),
            Self::Impact => form.impact.is_some(),
            Self::FunnyMemory | Self::CharacterMemory => form.has_memory(),
            Self::Hobbies => !form.hobbies.is_empty(),
            Self::WhatYouWillMiss => form.what_you_will_miss.is_some(),
            Self::Challenges => form.challenges_overcome.is_some(),
            Self::SmallDetails => form.small_details.is_some(),
            Self::Beliefs => form.beliefs_or_rituals.is_some(),
            Self::FinalThoughts => form.final_thoughts.is_some(),
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::Relationship => "relationship",
            Self::CharacterValues => "character_values",
            Self::Impact => "impact",
            Self::FunnyMemory => "funny_memory",
            Self::CharacterMemory => "character_memory",
            Self::Hobbies => "hobbies",
            Self::WhatYouWillMiss => "what_you_will_miss",
            Self::Challenges => "challenges",
            Self::SmallDetails => "small_details",
            Self::Beliefs => "beliefs",
            Self::FinalThoughts => "final_thoughts",
        };
        write!(f, "{s}")
    }
}

/// What the machine wants to say next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// The category being asked, or `None` for the draft offer and review prompt.
    pub category: Option<QuestionType>,
    pub text: String,
}

/// Tracks conversation progress for one session.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: ConversationState,
    asked: HashSet<QuestionType>,
    draft_offered: bool,
    pending: Option<QuestionType>,
    show_checklist: bool,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: ConversationState::Greeting,
            asked: HashSet::new(),
            draft_offered: false,
            pending: None,
            show_checklist: true,
        }
    }

    /// Toggle the progress checklist above each question.
    pub fn with_checklist(mut self, show: bool) -> Self {
        self.show_checklist = show;
        self
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    /// The category asked most recently, while its answer is still awaited.
    pub fn pending_category(&self) -> Option<QuestionType> {
        self.pending
    }

    pub fn has_asked(&self, category: QuestionType) -> bool {
        self.asked.contains(&category)
    }

    pub fn draft_offered(&self) -> bool {
        self.draft_offered
    }

    /// Compute the state implied by the form, without side effects.
    pub fn determine_next_state(&self, form: &EulogyForm) -> ConversationState {
        if self.state == ConversationState::ReviewingDraft {
            return ConversationState::ReviewingDraft;
        }
        if form.is_ready_for_draft() && !self.draft_offered {
            return ConversationState::ReadyForDraft;
        }
        QuestionType::PRIORITY
            .iter()
            .find(|category| !category.is_answered(form))
            .map(|category| category.state())
            .unwrap_or(ConversationState::ReadyForDraft)
    }

    /// Decide and render the next thing to say.
    ///
    /// Each category is asked at most once. Unmet categories that were
    /// already asked are passed over; an unanswered beliefs question goes
    /// straight to the draft offer.
    pub fn next_question<R: Rng + ?Sized>(&mut self, form: &EulogyForm, rng: &mut R) -> Question {
        let next = self.determine_next_state(form);
        match next {
            ConversationState::ReviewingDraft => {
                self.transition(next);
                self.pending = None;
                Question {
                    category: None,
                    text: templates::review_prompt(form, rng),
                }
            }
            ConversationState::ReadyForDraft => self.offer_draft(form, rng),
            _ => {
                let unmet = QuestionType::PRIORITY
                    .iter()
                    .copied()
                    .filter(|category| !category.is_answered(form));
                for category in unmet {
                    if !self.asked.contains(&category) {
                        return self.ask(category, form, rng);
                    }
                    if category == QuestionType::Beliefs {
                        break;
                    }
                }
                self.offer_draft(form, rng)
            }
        }
    }

    /// Force the sticky review state. Idempotent.
    pub fn mark_draft_generated(&mut self) {
        self.transition(ConversationState::ReviewingDraft);
        self.pending = None;
    }

    /// Back to a fresh greeting.
    pub fn reset(&mut self) {
        self.state = ConversationState::Greeting;
        self.asked.clear();
        self.draft_offered = false;
        self.pending = None;
    }

    pub fn user_wants_draft(&self, text: &str) -> bool {
        intent::user_wants_draft(text)
    }

    pub fn user_wants_to_skip(&self, text: &str) -> bool {
        intent::user_wants_to_skip(text)
    }

    fn ask<R: Rng + ?Sized>(
        &mut self,
        category: QuestionType,
        form: &EulogyForm,
        rng: &mut R,
    ) -> Question {
        self.asked.insert(category);
        self.pending = Some(category);
        self.transition(category.state());

        let question = templates::question(category, form, rng);
        let text = if self.show_checklist {
            format!("{}\n\n{}", form.checklist(), question)
        } else {
            question
        };
        Question {
            category: Some(category),
            text,
        }
    }

    fn offer_draft<R: Rng + ?Sized>(&mut self, form: &EulogyForm, rng: &mut R) -> Question {
        self.transition(ConversationState::ReadyForDraft);
        self.draft_offered = true;
        self.pending = None;
        Question {
            category: None,
            text: templates::draft_confirmation(form, rng),
        }
    }

    fn transition(&mut self, next: ConversationState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "Conversation state transition");
            self.state = next;
        }
    }
}
