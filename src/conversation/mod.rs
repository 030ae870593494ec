//! Conversation core: fact store, state machine, templates, extractors and
//! the per-session turn orchestrator.

pub mod extract;
pub mod form;
pub mod intent;
pub mod labels;
pub mod manager;
pub mod message;
pub mod state;
pub mod templates;

pub use form::{DraftLength, EulogyForm, Pronouns, Tone};
pub use manager::{ConversationManager, TurnOutcome, TurnPhase};
pub use message::{ChatMessage, MessageRole, MessageSource};
pub use state::{ConversationState, Question, QuestionType, StateMachine};
