//! Turn orchestrator: one `ConversationManager` per session.
//!
//! A turn runs the extractors, consults the classifier, maps its label,
//! checks the intent detectors the current state allows, and then either
//! writes the draft or asks the next question. Turns take `&mut self`, so a
//! session is single-writer; separate sessions share nothing.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::extract::{self, ExtractionReport};
use super::form::EulogyForm;
use super::intent;
use super::labels::{self, UNKNOWN_LABEL};
use super::message::ChatMessage;
use super::state::{ConversationState, QuestionType, StateMachine};
use super::templates;
use crate::config::ConversationConfig;
use crate::error::{ClassifierError, GenerationError};
use crate::llm::{DraftGenerator, IntentClassifier};

/// Coarse activity indicator for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    Idle,
    /// Waiting on the classifier or the draft generator.
    Thinking,
}

/// What a single turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The message appended in response, if any.
    pub reply: Option<ChatMessage>,
    /// Machine state after the turn.
    pub state: ConversationState,
    /// Category asked by the reply, if it was a question.
    pub asked: Option<QuestionType>,
    pub draft_generated: bool,
}

enum DraftAttempt {
    Generated,
    Failed,
    Cancelled,
}

pub struct ConversationManager {
    form: EulogyForm,
    machine: StateMachine,
    messages: Vec<ChatMessage>,
    rng: StdRng,
    generator: Arc<dyn DraftGenerator>,
    classifier: Arc<dyn IntentClassifier>,
    config: ConversationConfig,
    cancel: CancellationToken,
    phase: watch::Sender<TurnPhase>,
}

impl ConversationManager {
    pub fn new(
        generator: Arc<dyn DraftGenerator>,
        classifier: Arc<dyn IntentClassifier>,
        config: ConversationConfig,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (phase, _) = watch::channel(TurnPhase::Idle);
        Self {
            form: EulogyForm::new(),
            machine: StateMachine::new().with_checklist(config.show_checklist),
            messages: Vec::new(),
            rng,
            generator,
            classifier,
            config,
            cancel: CancellationToken::new(),
            phase,
        }
    }

    pub fn form(&self) -> &EulogyForm {
        &self.form
    }

    pub fn state(&self) -> ConversationState {
        self.machine.state()
    }

    /// The ordered transcript so far.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Token that aborts the draft generation of the current turn.
    ///
    /// Grab it before starting a turn; once it fires, a fresh token is
    /// installed and must be fetched again.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<TurnPhase> {
        self.phase.subscribe()
    }

    /// Emit the greeting and the first question.
    pub fn start(&mut self) -> TurnOutcome {
        self.push(ChatMessage::assistant(templates::GREETING));
        let question = self.machine.next_question(&self.form, &mut self.rng);
        let reply = self.push(ChatMessage::assistant(question.text));
        info!(state = %self.machine.state(), "Conversation started");
        self.outcome(Some(reply), question.category, false)
    }

    /// Process one user utterance.
    pub async fn handle_utterance(&mut self, text: &str) -> TurnOutcome {
        let text = text.trim();
        self.push(ChatMessage::user(text));
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }

        let mut report = ExtractionReport::default();
        extract::extract_relationship_into(&mut self.form, text, &mut report);

        let label = self.classify(text).await;

        extract::extract_remaining_into(&mut self.form, text, &mut report);
        if let Some(outcome) = labels::apply_label(&mut self.form, &label, text) {
            debug!(label = %label, rule = outcome.rule, changed = outcome.changed, "Label applied");
        }
        if report != ExtractionReport::default() {
            debug!(?report, "Facts extracted");
        }

        match self.machine.state() {
            ConversationState::ReadyForDraft if intent::user_wants_draft(text) => {
                return self.draft_turn().await;
            }
            ConversationState::ReviewingDraft => {
                if intent::user_wants_revision(text) {
                    return self.draft_turn().await;
                }
                let prompt = self.machine.next_question(&self.form, &mut self.rng);
                let reply = self.push(ChatMessage::assistant(prompt.text));
                return self.outcome(Some(reply), None, false);
            }
            state => {
                if let Some(category) = state.optional_category() {
                    if intent::user_wants_to_skip(text) {
                        self.skip(category);
                    } else {
                        self.capture_answer(text);
                    }
                } else {
                    self.capture_answer(text);
                }
            }
        }

        let question = self.machine.next_question(&self.form, &mut self.rng);
        let reply = self.push(ChatMessage::assistant(question.text));
        self.outcome(Some(reply), question.category, false)
    }

    /// Write (or rewrite) the draft from the current form.
    ///
    /// Only meaningful once the draft has been offered; earlier calls still
    /// generate from whatever is known.
    pub async fn regenerate_draft(&mut self) -> TurnOutcome {
        self.draft_turn().await
    }

    /// Start over with an empty form and transcript.
    pub fn reset(&mut self) {
        self.form = EulogyForm::new();
        self.machine.reset();
        self.messages.clear();
        self.cancel = CancellationToken::new();
        self.phase.send_replace(TurnPhase::Idle);
        info!("Conversation reset");
    }

    async fn classify(&self, text: &str) -> String {
        self.phase.send_replace(TurnPhase::Thinking);
        let timeout = self.config.classifier_timeout;
        let result = match tokio::time::timeout(timeout, self.classifier.classify(text)).await {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::TimedOut { timeout }),
        };
        self.phase.send_replace(TurnPhase::Idle);

        match result {
            Ok(label) if !label.trim().is_empty() => label,
            Ok(_) => UNKNOWN_LABEL.to_string(),
            Err(e) => {
                warn!(
                    classifier = self.classifier.name(),
                    error = %e,
                    "Classifier failed, using heuristics only"
                );
                UNKNOWN_LABEL.to_string()
            }
        }
    }

    async fn draft_turn(&mut self) -> TurnOutcome {
        match self.generate_draft().await {
            DraftAttempt::Generated => {
                let reply = self.messages.last().cloned();
                self.outcome(reply, None, true)
            }
            DraftAttempt::Failed => {
                let reply = self.push(ChatMessage::assistant(templates::GENERATION_FAILED));
                self.outcome(Some(reply), None, false)
            }
            DraftAttempt::Cancelled => {
                let reply = self.push(ChatMessage::assistant(templates::GENERATION_CANCELLED));
                self.outcome(Some(reply), None, false)
            }
        }
    }

    async fn generate_draft(&mut self) -> DraftAttempt {
        let token = self.cancel.clone();
        let timeout = self.config.generation_timeout;
        info!(generator = self.generator.name(), "Generating draft");
        self.phase.send_replace(TurnPhase::Thinking);

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(GenerationError::Cancelled),
            res = tokio::time::timeout(timeout, self.generator.generate(&self.form)) => match res {
                Ok(result) => result,
                Err(_) => Err(GenerationError::TimedOut { timeout }),
            },
        };
        self.phase.send_replace(TurnPhase::Idle);

        match result {
            Ok(draft) if !draft.trim().is_empty() => {
                self.push(ChatMessage::draft_from(self.generator.source(), draft));
                self.machine.mark_draft_generated();
                info!(state = %self.machine.state(), "Draft generated");
                DraftAttempt::Generated
            }
            Ok(_) => {
                warn!(generator = self.generator.name(), "Generator returned an empty draft");
                DraftAttempt::Failed
            }
            Err(GenerationError::Cancelled) => {
                info!("Draft generation cancelled");
                self.cancel = CancellationToken::new();
                DraftAttempt::Cancelled
            }
            Err(e) => {
                warn!(generator = self.generator.name(), error = %e, "Draft generation failed");
                DraftAttempt::Failed
            }
        }
    }

    /// Record the empty-string sentinel for a declined optional question.
    fn skip(&mut self, category: QuestionType) {
        let slot = match category {
            QuestionType::Challenges => &mut self.form.challenges_overcome,
            QuestionType::SmallDetails => &mut self.form.small_details,
            QuestionType::Beliefs => &mut self.form.beliefs_or_rituals,
            QuestionType::FinalThoughts => &mut self.form.final_thoughts,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(String::new());
            debug!(category = %category, "Optional question skipped");
        }
    }

    /// Treat the utterance as the answer to the pending question when
    /// nothing else filled that slot.
    fn capture_answer(&mut self, text: &str) -> bool {
        let Some(category) = self.machine.pending_category() else {
            return false;
        };
        if text.is_empty() || category.is_answered(&self.form) {
            return false;
        }

        let form = &mut self.form;
        let captured = match category {
            // Only the dedicated extractors fill these.
            QuestionType::Name | QuestionType::Relationship => false,
            QuestionType::CharacterValues => form.set_character_values(text),
            QuestionType::Impact => fill(&mut form.impact, text),
            QuestionType::FunnyMemory => {
                form.add_anecdote(text);
                fill(&mut form.funny_memory, text)
            }
            QuestionType::CharacterMemory => {
                form.add_anecdote(text);
                fill(&mut form.character_memory, text)
            }
            QuestionType::Hobbies => {
                let mut added = false;
                for item in extract::split_list(text) {
                    added |= form.add_hobby(&item);
                }
                added
            }
            QuestionType::WhatYouWillMiss => fill(&mut form.what_you_will_miss, text),
            QuestionType::Challenges => fill(&mut form.challenges_overcome, text),
            QuestionType::SmallDetails => fill(&mut form.small_details, text),
            QuestionType::Beliefs => fill(&mut form.beliefs_or_rituals, text),
            QuestionType::FinalThoughts => fill(&mut form.final_thoughts, text),
        };
        if captured {
            debug!(category = %category, "Answer captured");
        }
        captured
    }

    fn push(&mut self, message: ChatMessage) -> ChatMessage {
        self.messages.push(message.clone());
        message
    }

    fn outcome(
        &self,
        reply: Option<ChatMessage>,
        asked: Option<QuestionType>,
        draft_generated: bool,
    ) -> TurnOutcome {
        TurnOutcome {
            reply,
            state: self.machine.state(),
            asked,
            draft_generated,
        }
    }
}

fn fill(slot: &mut Option<String>, text: &str) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(text.to_string());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::form::Pronouns;
    use crate::conversation::message::{MessageRole, MessageSource};
    use async_trait::async_trait;
    use std::time::Duration;

    struct EchoGenerator;

    #[async_trait]
    impl DraftGenerator for EchoGenerator {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, form: &EulogyForm) -> Result<String, GenerationError> {
            Ok(format!("In memory of {}", form.display_name()))
        }
    }

    struct ModelGenerator;

    #[async_trait]
    impl DraftGenerator for ModelGenerator {
        fn name(&self) -> &str {
            "model"
        }

        fn source(&self) -> MessageSource {
            MessageSource::AiGenerated
        }

        async fn generate(&self, _form: &EulogyForm) -> Result<String, GenerationError> {
            Ok("A life well lived.".to_string())
        }
    }

    struct FixedClassifier(&'static str);

    #[async_trait]
    impl IntentClassifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn classify(&self, _text: &str) -> Result<String, ClassifierError> {
            Ok(self.0.to_string())
        }
    }

    struct SlowClassifier;

    #[async_trait]
    impl IntentClassifier for SlowClassifier {
        fn name(&self) -> &str {
            "slow"
        }

        async fn classify(&self, _text: &str) -> Result<String, ClassifierError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("hobby".to_string())
        }
    }

    fn config() -> ConversationConfig {
        ConversationConfig {
            rng_seed: Some(42),
            show_checklist: false,
            ..Default::default()
        }
    }

    fn manager(classifier: Arc<dyn IntentClassifier>) -> ConversationManager {
        ConversationManager::new(Arc::new(EchoGenerator), classifier, config())
    }

    #[test]
    fn start_greets_then_asks_name() {
        let mut manager = manager(Arc::new(FixedClassifier("unknown")));
        let outcome = manager.start();
        assert_eq!(outcome.asked, Some(QuestionType::Name));
        assert_eq!(outcome.state, ConversationState::CollectingName);
        assert_eq!(manager.transcript().len(), 2);
        assert_eq!(manager.transcript()[0].content, templates::GREETING);
    }

    #[tokio::test]
    async fn name_then_relationship_turns() {
        let mut manager = manager(Arc::new(FixedClassifier("unknown")));
        manager.start();

        let outcome = manager.handle_utterance("Margaret Jones").await;
        assert_eq!(manager.form().subject_name.as_deref(), Some("Margaret Jones"));
        assert_eq!(outcome.asked, Some(QuestionType::Relationship));

        let outcome = manager.handle_utterance("she was my grandmother").await;
        assert_eq!(manager.form().relationship.as_deref(), Some("grandmother"));
        assert_eq!(manager.form().pronouns, Pronouns::She);
        assert_eq!(outcome.asked, Some(QuestionType::CharacterValues));
    }

    #[tokio::test]
    async fn answer_capture_fills_pending_slot() {
        let mut manager = manager(Arc::new(FixedClassifier("unknown")));
        manager.start();
        manager.handle_utterance("Ruth").await;
        manager.handle_utterance("my aunt").await;
        manager.handle_utterance("fiercely loyal").await;
        assert_eq!(manager.form().character_values.as_deref(), Some("fiercely loyal"));
        assert_eq!(manager.form().traits, vec!["fiercely loyal"]);
    }

    #[tokio::test]
    async fn label_and_capture_both_apply() {
        let mut manager = manager(Arc::new(FixedClassifier("hobby")));
        manager.start();
        manager.handle_utterance("Ruth").await;
        manager.handle_utterance("my aunt").await;
        // Asked about character values, but the classifier says hobby.
        manager.handle_utterance("sailing").await;
        assert_eq!(manager.form().hobbies, vec!["sailing"]);
        assert_eq!(manager.form().character_values.as_deref(), Some("sailing"));
    }

    #[tokio::test]
    async fn classifier_timeout_degrades_to_unknown() {
        let mut manager = ConversationManager::new(
            Arc::new(EchoGenerator),
            Arc::new(SlowClassifier),
            ConversationConfig {
                classifier_timeout: Duration::from_millis(10),
                ..config()
            },
        );
        manager.start();
        let outcome = manager.handle_utterance("Walter").await;
        assert_eq!(manager.form().subject_name.as_deref(), Some("Walter"));
        assert!(manager.form().hobbies.is_empty());
        assert_eq!(outcome.asked, Some(QuestionType::Relationship));
    }

    #[tokio::test]
    async fn phase_returns_to_idle() {
        let mut manager = manager(Arc::new(FixedClassifier("unknown")));
        let phase = manager.subscribe_phase();
        manager.start();
        manager.handle_utterance("Margaret").await;
        assert_eq!(*phase.borrow(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn regenerate_appends_draft() {
        let mut manager = manager(Arc::new(FixedClassifier("unknown")));
        manager.start();
        manager.handle_utterance("Margaret").await;
        let outcome = manager.regenerate_draft().await;
        assert!(outcome.draft_generated);
        assert_eq!(outcome.state, ConversationState::ReviewingDraft);
        let last = manager.transcript().last().unwrap();
        assert_eq!(last.role, MessageRole::Draft);
        assert_eq!(last.content, "In memory of Margaret");
        assert_eq!(last.source, MessageSource::Draft);
    }

    #[tokio::test]
    async fn model_drafts_are_tagged_ai_generated() {
        let mut manager = ConversationManager::new(
            Arc::new(ModelGenerator),
            Arc::new(FixedClassifier("unknown")),
            config(),
        );
        manager.start();
        manager.handle_utterance("Margaret").await;
        manager.regenerate_draft().await;
        let last = manager.transcript().last().unwrap();
        assert_eq!(last.role, MessageRole::Draft);
        assert_eq!(last.source, MessageSource::AiGenerated);
    }

    #[tokio::test]
    async fn reset_clears_session() {
        let mut manager = manager(Arc::new(FixedClassifier("unknown")));
        manager.start();
        manager.handle_utterance("Margaret").await;
        manager.reset();
        assert_eq!(manager.state(), ConversationState::Greeting);
        assert!(manager.transcript().is_empty());
        assert_eq!(manager.form(), &EulogyForm::new());
    }
}
