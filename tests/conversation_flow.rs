//! End-to-end conversation flows through `ConversationManager`.
//!
//! Collaborators are stubbed so every test is deterministic and offline.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use eulogy_assist::config::ConversationConfig;
use eulogy_assist::conversation::templates::{GENERATION_CANCELLED, GENERATION_FAILED};
use eulogy_assist::conversation::{
    ConversationManager, ConversationState, EulogyForm, MessageRole, Pronouns, QuestionType,
};
use eulogy_assist::error::{ClassifierError, GenerationError};
use eulogy_assist::llm::{
    DraftGenerator, IntentClassifier, KeywordClassifier, TemplateDraftGenerator,
};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const MANDATORY_TURNS: [&str; 7] = [
    "Margaret Jones",
    "she was my grandmother",
    "she was endlessly patient and generous",
    "she taught me to always show up for people",
    "she once drove 6 hours in a storm to see me graduate",
    "gardening and baking",
    "her laugh",
];

/// Classifier that never has an opinion.
struct UnknownClassifier;

#[async_trait]
impl IntentClassifier for UnknownClassifier {
    fn name(&self) -> &str {
        "unknown"
    }

    async fn classify(&self, _text: &str) -> Result<String, ClassifierError> {
        Ok("unknown".to_string())
    }
}

/// Classifier that always errors.
struct BrokenClassifier;

#[async_trait]
impl IntentClassifier for BrokenClassifier {
    fn name(&self) -> &str {
        "broken"
    }

    async fn classify(&self, _text: &str) -> Result<String, ClassifierError> {
        Err(ClassifierError::Failed {
            name: "broken".to_string(),
            reason: "model unavailable".to_string(),
        })
    }
}

/// Fails the first `failures` calls, then succeeds.
struct FlakyGenerator {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakyGenerator {
    fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DraftGenerator for FlakyGenerator {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn generate(&self, form: &EulogyForm) -> Result<String, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(GenerationError::Failed {
                reason: "backend overloaded".to_string(),
            });
        }
        Ok(format!("Draft {} for {}", call + 1, form.display_name()))
    }
}

/// Never finishes on its own.
struct StalledGenerator;

#[async_trait]
impl DraftGenerator for StalledGenerator {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn generate(&self, _form: &EulogyForm) -> Result<String, GenerationError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("too late".to_string())
    }
}

fn config() -> ConversationConfig {
    ConversationConfig {
        rng_seed: Some(7),
        show_checklist: false,
        ..Default::default()
    }
}

fn manager_with(generator: Arc<dyn DraftGenerator>) -> ConversationManager {
    ConversationManager::new(generator, Arc::new(UnknownClassifier), config())
}

async fn drive(manager: &mut ConversationManager, turns: &[&str]) {
    for turn in turns {
        manager.handle_utterance(turn).await;
    }
}

#[tokio::test]
async fn mandatory_answers_reach_draft_and_review() {
    let result = timeout(TEST_TIMEOUT, async {
        let mut manager = ConversationManager::new(
            Arc::new(TemplateDraftGenerator::new()),
            Arc::new(KeywordClassifier::new()),
            config(),
        );
        assert_eq!(manager.state(), ConversationState::Greeting);
        let first = manager.start();
        assert_eq!(first.asked, Some(QuestionType::Name));

        let expected = [
            Some(QuestionType::Relationship),
            Some(QuestionType::CharacterValues),
            Some(QuestionType::Impact),
            Some(QuestionType::FunnyMemory),
            Some(QuestionType::Hobbies),
            Some(QuestionType::WhatYouWillMiss),
            None,
        ];
        for (turn, asked) in MANDATORY_TURNS.iter().zip(expected) {
            let outcome = manager.handle_utterance(turn).await;
            assert_eq!(outcome.asked, asked, "after {turn:?}");
        }
        assert_eq!(manager.state(), ConversationState::ReadyForDraft);

        let form = manager.form();
        assert_eq!(form.subject_name.as_deref(), Some("Margaret Jones"));
        assert_eq!(form.relationship.as_deref(), Some("grandmother"));
        assert_eq!(form.pronouns, Pronouns::She);
        assert_eq!(form.hobbies, vec!["gardening", "baking"]);
        assert!(form.is_ready_for_draft());

        let outcome = manager.handle_utterance("yes").await;
        assert!(outcome.draft_generated);
        assert_eq!(outcome.state, ConversationState::ReviewingDraft);
        let last = manager.transcript().last().unwrap();
        assert_eq!(last.role, MessageRole::Draft);
        assert!(last.content.contains("Margaret Jones"));
        assert!(last.content.contains("gardening and baking"));
    })
    .await;
    assert!(result.is_ok(), "test timed out");
}

#[tokio::test]
async fn relationship_sets_pronouns_without_lexical_cue() {
    let mut manager = manager_with(Arc::new(FlakyGenerator::new(0)));
    manager.start();
    drive(&mut manager, &["Margaret Jones", "my grandmother"]).await;
    assert_eq!(manager.form().pronouns, Pronouns::She);
}

#[tokio::test]
async fn transcript_alternates_roles() {
    let mut manager = manager_with(Arc::new(FlakyGenerator::new(0)));
    manager.start();
    drive(&mut manager, &MANDATORY_TURNS).await;

    let transcript = manager.transcript();
    // Greeting, first question, then one user/assistant pair per turn.
    assert_eq!(transcript.len(), 2 + 2 * MANDATORY_TURNS.len());
    assert_eq!(transcript[2].role, MessageRole::User);
    assert_eq!(transcript[2].content, "Margaret Jones");
    assert_eq!(transcript[3].role, MessageRole::Assistant);
    assert!(transcript.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn generator_failure_keeps_ready_state_and_retry_succeeds() {
    let generator = Arc::new(FlakyGenerator::new(1));
    let mut manager = manager_with(generator.clone());
    manager.start();
    drive(&mut manager, &MANDATORY_TURNS).await;

    let failed = manager.handle_utterance("yes please").await;
    assert!(!failed.draft_generated);
    assert_eq!(failed.state, ConversationState::ReadyForDraft);
    assert_eq!(failed.reply.unwrap().content, GENERATION_FAILED);

    let retried = manager.handle_utterance("yes").await;
    assert!(retried.draft_generated);
    assert_eq!(retried.state, ConversationState::ReviewingDraft);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn generation_timeout_is_recoverable() {
    let mut manager = ConversationManager::new(
        Arc::new(StalledGenerator),
        Arc::new(UnknownClassifier),
        ConversationConfig {
            generation_timeout: Duration::from_millis(20),
            ..config()
        },
    );
    manager.start();
    drive(&mut manager, &MANDATORY_TURNS).await;

    let outcome = timeout(TEST_TIMEOUT, manager.handle_utterance("go ahead"))
        .await
        .expect("generation should time out");
    assert_eq!(outcome.reply.unwrap().content, GENERATION_FAILED);
    assert_eq!(manager.state(), ConversationState::ReadyForDraft);
}

#[tokio::test]
async fn cancellation_leaves_form_and_state_untouched() {
    let mut manager = manager_with(Arc::new(StalledGenerator));
    manager.start();
    drive(&mut manager, &MANDATORY_TURNS).await;
    let form_before = manager.form().clone();

    let token = manager.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let outcome = timeout(TEST_TIMEOUT, manager.handle_utterance("yes"))
        .await
        .expect("cancellation should end the turn");
    assert_eq!(outcome.reply.unwrap().content, GENERATION_CANCELLED);
    assert!(!outcome.draft_generated);
    assert_eq!(manager.state(), ConversationState::ReadyForDraft);
    assert_eq!(manager.form(), &form_before);
    assert!(!manager.cancel_token().is_cancelled());
    assert!(
        manager
            .transcript()
            .iter()
            .all(|m| m.role != MessageRole::Draft)
    );
}

#[tokio::test]
async fn classifier_failure_is_swallowed() {
    let mut manager = ConversationManager::new(
        Arc::new(FlakyGenerator::new(0)),
        Arc::new(BrokenClassifier),
        config(),
    );
    manager.start();
    drive(&mut manager, &MANDATORY_TURNS).await;

    assert!(manager.form().is_ready_for_draft());
    assert_eq!(manager.state(), ConversationState::ReadyForDraft);
    assert!(
        manager
            .transcript()
            .iter()
            .all(|m| !m.content.contains("model unavailable"))
    );
}

#[tokio::test]
async fn declined_draft_visits_optional_questions_with_skips() {
    let mut manager = manager_with(Arc::new(FlakyGenerator::new(0)));
    manager.start();
    drive(&mut manager, &MANDATORY_TURNS).await;

    let declined = manager.handle_utterance("not yet").await;
    assert_eq!(declined.asked, Some(QuestionType::Challenges));
    assert_eq!(declined.state, ConversationState::CollectingChallenges);

    let skipped = manager.handle_utterance("skip").await;
    assert_eq!(manager.form().challenges_overcome.as_deref(), Some(""));
    assert_eq!(skipped.asked, Some(QuestionType::SmallDetails));

    let answered = manager.handle_utterance("she always hummed while cooking").await;
    assert_eq!(
        manager.form().small_details.as_deref(),
        Some("she always hummed while cooking")
    );
    assert_eq!(answered.asked, Some(QuestionType::Beliefs));

    manager.handle_utterance("no thanks").await;
    assert_eq!(manager.form().beliefs_or_rituals.as_deref(), Some(""));

    let offered = manager.handle_utterance("nothing").await;
    assert_eq!(manager.form().final_thoughts.as_deref(), Some(""));
    assert_eq!(offered.asked, None);
    assert_eq!(offered.state, ConversationState::ReadyForDraft);

    let drafted = manager.handle_utterance("sure").await;
    assert!(drafted.draft_generated);
}

#[tokio::test]
async fn skip_words_outside_optional_states_are_not_skips() {
    let mut manager = manager_with(Arc::new(FlakyGenerator::new(0)));
    manager.start();
    drive(&mut manager, &["Margaret Jones", "my grandmother"]).await;
    // Asked about character values; "nothing" is just an answer here.
    manager.handle_utterance("nothing fazed her").await;
    assert_eq!(manager.form().character_values.as_deref(), Some("nothing fazed her"));
}

#[tokio::test]
async fn revision_request_regenerates_draft() {
    let generator = Arc::new(FlakyGenerator::new(0));
    let mut manager = manager_with(generator.clone());
    manager.start();
    drive(&mut manager, &MANDATORY_TURNS).await;
    manager.handle_utterance("yes").await;

    let feedback = manager.handle_utterance("thank you, it's lovely").await;
    assert!(!feedback.draft_generated);
    assert_eq!(feedback.state, ConversationState::ReviewingDraft);
    assert_eq!(feedback.reply.unwrap().role, MessageRole::Assistant);

    let revised = manager.handle_utterance("could you rewrite it?").await;
    assert!(revised.draft_generated);
    assert_eq!(revised.reply.unwrap().content, "Draft 2 for Margaret Jones");
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);

    let drafts = manager
        .transcript()
        .iter()
        .filter(|m| m.role == MessageRole::Draft)
        .count();
    assert_eq!(drafts, 2);
}

#[tokio::test]
async fn no_category_is_asked_twice() {
    let mut manager = manager_with(Arc::new(FlakyGenerator::new(0)));
    let mut asked = HashSet::new();
    if let Some(category) = manager.start().asked {
        asked.insert(category);
    }
    for _ in 0..30 {
        let outcome = manager.handle_utterance("hmm").await;
        if let Some(category) = outcome.asked {
            assert!(asked.insert(category), "{category} asked twice");
        }
    }
    // Name and relationship only come from extractors and stay unknown.
    assert!(manager.form().subject_name.is_none());
    assert!(!manager.form().is_ready_for_draft());
    assert_eq!(manager.state(), ConversationState::ReadyForDraft);
}

#[tokio::test]
async fn checklist_prefixes_questions_when_enabled() {
    let mut manager = ConversationManager::new(
        Arc::new(FlakyGenerator::new(0)),
        Arc::new(UnknownClassifier),
        ConversationConfig {
            show_checklist: true,
            ..config()
        },
    );
    manager.start();
    let outcome = manager.handle_utterance("Margaret Jones").await;
    let text = outcome.reply.unwrap().content;
    assert!(text.starts_with("Progress:"));
    assert!(text.contains("✓ Name"));
    assert!(text.contains("○ Relationship"));
}

#[tokio::test]
async fn same_seed_same_conversation() {
    let mut a = manager_with(Arc::new(FlakyGenerator::new(0)));
    let mut b = manager_with(Arc::new(FlakyGenerator::new(0)));
    a.start();
    b.start();
    drive(&mut a, &MANDATORY_TURNS).await;
    drive(&mut b, &MANDATORY_TURNS).await;

    let texts = |m: &ConversationManager| -> Vec<String> {
        m.transcript().iter().map(|msg| msg.content.clone()).collect()
    };
    assert_eq!(texts(&a), texts(&b));
}
