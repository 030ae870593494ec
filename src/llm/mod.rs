//! External model seams for the conversation core.
//!
//! The core never depends on a model directly. A draft generator turns a
//! (possibly partial) form into eulogy prose, and an intent classifier
//! offers an advisory topic label for a user utterance. Both are injected
//! as trait objects; offline defaults live alongside.

pub mod classifier;
pub mod draft;

pub use classifier::KeywordClassifier;
pub use draft::TemplateDraftGenerator;

use async_trait::async_trait;

use crate::conversation::form::EulogyForm;
use crate::conversation::message::MessageSource;
use crate::error::{ClassifierError, GenerationError};

/// Produces eulogy prose from collected facts.
///
/// Implementations must tolerate partial forms: optional slots may be
/// missing or explicitly skipped (empty strings).
#[async_trait]
pub trait DraftGenerator: Send + Sync {
    /// Short identifier for logging.
    fn name(&self) -> &str;

    /// How drafts from this generator are tagged in the transcript.
    /// Model-backed generators return [`MessageSource::AiGenerated`].
    fn source(&self) -> MessageSource {
        MessageSource::Draft
    }

    async fn generate(&self, form: &EulogyForm) -> Result<String, GenerationError>;
}

/// Labels an utterance with a coarse topic such as "relationship" or "hobby".
///
/// Should return the literal `"unknown"` when unsure. Errors are treated as
/// `"unknown"` by the caller and never reach the user.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Short identifier for logging.
    fn name(&self) -> &str;

    async fn classify(&self, text: &str) -> Result<String, ClassifierError>;
}
