//! Eulogy Assist: guided conversation core for writing a eulogy.

pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;

pub use config::ConversationConfig;
pub use conversation::ConversationManager;
pub use error::{Error, Result};
