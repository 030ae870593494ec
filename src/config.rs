//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Per-session conversation configuration.
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Upper bound on a single draft generation call.
    pub generation_timeout: Duration,
    /// Upper bound on a single classifier call. Exceeding it yields `unknown`.
    pub classifier_timeout: Duration,
    /// Seed for template selection. `None` seeds from OS entropy.
    pub rng_seed: Option<u64>,
    /// Whether questions are prefixed with the progress checklist.
    pub show_checklist: bool,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(120),
            classifier_timeout: Duration::from_millis(1500),
            rng_seed: None,
            show_checklist: true,
        }
    }
}

impl ConversationConfig {
    /// Build a config from defaults overridden by `EULOGY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but with an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("EULOGY_GENERATION_TIMEOUT_SECS") {
            config.generation_timeout =
                Duration::from_secs(parse_value("EULOGY_GENERATION_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = lookup("EULOGY_CLASSIFIER_TIMEOUT_MS") {
            config.classifier_timeout =
                Duration::from_millis(parse_value("EULOGY_CLASSIFIER_TIMEOUT_MS", &raw)?);
        }
        if let Some(raw) = lookup("EULOGY_RNG_SEED") {
            config.rng_seed = Some(parse_value("EULOGY_RNG_SEED", &raw)?);
        }
        if let Some(raw) = lookup("EULOGY_SHOW_CHECKLIST") {
            config.show_checklist = match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(ConfigError::InvalidValue {
                        key: "EULOGY_SHOW_CHECKLIST".to_string(),
                        message: format!("expected a boolean, got '{other}'"),
                    });
                }
            };
        }

        Ok(config)
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}
