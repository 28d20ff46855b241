use std::time::Duration;

use super::AiError;

/// Ordered list of candidate models, highest priority first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLadder {
    models: Vec<String>,
}

impl ModelLadder {
    /// Builds a ladder from model identifiers
    ///
    /// Blank entries are dropped.
    ///
    /// ### Errors
    ///
    /// Returns `AiError::InvalidConfig` if no model remains
    pub fn new<I, S>(models: I) -> Result<Self, AiError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let models: Vec<String> = models
            .into_iter()
            .map(Into::into)
            .map(|m: String| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if models.is_empty() {
            return Err(AiError::InvalidConfig("model list is empty".to_string()));
        }
        Ok(Self { models })
    }

    /// The first entry, used when nothing has failed
    pub fn default_model(&self) -> &str {
        &self.models[0]
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Candidates in priority order, always starting from the top
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }
}

/// Bounded retry budget for one dispatch
///
/// Both budgets are shared by the whole ladder walk of a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait before retrying the same model after a 429
    pub rate_limit_delay: Duration,
    /// Wait before retrying after a transport failure
    pub network_retry_delay: Duration,
    pub max_rate_limit_retries: u32,
    pub max_network_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rate_limit_delay: Duration::from_secs(2),
            network_retry_delay: Duration::from_secs(1),
            max_rate_limit_retries: 1,
            max_network_retries: 1,
        }
    }
}

impl RetryPolicy {
    /// Same budgets, no waiting
    pub fn immediate() -> Self {
        Self {
            rate_limit_delay: Duration::ZERO,
            network_retry_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Phrases the gateway uses when a model cannot serve right now
const UNAVAILABLE_PHRASES: &[&str] = &[
    "no endpoints found",
    "not available",
    "unavailable",
    "model not found",
    "does not exist",
    "provider returned error",
    "decommissioned",
    "overloaded",
];

/// What to do after a non-success reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    RetrySameModel,
    NextModel,
    Fail,
}

/// Decides how to react to a rejected attempt
pub(crate) fn classify(status: u16, message: &str, rate_limit_budget_left: bool) -> Verdict {
    if status == 429 {
        return if rate_limit_budget_left {
            Verdict::RetrySameModel
        } else {
            Verdict::NextModel
        };
    }
    if status == 400 || is_unavailable(message) {
        return Verdict::NextModel;
    }
    Verdict::Fail
}

fn is_unavailable(message: &str) -> bool {
    let lowered = message.to_lowercase();
    UNAVAILABLE_PHRASES.iter().any(|p| lowered.contains(p))
}
