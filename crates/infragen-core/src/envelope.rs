//! The single response shape returned for every generation path.

use serde::{Deserialize, Serialize};

use crate::invoker::GenerationOutcome;

/// Prefix of every error carried inside an envelope.
pub const ERROR_PREFIX: &str = "An error occurred while processing your request: ";

/// `{"response": "..."}` -- success text or a human-readable error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub response: String,
}

impl ResponseEnvelope {
    /// Envelope carrying generated text.
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            response: text.into(),
        }
    }

    /// Envelope carrying an error description.
    pub fn failure(reason: impl AsRef<str>) -> Self {
        Self {
            response: format!("{ERROR_PREFIX}{}", reason.as_ref()),
        }
    }

    /// Collapse an outcome into an envelope.
    pub fn from_outcome(outcome: GenerationOutcome) -> Self {
        match outcome.into_result() {
            Ok(text) => Self::success(text),
            Err(reason) => Self::failure(reason),
        }
    }
}

impl From<GenerationOutcome> for ResponseEnvelope {
    fn from(outcome: GenerationOutcome) -> Self {
        Self::from_outcome(outcome)
    }
}
