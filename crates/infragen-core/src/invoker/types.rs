//! Types shared by every invocation strategy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DomainProfile;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Terminal result of one generation attempt: generated text or a failure
/// reason, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    result: Result<String, String>,
}

impl GenerationOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            result: Ok(text.into()),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            result: Err(reason.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// Generated text, present only on success.
    pub fn text(&self) -> Option<&str> {
        self.result.as_deref().ok()
    }

    /// Failure reason, present only on failure.
    pub fn failure_reason(&self) -> Option<&str> {
        self.result.as_ref().err().map(String::as_str)
    }

    /// `Ok(text)` on success, `Err(reason)` on failure.
    pub fn into_result(self) -> Result<String, String> {
        self.result
    }
}

// ---------------------------------------------------------------------------
// Invocation mode
// ---------------------------------------------------------------------------

/// Which protocol the generation backend is driven with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationMode {
    /// One request, one final answer.
    #[default]
    Direct,
    /// Create session, post message, start run, poll, read newest message.
    Session,
}

impl fmt::Display for InvocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Direct => "direct",
            Self::Session => "session",
        };
        f.write_str(s)
    }
}

impl FromStr for InvocationMode {
    type Err = InvocationModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "session" => Ok(Self::Session),
            other => Err(InvocationModeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`InvocationMode`] string.
#[derive(Debug, Clone)]
pub struct InvocationModeParseError(pub String);

impl fmt::Display for InvocationModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid invocation mode: {:?} (expected direct or session)",
            self.0
        )
    }
}

impl std::error::Error for InvocationModeParseError {}

// ---------------------------------------------------------------------------
// Agent identity
// ---------------------------------------------------------------------------

/// The single generation identity the service speaks as.
///
/// Built once at startup and handed to the invoker; never looked up
/// ambiently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    pub name: String,
    pub instructions: String,
    pub model: String,
    /// Backend tool names enabled for the identity (session mode only).
    pub tools: Vec<String>,
}

impl AgentIdentity {
    /// Build the identity for a domain profile and model.
    pub fn for_profile(profile: &DomainProfile, model: impl Into<String>) -> Self {
        Self {
            name: profile.display_name.clone(),
            instructions: profile.agent_instructions.clone(),
            model: model.into(),
            tools: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by a generation backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode backend response: {0}")]
    Decode(String),

    /// Failure reported by the backend itself (or by a test double).
    #[error("{0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_constructors_are_exclusive() {
        let ok = GenerationOutcome::success("resource {}");
        assert!(ok.succeeded());
        assert_eq!(ok.text(), Some("resource {}"));
        assert!(ok.failure_reason().is_none());
        assert_eq!(ok.into_result(), Ok("resource {}".to_string()));

        let err = GenerationOutcome::failure("boom");
        assert!(!err.succeeded());
        assert!(err.text().is_none());
        assert_eq!(err.failure_reason(), Some("boom"));
        assert_eq!(err.into_result(), Err("boom".to_string()));
    }

    #[test]
    fn invocation_mode_parse() {
        assert_eq!("direct".parse::<InvocationMode>().unwrap(), InvocationMode::Direct);
        assert_eq!("session".parse::<InvocationMode>().unwrap(), InvocationMode::Session);
        assert!("poll".parse::<InvocationMode>().is_err());
        assert_eq!(InvocationMode::default(), InvocationMode::Direct);
    }

    #[test]
    fn identity_uses_profile_wording() {
        let profile = DomainProfile::terraform();
        let identity = AgentIdentity::for_profile(&profile, "gpt-4o")
            .with_tools(vec!["code_interpreter".to_string()]);
        assert_eq!(identity.name, "Terraform Infrastructure Generator");
        assert_eq!(identity.model, "gpt-4o");
        assert_eq!(identity.tools, ["code_interpreter"]);
        assert!(identity.instructions.contains("STRICT RULES"));
    }
}
