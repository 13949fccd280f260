//! Request-scoped conversation data supplied by the caller.
//!
//! Nothing here is persisted: the caller sends the full history with every
//! request and it is dropped once the response has been produced.

pub mod context;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub use context::{ContextBlock, ContextOptions, build_context};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        };
        f.write_str(s)
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(RoleParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Role`] string.
#[derive(Debug, Clone)]
pub struct RoleParseError(pub String);

impl fmt::Display for RoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid conversation role: {:?}", self.0)
    }
}

impl std::error::Error for RoleParseError {}

// ---------------------------------------------------------------------------
// Turns and requests
// ---------------------------------------------------------------------------

/// One prior message in a project's conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: String,
    pub project_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A single generation request, as received on `POST /agent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub project_id: String,
    /// Prior turns in chronological order. Absent and `null` both mean empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub conversation_history: Vec<ConversationTurn>,
}

impl GenerationRequest {
    /// Build a request with no prior history.
    pub fn new(prompt: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            project_id: project_id.into(),
            conversation_history: Vec::new(),
        }
    }

    /// Attach prior conversation turns.
    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.conversation_history = history;
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ConversationTurn>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ConversationTurn>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_display_roundtrip() {
        for role in [Role::User, Role::Assistant] {
            let parsed: Role = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn role_rejects_unknown() {
        let err = "system".parse::<Role>().unwrap_err();
        assert!(err.to_string().contains("system"));
    }

    #[test]
    fn request_without_history_defaults_to_empty() {
        let req: GenerationRequest =
            serde_json::from_str(r#"{"prompt": "create an S3 bucket", "project_id": "p1"}"#)
                .unwrap();
        assert!(req.conversation_history.is_empty());
        assert_eq!(req.project_id, "p1");
    }

    #[test]
    fn request_with_null_history_defaults_to_empty() {
        let req: GenerationRequest = serde_json::from_str(
            r#"{"prompt": "x", "project_id": "p1", "conversation_history": null}"#,
        )
        .unwrap();
        assert!(req.conversation_history.is_empty());
    }

    #[test]
    fn request_parses_turns() {
        let body = r#"{
            "prompt": "add a subnet",
            "project_id": "p1",
            "conversation_history": [
                {
                    "id": "1",
                    "project_id": "p1",
                    "role": "user",
                    "content": "create a VPC",
                    "created_at": "2024-05-01T10:00:00.000Z"
                }
            ]
        }"#;
        let req: GenerationRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.conversation_history.len(), 1);
        assert_eq!(req.conversation_history[0].role, Role::User);
    }

    #[test]
    fn request_rejects_unknown_role() {
        let body = r#"{
            "prompt": "x",
            "project_id": "p1",
            "conversation_history": [
                {"id": "1", "project_id": "p1", "role": "tool", "content": "c",
                 "created_at": "2024-05-01T10:00:00Z"}
            ]
        }"#;
        assert!(serde_json::from_str::<GenerationRequest>(body).is_err());
    }
}
