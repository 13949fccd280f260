//! Session mode: create session, post message, start run, poll, read.
//!
//! The run status is tracked by a [`GenerationSession`] whose transitions
//! are validated against the graph below. Polling stops at the first
//! terminal status; only `completed` leads to reading the newest message.
//!
//! ```text
//! created     -> queued | in_progress | completed | failed | expired
//! queued      -> queued | in_progress | completed | failed | expired
//! in_progress -> in_progress | completed | failed | expired
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::trait_def::GenerationInvoker;
use super::types::{AgentIdentity, BackendError, GenerationOutcome, InvocationMode};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Status of a backend run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Created,
    Queued,
    InProgress,
    Completed,
    Failed,
    Expired,
}

impl SessionStatus {
    /// Whether polling should stop at this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Expired)
    }

    /// Map a backend run status string onto the session graph.
    ///
    /// Besides the canonical names, `requires_action` and `cancelling` are
    /// still pending, while `cancelled` and `incomplete` end the run without
    /// a result. Anything else is unknown.
    pub fn from_backend(s: &str) -> Option<Self> {
        match s {
            "requires_action" | "cancelling" => Some(Self::InProgress),
            "cancelled" | "incomplete" => Some(Self::Failed),
            other => other.parse().ok(),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Expired => "expired",
        };
        f.write_str(s)
    }
}

impl FromStr for SessionStatus {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "queued" => Ok(Self::Queued),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "expired" => Ok(Self::Expired),
            other => Err(SessionError::UnknownStatus(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while driving a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("unknown run status: {0:?}")]
    UnknownStatus(String),

    #[error("invalid run status transition: {from} -> {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("backend run did not complete")]
    NotCompleted(SessionStatus),

    #[error("backend returned no message text")]
    NoMessageText,
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Run handle returned when a run is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub run_id: String,
    /// Status string exactly as the backend reported it.
    pub status: String,
}

/// Map a raw backend status onto the session graph.
pub fn parse_backend_status(raw: &str) -> Result<SessionStatus, SessionError> {
    SessionStatus::from_backend(raw).ok_or_else(|| SessionError::UnknownStatus(raw.to_owned()))
}

/// Backend interaction state for one request. Never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSession {
    pub session_id: String,
    pub pending_message_id: String,
    pub run_id: Option<String>,
    pub status: SessionStatus,
}

impl GenerationSession {
    pub fn new(session_id: impl Into<String>, pending_message_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            pending_message_id: pending_message_id.into(),
            run_id: None,
            status: SessionStatus::Created,
        }
    }

    /// Check whether `from -> to` is an edge in the status graph.
    pub fn is_valid_transition(from: SessionStatus, to: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (from, to),
            (Created, Queued | InProgress | Completed | Failed | Expired)
                | (Queued, Queued | InProgress | Completed | Failed | Expired)
                | (InProgress, InProgress | Completed | Failed | Expired)
        )
    }

    /// Record the started run and its initial status.
    pub fn start(
        &mut self,
        run_id: impl Into<String>,
        status: SessionStatus,
    ) -> Result<(), SessionError> {
        self.run_id = Some(run_id.into());
        self.advance(status)
    }

    /// Move to the status reported by the backend.
    pub fn advance(&mut self, to: SessionStatus) -> Result<(), SessionError> {
        if !Self::is_valid_transition(self.status, to) {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Backend speaking the four-step session protocol.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Register the generation identity, returning its backend id.
    async fn register_agent(&self, agent: &AgentIdentity) -> Result<String, BackendError>;

    /// Create an empty session (thread).
    async fn create_session(&self) -> Result<String, BackendError>;

    /// Post a user message, returning the message id.
    async fn post_message(&self, session_id: &str, text: &str) -> Result<String, BackendError>;

    /// Start a run of `agent_id` over the session.
    async fn start_run(&self, session_id: &str, agent_id: &str) -> Result<RunHandle, BackendError>;

    /// Current status of a run, as the backend's raw status string.
    async fn run_status(&self, session_id: &str, run_id: &str) -> Result<String, BackendError>;

    /// First text segment of the newest message in the session, if any.
    async fn latest_message_text(&self, session_id: &str) -> Result<Option<String>, BackendError>;
}

// ---------------------------------------------------------------------------
// Invoker
// ---------------------------------------------------------------------------

/// [`GenerationInvoker`] for the session/poll protocol.
pub struct SessionInvoker {
    backend: Arc<dyn SessionBackend>,
    agent_id: String,
    poll_interval: Duration,
}

impl SessionInvoker {
    /// Default delay between two status polls.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

    /// Build an invoker for an already-registered agent id.
    pub fn new(backend: Arc<dyn SessionBackend>, agent_id: impl Into<String>) -> Self {
        Self {
            backend,
            agent_id: agent_id.into(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    /// Build an invoker, registering `agent` with the backend unless an
    /// existing agent id is supplied.
    pub async fn connect(
        backend: Arc<dyn SessionBackend>,
        agent: &AgentIdentity,
        existing_agent_id: Option<String>,
    ) -> Result<Self, BackendError> {
        let agent_id = match existing_agent_id {
            Some(id) => id,
            None => {
                let id = backend.register_agent(agent).await?;
                info!(agent = %agent.name, agent_id = %id, "registered generation agent");
                id
            }
        };
        Ok(Self::new(backend, agent_id))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    async fn drive(&self, prompt: &str) -> Result<String, SessionError> {
        let session_id = self.backend.create_session().await?;
        let message_id = self.backend.post_message(&session_id, prompt).await?;
        let mut session = GenerationSession::new(session_id, message_id);

        let run = self
            .backend
            .start_run(&session.session_id, &self.agent_id)
            .await?;
        let run_id = run.run_id;
        session.start(run_id.clone(), parse_backend_status(&run.status)?)?;
        debug!(session_id = %session.session_id, run_id = %run_id, status = %session.status, "run started");

        while !session.is_terminal() {
            tokio::time::sleep(self.poll_interval).await;
            let raw = self
                .backend
                .run_status(&session.session_id, &run_id)
                .await?;
            let status = parse_backend_status(&raw)?;
            session.advance(status)?;
            debug!(run_id = %run_id, status = %status, "polled run");
        }

        if session.status != SessionStatus::Completed {
            return Err(SessionError::NotCompleted(session.status));
        }

        self.backend
            .latest_message_text(&session.session_id)
            .await?
            .ok_or(SessionError::NoMessageText)
    }
}

impl fmt::Debug for SessionInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionInvoker")
            .field("agent_id", &self.agent_id)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[async_trait]
impl GenerationInvoker for SessionInvoker {
    fn mode(&self) -> InvocationMode {
        InvocationMode::Session
    }

    async fn invoke(&self, prompt: &str) -> GenerationOutcome {
        match self.drive(prompt).await {
            Ok(text) => GenerationOutcome::success(text),
            Err(SessionError::NotCompleted(status)) => {
                warn!(status = %status, "run ended without completing");
                GenerationOutcome::failure(SessionError::NotCompleted(status).to_string())
            }
            Err(e) => {
                warn!(error = %e, "session run failed");
                GenerationOutcome::failure(e.to_string())
            }
        }
    }
}
