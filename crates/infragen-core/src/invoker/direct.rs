//! Direct mode: one backend call carrying the full prompt.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::trait_def::GenerationInvoker;
use super::types::{AgentIdentity, BackendError, GenerationOutcome, InvocationMode};

/// Backend that answers an instruction + prompt pair with final text.
#[async_trait]
pub trait DirectBackend: Send + Sync {
    /// Run the agent once; suspends until the backend returns its final text.
    async fn run_agent(&self, agent: &AgentIdentity, prompt: &str) -> Result<String, BackendError>;
}

/// [`GenerationInvoker`] for the single-call protocol.
pub struct DirectInvoker {
    backend: Arc<dyn DirectBackend>,
    agent: AgentIdentity,
}

impl DirectInvoker {
    pub fn new(backend: Arc<dyn DirectBackend>, agent: AgentIdentity) -> Self {
        Self { backend, agent }
    }

    pub fn agent(&self) -> &AgentIdentity {
        &self.agent
    }
}

impl std::fmt::Debug for DirectInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectInvoker")
            .field("agent", &self.agent.name)
            .field("model", &self.agent.model)
            .finish()
    }
}

#[async_trait]
impl GenerationInvoker for DirectInvoker {
    fn mode(&self) -> InvocationMode {
        InvocationMode::Direct
    }

    async fn invoke(&self, prompt: &str) -> GenerationOutcome {
        debug!(agent = %self.agent.name, prompt_len = prompt.len(), "running agent");
        match self.backend.run_agent(&self.agent, prompt).await {
            Ok(text) => GenerationOutcome::success(text),
            Err(e) => {
                warn!(error = %e, "agent run failed");
                GenerationOutcome::failure(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::DomainProfile;

    struct ScriptedBackend {
        reply: Result<String, String>,
        seen: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl DirectBackend for ScriptedBackend {
        async fn run_agent(
            &self,
            agent: &AgentIdentity,
            prompt: &str,
        ) -> Result<String, BackendError> {
            self.seen
                .lock()
                .unwrap()
                .push((agent.name.clone(), prompt.to_string()));
            self.reply.clone().map_err(BackendError::Failed)
        }
    }

    fn identity() -> AgentIdentity {
        AgentIdentity::for_profile(&DomainProfile::terraform(), "test-model")
    }

    #[tokio::test]
    async fn success_passes_text_through() {
        let backend = Arc::new(ScriptedBackend {
            reply: Ok("resource \"aws_s3_bucket\" \"b\" {}".to_string()),
            seen: Mutex::new(Vec::new()),
        });
        let invoker = DirectInvoker::new(backend.clone(), identity());

        let outcome = invoker.invoke("make a bucket").await;
        assert!(outcome.succeeded());
        assert!(outcome.text().unwrap().contains("aws_s3_bucket"));

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "Terraform Infrastructure Generator");
        assert_eq!(seen[0].1, "make a bucket");
    }

    #[tokio::test]
    async fn backend_error_becomes_failure() {
        let backend = Arc::new(ScriptedBackend {
            reply: Err("connection reset by peer".to_string()),
            seen: Mutex::new(Vec::new()),
        });
        let invoker = DirectInvoker::new(backend, identity());

        let outcome = invoker.invoke("make a bucket").await;
        assert!(!outcome.succeeded());
        assert_eq!(
            outcome.failure_reason(),
            Some("connection reset by peer")
        );
        assert_eq!(invoker.mode(), InvocationMode::Direct);
    }
}
