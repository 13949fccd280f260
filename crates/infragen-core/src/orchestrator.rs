//! The orchestrator: one request in, one envelope out.
//!
//! Steps, strictly forward:
//! 1. Build the context block from the request's history.
//! 2. Assemble the prompt.
//! 3. Invoke the generation backend (direct or session).
//! 4. Apply the validation policy to the outcome.
//! 5. Collapse the outcome into a [`ResponseEnvelope`].
//!
//! No step returns an error to the caller; every failure ends up as text in
//! the envelope.

use std::sync::Arc;

use tracing::{Instrument, info, info_span, warn};

use crate::conversation::{ContextOptions, GenerationRequest, build_context};
use crate::conversation::context::truncate_chars;
use crate::domain::DomainProfile;
use crate::envelope::ResponseEnvelope;
use crate::invoker::GenerationInvoker;
use crate::prompt::assemble_prompt;
use crate::validate::{ValidationPolicy, apply_policy};

/// Number of characters of prompt / response text written to the log.
const LOG_PREVIEW_CHARS: usize = 100;

/// Stateless request handler shared by every concurrent request.
pub struct Orchestrator {
    profile: DomainProfile,
    context_options: ContextOptions,
    validation: ValidationPolicy,
    invoker: Arc<dyn GenerationInvoker>,
}

impl Orchestrator {
    /// Build an orchestrator with the Terraform profile and default options.
    pub fn new(invoker: Arc<dyn GenerationInvoker>) -> Self {
        Self {
            profile: DomainProfile::default(),
            context_options: ContextOptions::default(),
            validation: ValidationPolicy::default(),
            invoker,
        }
    }

    pub fn with_profile(mut self, profile: DomainProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_context_options(mut self, options: ContextOptions) -> Self {
        self.context_options = options;
        self
    }

    pub fn with_validation_policy(mut self, policy: ValidationPolicy) -> Self {
        self.validation = policy;
        self
    }

    pub fn profile(&self) -> &DomainProfile {
        &self.profile
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        self.validation
    }

    /// Build the exact prompt that [`Self::handle`] would send.
    pub fn build_prompt(&self, request: &GenerationRequest) -> String {
        let context = build_context(
            &self.profile,
            &request.conversation_history,
            &self.context_options,
        );
        assemble_prompt(&self.profile, &context, &request.project_id, &request.prompt)
    }

    /// Handle one request end to end.
    pub async fn handle(&self, request: &GenerationRequest) -> ResponseEnvelope {
        let span = info_span!(
            "generate",
            project_id = %request.project_id,
            mode = %self.invoker.mode(),
        );
        self.handle_inner(request).instrument(span).await
    }

    async fn handle_inner(&self, request: &GenerationRequest) -> ResponseEnvelope {
        info!(
            prompt = truncate_chars(&request.prompt, LOG_PREVIEW_CHARS),
            history_len = request.conversation_history.len(),
            "processing generation request"
        );

        let prompt = self.build_prompt(request);
        let outcome = self.invoker.invoke(&prompt).await;

        match (outcome.text(), outcome.failure_reason()) {
            (Some(text), _) => info!(
                response = truncate_chars(text, LOG_PREVIEW_CHARS * 2),
                "generation succeeded"
            ),
            (None, reason) => warn!(reason = reason.unwrap_or(""), "generation failed"),
        }

        let outcome = apply_policy(self.validation, &self.profile, outcome);
        ResponseEnvelope::from_outcome(outcome)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("profile", &self.profile.name)
            .field("context_options", &self.context_options)
            .field("validation", &self.validation)
            .field("mode", &self.invoker.mode())
            .finish()
    }
}
