//! Process-wide initialization: build the one orchestrator every request
//! shares.

use std::sync::Arc;

use anyhow::{Context, Result};

use infragen_core::invoker::{
    AgentIdentity, AssistantsClient, ChatCompletionsClient, DirectInvoker, GenerationInvoker,
    InvocationMode, SessionInvoker,
};
use infragen_core::{DomainProfile, Orchestrator};

use crate::config::InfragenConfig;

/// Build the generation identity, the configured invoker and the
/// orchestrator around them.
///
/// In session mode this registers the agent with the backend unless an
/// `assistant_id` is configured, so it performs network I/O.
pub async fn build_orchestrator(config: &InfragenConfig) -> Result<Orchestrator> {
    let profile = DomainProfile::terraform();
    let backend = &config.backend;
    let agent = AgentIdentity::for_profile(&profile, &backend.model).with_tools(backend.tools.clone());
    let http = backend.http_config()?;

    let invoker: Arc<dyn GenerationInvoker> = match backend.mode {
        InvocationMode::Direct => {
            let client = ChatCompletionsClient::new(http).context("failed to build HTTP client")?;
            Arc::new(DirectInvoker::new(Arc::new(client), agent))
        }
        InvocationMode::Session => {
            let client = AssistantsClient::new(http).context("failed to build HTTP client")?;
            let invoker =
                SessionInvoker::connect(Arc::new(client), &agent, backend.assistant_id.clone())
                    .await
                    .context("failed to register generation agent")?;
            Arc::new(invoker.with_poll_interval(backend.poll_interval))
        }
    };

    tracing::info!(
        mode = %backend.mode,
        model = %backend.model,
        base_url = %backend.base_url,
        validation = %config.generation.validation,
        "generation backend configured"
    );

    Ok(Orchestrator::new(invoker)
        .with_profile(profile)
        .with_context_options(config.generation.context_options.clone())
        .with_validation_policy(config.generation.validation))
}
