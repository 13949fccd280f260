//! Direct-mode backend over an OpenAI-compatible `/chat/completions` API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::direct::DirectBackend;
use super::http::{ApiClient, HttpBackendConfig};
use super::types::{AgentIdentity, BackendError};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Runs the agent as a system message plus one user message.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    api: ApiClient,
}

impl ChatCompletionsClient {
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            api: ApiClient::new(config, &[])?,
        })
    }
}

#[async_trait]
impl DirectBackend for ChatCompletionsClient {
    async fn run_agent(&self, agent: &AgentIdentity, prompt: &str) -> Result<String, BackendError> {
        let request = ChatRequest {
            model: &agent.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &agent.instructions,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response: ChatResponse = self.api.post_json("/chat/completions", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BackendError::Decode("completion contained no message content".into()))
    }
}
