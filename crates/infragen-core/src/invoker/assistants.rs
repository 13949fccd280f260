//! Session-mode backend over the OpenAI-compatible assistants API.
//!
//! | step | request |
//! |------|---------|
//! | register agent | `POST /assistants` |
//! | create session | `POST /threads` |
//! | post message | `POST /threads/{thread}/messages` |
//! | start run | `POST /threads/{thread}/runs` |
//! | poll run | `GET /threads/{thread}/runs/{run}` |
//! | read result | `GET /threads/{thread}/messages?order=desc&limit=1` |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::http::{ApiClient, HttpBackendConfig};
use super::session::{RunHandle, SessionBackend};
use super::types::{AgentIdentity, BackendError};

const ASSISTANTS_HEADERS: &[(&str, &str)] = &[("OpenAI-Beta", "assistants=v2")];

#[derive(Debug, Serialize)]
struct CreateAssistant<'a> {
    name: &'a str,
    instructions: &'a str,
    model: &'a str,
    tools: Vec<ToolSpec<'a>>,
}

#[derive(Debug, Serialize)]
struct ToolSpec<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Run {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    data: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    text: Option<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    value: String,
}

/// Assistants-API client implementing [`SessionBackend`].
#[derive(Debug, Clone)]
pub struct AssistantsClient {
    api: ApiClient,
}

impl AssistantsClient {
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            api: ApiClient::new(config, ASSISTANTS_HEADERS)?,
        })
    }
}

#[async_trait]
impl SessionBackend for AssistantsClient {
    async fn register_agent(&self, agent: &AgentIdentity) -> Result<String, BackendError> {
        let body = CreateAssistant {
            name: &agent.name,
            instructions: &agent.instructions,
            model: &agent.model,
            tools: agent.tools.iter().map(|t| ToolSpec { kind: t }).collect(),
        };
        let created: Created = self.api.post_json("/assistants", &body).await?;
        Ok(created.id)
    }

    async fn create_session(&self) -> Result<String, BackendError> {
        let created: Created = self.api.post_json("/threads", &json!({})).await?;
        Ok(created.id)
    }

    async fn post_message(&self, session_id: &str, text: &str) -> Result<String, BackendError> {
        let body = json!({ "role": "user", "content": text });
        let created: Created = self
            .api
            .post_json(&format!("/threads/{session_id}/messages"), &body)
            .await?;
        Ok(created.id)
    }

    async fn start_run(&self, session_id: &str, agent_id: &str) -> Result<RunHandle, BackendError> {
        let body = json!({ "assistant_id": agent_id });
        let run: Run = self
            .api
            .post_json(&format!("/threads/{session_id}/runs"), &body)
            .await?;
        Ok(RunHandle {
            run_id: run.id,
            status: run.status,
        })
    }

    async fn run_status(
        &self,
        session_id: &str,
        run_id: &str,
    ) -> Result<String, BackendError> {
        let run: Run = self
            .api
            .get_json(&format!("/threads/{session_id}/runs/{run_id}"))
            .await?;
        Ok(run.status)
    }

    async fn latest_message_text(&self, session_id: &str) -> Result<Option<String>, BackendError> {
        let list: MessageList = self
            .api
            .get_json(&format!("/threads/{session_id}/messages?order=desc&limit=1"))
            .await?;

        let text = list.data.into_iter().next().and_then(|message| {
            message
                .content
                .into_iter()
                .find(|part| part.kind == "text")
                .and_then(|part| part.text)
                .map(|t| t.value)
        });
        Ok(text)
    }
}
