use std::path::Path;

use anyhow::{Context, Result};

use infragen_core::{ConversationTurn, GenerationRequest, Orchestrator, ResponseEnvelope};

/// Read a conversation history file: a JSON array of turns, oldest first.
pub fn load_history(path: &Path) -> Result<Vec<ConversationTurn>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read history file at {}", path.display()))?;
    let history: Vec<ConversationTurn> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse history file at {}", path.display()))?;
    Ok(history)
}

/// Run one generation outside the server and return its envelope.
pub async fn run_generate(
    orchestrator: &Orchestrator,
    project_id: &str,
    prompt: &str,
    history: Option<&Path>,
) -> Result<ResponseEnvelope> {
    let history = match history {
        Some(path) => load_history(path)?,
        None => Vec::new(),
    };
    let request = GenerationRequest::new(prompt, project_id).with_history(history);
    Ok(orchestrator.handle(&request).await)
}
