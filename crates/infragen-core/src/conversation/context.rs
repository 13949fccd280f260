//! Context building: summarize prior turns into a bounded text block.
//!
//! User turns are always carried forward. Assistant turns are carried only
//! when they mention one of the profile's context keywords, and then only as
//! a bounded prefix, so an arbitrarily long history cannot grow the prompt
//! without limit.

use crate::domain::DomainProfile;

use super::{ConversationTurn, Role};

/// Bounds applied while building a [`ContextBlock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    /// Maximum number of characters kept from an assistant turn.
    pub max_assistant_chars: usize,
    /// Marker appended after a carried assistant prefix.
    pub ellipsis: String,
}

impl ContextOptions {
    /// Default bound on carried assistant content, in characters.
    pub const DEFAULT_MAX_ASSISTANT_CHARS: usize = 500;
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            max_assistant_chars: Self::DEFAULT_MAX_ASSISTANT_CHARS,
            ellipsis: "...".to_string(),
        }
    }
}

/// Summarized conversation context. Empty blocks are omitted from prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextBlock {
    heading: String,
    lines: Vec<String>,
}

impl ContextBlock {
    /// Whether no turn produced a line.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The individual context lines, in conversation order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Render the block as prompt text. Returns an empty string when empty.
    pub fn render(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        format!("{}\n{}", self.heading, self.lines.join("\n\n"))
    }
}

/// Build a [`ContextBlock`] from prior turns, in their original order.
pub fn build_context(
    profile: &DomainProfile,
    history: &[ConversationTurn],
    options: &ContextOptions,
) -> ContextBlock {
    let mut lines = Vec::new();

    for turn in history {
        match turn.role {
            Role::User => lines.push(format!("Previous request: {}", turn.content)),
            Role::Assistant => {
                if !mentions_any(&turn.content, &profile.context_keywords) {
                    continue;
                }
                let prefix = truncate_chars(&turn.content, options.max_assistant_chars);
                lines.push(format!(
                    "{}: {}{}",
                    profile.assistant_label, prefix, options.ellipsis
                ));
            }
        }
    }

    tracing::debug!(
        turns = history.len(),
        carried = lines.len(),
        "built conversation context"
    );

    ContextBlock {
        heading: profile.context_heading.clone(),
        lines,
    }
}

fn mentions_any(content: &str, keywords: &[String]) -> bool {
    let lower = content.to_lowercase();
    keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
}

/// Return at most `max_chars` characters of `s`, never splitting a char.
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
