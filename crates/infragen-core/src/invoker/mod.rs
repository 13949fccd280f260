//! Generation invokers: drive a backend from prompt to terminal outcome.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator
//!     |
//!     v
//! Arc<dyn GenerationInvoker> --invoke(prompt)--> GenerationOutcome
//!     |
//!     +-- DirectInvoker  --> dyn DirectBackend  (ChatCompletionsClient)
//!     |
//!     +-- SessionInvoker --> dyn SessionBackend (AssistantsClient)
//!             create_session -> post_message -> start_run
//!             -> run_status ... (until terminal) -> latest_message_text
//! ```

pub mod assistants;
pub mod chat_completions;
pub mod direct;
pub mod http;
pub mod session;
pub mod trait_def;
pub mod types;

pub use assistants::AssistantsClient;
pub use chat_completions::ChatCompletionsClient;
pub use direct::{DirectBackend, DirectInvoker};
pub use http::HttpBackendConfig;
pub use session::{GenerationSession, SessionBackend, SessionInvoker, SessionStatus};
pub use trait_def::GenerationInvoker;
pub use types::{AgentIdentity, BackendError, GenerationOutcome, InvocationMode};
