//! Conversational generation orchestrator.
//!
//! Turns a natural-language infrastructure request plus optional prior
//! conversation turns into a call against a generation backend and
//! normalizes whatever comes back into a single response envelope.
//!
//! ```text
//! GenerationRequest
//!     |
//!     v
//! conversation::build_context  -->  prompt::assemble_prompt
//!                                       |
//!                                       v
//!                             dyn GenerationInvoker (direct | session)
//!                                       |
//!                                       v
//!                          validate::apply_policy  -->  ResponseEnvelope
//! ```

pub mod conversation;
pub mod domain;
pub mod envelope;
pub mod invoker;
pub mod orchestrator;
pub mod prompt;
pub mod validate;

pub use conversation::{ConversationTurn, GenerationRequest, Role};
pub use domain::DomainProfile;
pub use envelope::ResponseEnvelope;
pub use invoker::{GenerationInvoker, GenerationOutcome, InvocationMode};
pub use orchestrator::Orchestrator;
