//! Agent runtime for the Ri assistant.
//!
//! Each message runs a short sequential pipeline:
//! 1. **Intent classification** (`classifier`): one model call decides whether
//!    the message is about a product and extracts a search keyword.
//! 2. **Product lookup** (`lookup`): substring search in the catalog, capped at
//!    five rows.
//! 3. **Grounded response** (`responder`): second model call with the persona,
//!    the user message and a bracketed note built from the lookup (`grounding`).
//!
//! Every stage returns an outcome value instead of an error, so `AgentRuntime`
//! always produces a `ChatReply`.
//!
//! The model only phrases the answer. Product names and prices come from the
//! catalog and are handed to it verbatim.

pub mod classifier;
pub mod conversation;
pub mod grounding;
pub mod llm;
pub mod lookup;
pub mod persona;
pub mod responder;
pub mod runtime;

pub use conversation::Conversation;
pub use llm::{client_from_config, LlmClient, LlmError};
pub use runtime::AgentRuntime;
