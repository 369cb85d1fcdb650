pub mod config;
pub mod domain;
pub mod errors;

pub use domain::chat::{ChatReply, ChatRequest, ReplyStatus};
pub use domain::intent::{IntentDecision, Keyword};
pub use domain::product::Product;
pub use errors::{DomainError, RejectedRequest};
