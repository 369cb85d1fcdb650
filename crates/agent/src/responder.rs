use std::sync::Arc;

use tracing::{error, warn};

use crate::conversation::Conversation;
use crate::grounding::{compose_prompt, Grounding};
use crate::llm::{LlmClient, LlmError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationOutcome {
    Reply(String),
    QuotaExceeded,
    Failed(String),
}

pub struct GroundedResponder {
    llm: Arc<dyn LlmClient>,
}

impl GroundedResponder {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Generates the reply; only successful exchanges are added to `conversation`.
    pub async fn respond(
        &self,
        conversation: &mut Conversation,
        message: &str,
        grounding: &Grounding,
    ) -> GenerationOutcome {
        let prompt = compose_prompt(message, grounding);
        let request = conversation.request_with(&prompt);

        match self.llm.complete(&request).await {
            Ok(reply) => {
                let reply = reply.trim().to_string();
                conversation.record_exchange(prompt, reply.clone());
                GenerationOutcome::Reply(reply)
            }
            Err(LlmError::QuotaExceeded(detail)) => {
                warn!(
                    event_name = "agent.responder.quota_exceeded",
                    provider = self.llm.provider_name(),
                    detail = %detail,
                    "generation call hit provider quota"
                );
                GenerationOutcome::QuotaExceeded
            }
            Err(failure) => {
                error!(
                    event_name = "agent.responder.failed",
                    provider = self.llm.provider_name(),
                    error = %failure,
                    "generation call failed"
                );
                GenerationOutcome::Failed(failure.to_string())
            }
        }
    }
}
