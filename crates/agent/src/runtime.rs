use std::sync::Arc;

use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use calorizz_core::domain::chat::ChatReply;
use calorizz_core::domain::intent::IntentDecision;
use calorizz_db::ProductRepository;

use crate::classifier::IntentClassifier;
use crate::conversation::Conversation;
use crate::grounding::Grounding;
use crate::llm::LlmClient;
use crate::lookup::ProductLookup;
use crate::responder::{GenerationOutcome, GroundedResponder};

/// Classify, optionally look up, respond. Always produces a reply.
pub struct AgentRuntime {
    classifier: IntentClassifier,
    lookup: ProductLookup,
    responder: GroundedResponder,
}

impl AgentRuntime {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        products: Arc<dyn ProductRepository>,
        lookup_limit: u32,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(llm.clone()),
            lookup: ProductLookup::new(products, lookup_limit),
            responder: GroundedResponder::new(llm),
        }
    }

    /// Stateless entry point: every call starts from a fresh conversation.
    pub async fn handle_message(&self, message: &str) -> ChatReply {
        let mut conversation = Conversation::new();
        self.handle_in_conversation(&mut conversation, message).await
    }

    pub async fn handle_in_conversation(
        &self,
        conversation: &mut Conversation,
        message: &str,
    ) -> ChatReply {
        let correlation_id = Uuid::new_v4().to_string();
        let span = info_span!("chat_message", correlation_id = %correlation_id);
        self.run_pipeline(conversation, message).instrument(span).await
    }

    async fn run_pipeline(&self, conversation: &mut Conversation, message: &str) -> ChatReply {
        info!(event_name = "agent.pipeline.received", stage = "received", "message received");

        info!(event_name = "agent.pipeline.stage", stage = "classifying", "classifying intent");
        let grounding = match self.classifier.classify(message).await {
            IntentDecision::NeedsLookup(keyword) => {
                info!(
                    event_name = "agent.pipeline.stage",
                    stage = "looking_up",
                    keyword = %keyword,
                    "looking up catalog"
                );
                Grounding::from(self.lookup.lookup(&keyword).await)
            }
            IntentDecision::NoLookup => Grounding::None,
        };

        info!(event_name = "agent.pipeline.stage", stage = "responding", "generating reply");
        let reply = match self.responder.respond(conversation, message, &grounding).await {
            GenerationOutcome::Reply(text) => ChatReply::success(text),
            GenerationOutcome::QuotaExceeded => ChatReply::quota_exceeded(),
            GenerationOutcome::Failed(_) => ChatReply::generic_failure(),
        };

        info!(
            event_name = "agent.pipeline.done",
            stage = "done",
            status = reply.status.as_str(),
            "reply ready"
        );
        reply
    }
}
