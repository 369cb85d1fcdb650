use crate::llm::{CompletionRequest, Turn};
use crate::persona::{PERSONA_ACKNOWLEDGEMENT, PERSONA_PROMPT};

/// Exchanges kept after the persona preamble before the oldest ones are dropped.
pub const MAX_REMEMBERED_EXCHANGES: usize = 20;

/// Turn history sent to the responder.
///
/// Always starts with the persona instruction. HTTP requests build a fresh one
/// per call; the CLI owns a single instance for the whole session.
#[derive(Clone, Debug)]
pub struct Conversation {
    preamble: [Turn; 2],
    exchanges: Vec<(Turn, Turn)>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            preamble: [Turn::user(PERSONA_PROMPT), Turn::model(PERSONA_ACKNOWLEDGEMENT)],
            exchanges: Vec::new(),
        }
    }

    pub fn exchange_count(&self) -> usize {
        self.exchanges.len()
    }

    pub fn turns(&self) -> Vec<Turn> {
        let mut turns = self.preamble.to_vec();
        for (user, model) in &self.exchanges {
            turns.push(user.clone());
            turns.push(model.clone());
        }
        turns
    }

    /// History plus `prompt` as the final user turn; the conversation itself is untouched.
    pub fn request_with(&self, prompt: &str) -> CompletionRequest {
        let mut turns = self.turns();
        turns.push(Turn::user(prompt));
        CompletionRequest::new(turns)
    }

    pub fn record_exchange(&mut self, prompt: impl Into<String>, reply: impl Into<String>) {
        self.exchanges.push((Turn::user(prompt), Turn::model(reply)));
        if self.exchanges.len() > MAX_REMEMBERED_EXCHANGES {
            let overflow = self.exchanges.len() - MAX_REMEMBERED_EXCHANGES;
            self.exchanges.drain(..overflow);
        }
    }
}
