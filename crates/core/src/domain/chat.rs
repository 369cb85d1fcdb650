use serde::{Deserialize, Serialize};

pub const QUOTA_FALLBACK_REPLY: &str =
    "Maaf ya, Ri lagi kehabisan kuota buat mikir nih~ Coba tanya lagi nanti ya~";
pub const GENERIC_FALLBACK_REPLY: &str =
    "Maaf, Ri lagi ada gangguan sebentar~ Coba tanya lagi ya~";
pub const FAREWELL_LINE: &str = "Ri: Sampai jumpa, semoga harimu menyenangkan! 🌻";
pub const GREETING_LINE: &str = "🤖 Ri siap membantu! Ketik 'exit' atau 'quit' untuk keluar ya!";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    Success,
    QuotaExceeded,
}

impl ReplyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::QuotaExceeded => "quota_exceeded",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub status: ReplyStatus,
}

impl ChatReply {
    pub fn success(reply: impl Into<String>) -> Self {
        Self { reply: reply.into(), status: ReplyStatus::Success }
    }

    pub fn quota_exceeded() -> Self {
        Self { reply: QUOTA_FALLBACK_REPLY.to_string(), status: ReplyStatus::QuotaExceeded }
    }

    pub fn generic_failure() -> Self {
        Self::success(GENERIC_FALLBACK_REPLY)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatReply, ReplyStatus, QUOTA_FALLBACK_REPLY};

    #[test]
    fn reply_serializes_with_snake_case_status() {
        let json = serde_json::to_value(ChatReply::quota_exceeded()).expect("serialize reply");

        assert_eq!(json["status"], "quota_exceeded");
        assert_eq!(json["reply"], QUOTA_FALLBACK_REPLY);
    }

    #[test]
    fn generic_failure_keeps_success_status() {
        let reply = ChatReply::generic_failure();
        assert_eq!(reply.status, ReplyStatus::Success);
        assert_eq!(reply.status.as_str(), "success");
    }
}
