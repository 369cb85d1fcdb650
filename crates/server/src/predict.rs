use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use calorizz_agent::AgentRuntime;
use calorizz_core::errors::validate_message;
use calorizz_core::{ChatReply, ChatRequest};
use tracing::warn;
use uuid::Uuid;

#[derive(Clone)]
pub struct PredictState {
    pub runtime: Arc<AgentRuntime>,
    pub max_message_chars: usize,
}

pub const CORRELATION_HEADER: &str = "x-correlation-id";

pub fn router(state: PredictState) -> Router {
    Router::new().route("/predict", post(predict)).with_state(state)
}

pub async fn predict(
    State(state): State<PredictState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    match validate_message(&request.message, state.max_message_chars) {
        Ok(message) => Json(state.runtime.handle_message(message).await).into_response(),
        Err(error) => {
            let rejected = error.reject(Uuid::new_v4().to_string());
            warn!(
                event_name = "http.predict.rejected",
                correlation_id = %rejected.correlation_id,
                reason = rejected.reason.code(),
                error = %rejected,
                "predict request rejected"
            );
            let reply = ChatReply::success(rejected.user_message());
            ([(CORRELATION_HEADER, rejected.correlation_id)], Json(reply)).into_response()
        }
    }
}
