//! `POST /chat` – farming assistant answering from the session state.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AppState;
use crate::chat::{self, Intent};

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", post(handler))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatReply {
    intent: Intent,
    reply: String,
}

async fn handler(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Json<ChatReply> {
    // ---
    let intent = chat::classify(&req.message);
    debug!("Chat message classified as {:?}", intent);

    let slots = state.workflow.state().slots();
    Json(ChatReply {
        intent,
        reply: chat::reply(intent, &slots),
    })
}
