//! AI research assistant relay

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::AppState;
use spacebio_common::{
    assistant::{build_system_prompt, ChatMessage},
    errors::{AppError, Result},
    metrics,
};

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    pub messages: Vec<ChatMessage>,
}

/// Prepend the system prompt and stream the upstream reply back unchanged
#[instrument(skip_all)]
pub async fn ai_research_assistant(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AssistantRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|rejection| AppError::InvalidFormat {
        message: rejection.body_text(),
    })?;

    // A failed count only degrades the prompt
    let publication_count = match state.store.count_publications().await {
        Ok(count) => Some(count),
        Err(e) => {
            warn!(error = %e, "Failed to count publications for assistant prompt");
            None
        }
    };

    info!(
        messages = request.messages.len(),
        publications = ?publication_count,
        model = state.chat.model_name(),
        "AI Assistant request received"
    );

    let prompt = build_system_prompt(
        publication_count,
        &state.config.assistant.fallback_publication_count,
    );

    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    messages.push(ChatMessage::system(prompt));
    messages.extend(request.messages);

    let stream = match state.chat.stream_chat(messages).await {
        Ok(stream) => stream,
        Err(e) => {
            metrics::record_assistant(outcome_label(&e));
            return Err(e);
        }
    };

    metrics::record_assistant("streamed");

    Ok((
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(stream),
    )
        .into_response())
}

fn outcome_label(error: &AppError) -> &'static str {
    match error {
        AppError::RateLimited => "rate_limited",
        AppError::CreditsDepleted => "credits_depleted",
        AppError::AiService { .. } => "upstream_error",
        _ => "error",
    }
}
