//! Wire DTOs and decoding helpers for the chat-completions API.
//!
//! This adapter owns transport framing only: request serialisation, SSE
//! line decoding for streamed calls, and tolerant JSON decoding of the
//! parts forecast the model is asked to emit.

use serde::{Deserialize, Serialize};

use crate::domain::PartForecast;

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessageDto<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequestDto<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessageDto<'a>>,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseDto {
    pub choices: Vec<ChatChoiceDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceDto {
    pub message: ChatContentDto,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatContentDto {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunkDto {
    choices: Vec<StreamChoiceDto>,
}

#[derive(Debug, Deserialize)]
struct StreamChoiceDto {
    delta: StreamDeltaDto,
}

#[derive(Debug, Deserialize)]
struct StreamDeltaDto {
    content: Option<String>,
}

/// One decoded server-sent event from a streamed completion.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SseEvent {
    /// A non-empty content fragment.
    Content(String),
    /// The `[DONE]` terminator.
    Done,
}

/// Decode one SSE line. Comment lines, empty keep-alives, and deltas
/// without content all decode to `None`.
pub(crate) fn parse_sse_line(line: &str) -> Option<SseEvent> {
    let data = line.strip_prefix("data:")?.trim();
    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }
    let chunk: StreamChunkDto = serde_json::from_str(data).ok()?;
    let content = chunk.choices.into_iter().next()?.delta.content?;
    if content.is_empty() {
        None
    } else {
        Some(SseEvent::Content(content))
    }
}

#[derive(Debug, Deserialize)]
struct PartForecastDto {
    name: String,
    confidence: f64,
    price: Option<String>,
}

impl From<PartForecastDto> for PartForecast {
    fn from(dto: PartForecastDto) -> Self {
        Self {
            name: dto.name,
            confidence: dto.confidence.clamp(0.0, 1.0),
            price: dto.price,
        }
    }
}

/// Strip Markdown code fences the model often wraps around JSON output.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Decode the parts forecast the model was asked to emit. Anything that is
/// not a valid JSON array of forecasts yields an empty list: callers must
/// tolerate zero predictions.
pub(crate) fn parse_part_forecasts(content: &str) -> Vec<PartForecast> {
    match serde_json::from_str::<Vec<PartForecastDto>>(strip_code_fences(content)) {
        Ok(forecasts) => forecasts.into_iter().map(PartForecast::from).collect(),
        Err(err) => {
            tracing::debug!(error = %err, "parts forecast did not decode; returning none");
            Vec::new()
        }
    }
}
