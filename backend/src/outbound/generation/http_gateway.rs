//! Reqwest-backed generation gateway adapter.
//!
//! Wraps an OpenAI-compatible chat-completions endpoint behind the
//! [`DiagnosticGenerator`] port. Failures never escape as errors: the
//! streaming operation folds them into a single error-shaped chunk, parts
//! prediction folds them into an empty forecast list, and summarisation
//! folds them into an error-description string. No operation retries.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::ports::{DiagnosisStream, DiagnosticGenerator};
use crate::domain::PartForecast;

use super::dto::{
    parse_part_forecasts, parse_sse_line, ChatMessageDto, ChatRequestDto, ChatResponseDto, SseEvent,
};
use super::prompts;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoint, credential, and model selection for the gateway.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Base URL of the chat-completions API, with or without trailing slash.
    pub base_url: String,
    /// Bearer credential for the API.
    pub api_key: String,
    /// Model identifier sent with every call.
    pub model: String,
}

/// Errors internal to the adapter; always folded into content before they
/// reach a caller.
#[derive(Debug, thiserror::Error)]
enum GenerationError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("invalid response format: {0}")]
    Decode(String),
}

impl GenerationError {
    fn transport(err: &reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Gateway performing HTTP calls against one chat-completions endpoint.
#[derive(Clone)]
pub struct GenerationHttpGateway {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GenerationHttpGateway {
    /// Build a gateway with a connect timeout only. Streamed generations are
    /// latency-unbounded by contract, so no overall request timeout is set.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: GenerationConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        let endpoint = if config.base_url.ends_with('/') {
            format!("{}chat/completions", config.base_url)
        } else {
            format!("{}/chat/completions", config.base_url)
        };
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
            model: config.model,
        })
    }

    /// One non-streaming completion, returning the first choice's content.
    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let body = ChatRequestDto {
            model: &self.model,
            messages: vec![
                ChatMessageDto {
                    role: "system",
                    content: system,
                },
                ChatMessageDto {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| GenerationError::transport(&err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let decoded: ChatResponseDto = response
            .json()
            .await
            .map_err(|err| GenerationError::Decode(err.to_string()))?;

        decoded
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::Decode("missing message content".to_owned()))
    }
}

/// Drive one streamed completion, forwarding content fragments into `tx`.
/// Returns the number of fragments forwarded. A closed receiver means the
/// consumer disconnected; the call is abandoned without error.
async fn stream_diagnosis(
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    prompt: String,
    tx: &mpsc::Sender<String>,
) -> Result<usize, GenerationError> {
    let body = ChatRequestDto {
        model: &model,
        messages: vec![
            ChatMessageDto {
                role: "system",
                content: prompts::DIAGNOSTIC_SYSTEM,
            },
            ChatMessageDto {
                role: "user",
                content: &prompt,
            },
        ],
        stream: true,
    };

    let response = client
        .post(&endpoint)
        .bearer_auth(&api_key)
        .json(&body)
        .send()
        .await
        .map_err(|err| GenerationError::transport(&err))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GenerationError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let mut bytes = response.bytes_stream();
    let mut buffer = String::new();
    let mut sent = 0usize;

    while let Some(next) = bytes.next().await {
        let chunk = next.map_err(|err| GenerationError::transport(&err))?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(newline) = buffer.find('\n') {
            let line = buffer[..newline].trim_end_matches('\r').to_owned();
            buffer.drain(..=newline);

            match parse_sse_line(&line) {
                Some(SseEvent::Done) => return Ok(sent),
                Some(SseEvent::Content(content)) => {
                    if tx.send(content).await.is_err() {
                        debug!("diagnosis consumer disconnected; abandoning stream");
                        return Ok(sent);
                    }
                    sent += 1;
                }
                None => {}
            }
        }
    }

    Ok(sent)
}

#[async_trait]
impl DiagnosticGenerator for GenerationHttpGateway {
    async fn diagnose(&self, symptoms: &str) -> DiagnosisStream {
        let (tx, rx) = mpsc::channel::<String>(16);
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();
        let model = self.model.clone();
        let prompt = prompts::diagnostic_prompt(symptoms);

        tokio::spawn(async move {
            match stream_diagnosis(client, endpoint, api_key, model, prompt, &tx).await {
                Ok(0) => {
                    let _ = tx
                        .send("The model returned no content for this diagnosis.".to_owned())
                        .await;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "streamed diagnosis failed upstream");
                    let _ = tx.send(format!("Diagnostic generation failed: {err}")).await;
                }
            }
        });

        stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        })
        .boxed()
    }

    async fn predict_parts(&self, diagnosis: &str) -> Vec<PartForecast> {
        match self
            .complete(prompts::PARTS_SYSTEM, &prompts::parts_prompt(diagnosis))
            .await
        {
            Ok(content) => parse_part_forecasts(&content),
            Err(err) => {
                warn!(error = %err, "parts prediction failed upstream");
                Vec::new()
            }
        }
    }

    async fn summarize<'a>(
        &self,
        diagnosis: &str,
        part_names: &[String],
        notes: Option<&'a str>,
    ) -> String {
        match self
            .complete(
                prompts::SUMMARY_SYSTEM,
                &prompts::summary_prompt(diagnosis, part_names, notes),
            )
            .await
        {
            Ok(content) => content,
            Err(err) => {
                warn!(error = %err, "repair summary failed upstream");
                format!("Repair summary generation failed: {err}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://api.openai.com/v1", "https://api.openai.com/v1/chat/completions")]
    #[case("https://api.openai.com/v1/", "https://api.openai.com/v1/chat/completions")]
    fn endpoint_joins_base_url(#[case] base: &str, #[case] expected: &str) {
        let gateway = GenerationHttpGateway::new(GenerationConfig {
            base_url: base.to_owned(),
            api_key: "key".to_owned(),
            model: "gpt-4o-mini".to_owned(),
        })
        .expect("client should build");
        assert_eq!(gateway.endpoint, expected);
    }
}
