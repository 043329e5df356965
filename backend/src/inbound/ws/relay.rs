//! Per-connection diagnostic streaming relay.
//!
//! One relay drives one logical diagnostic conversation. After the
//! handshake it sits in a ready loop (heartbeats + inbound units); a
//! recognised `{"input"}` unit moves it into a generating loop that
//! multiplexes the gateway's chunk stream with further inbound traffic.
//! Chunks are forwarded in production order and accumulated; on natural
//! completion exactly one diagnostic result is persisted and one
//! completion unit emitted. A disconnect at any point discards whatever
//! was mid-flight without persisting a partial result.
//!
//! The public WebSocket contract pings every 5s and considers a connection
//! idle after 10s without client traffic while ready. No idle limit
//! applies while generating: the upstream call is latency-unbounded by
//! contract and the client may legitimately stay silent throughout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use futures_util::StreamExt;
use serde::Serialize;
use tokio::time;
use tracing::{debug, error, warn};

use crate::domain::ports::{
    DiagnosticGenerator as _, DiagnosticRepository as _, SessionRepository as _,
};
use crate::domain::SessionId;

use super::messages::{
    parse_client_unit, ChunkUnit, ClientUnit, CompleteUnit, ErrorUnit, SessionOpenedUnit,
};
use super::state::WsState;

/// Time between heartbeats to the client (shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time while ready before disconnecting the client.
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(2);

const MALFORMED_UNIT_ERROR: &str = "Invalid JSON format";
const MISSING_INPUT_ERROR: &str = "Invalid message format";
const GENERATION_IN_PROGRESS_ERROR: &str = "A diagnostic generation is already in progress";
const GENERATION_START_ERROR: &str = "Failed to start diagnostic generation";

/// Why a connection left its processing loop.
enum Disconnect {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    Network(Closed),
}

pub(super) struct Relay {
    state: Arc<WsState>,
    session_id: SessionId,
}

impl Relay {
    pub(super) fn new(state: Arc<WsState>, session_id: SessionId) -> Self {
        Self { state, session_id }
    }

    /// Drive the connection until it disconnects.
    pub(super) async fn run(self, mut ws: Session, mut stream: MessageStream) {
        let handshake = SessionOpenedUnit {
            session_id: self.session_id.as_i32(),
        };
        if self.send_json(&mut ws, &handshake).await.is_err() {
            return;
        }

        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        let disconnect = loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    if Instant::now().duration_since(last_heartbeat) > CLIENT_TIMEOUT {
                        Err(Disconnect::HeartbeatTimeout)
                    } else {
                        ws.ping(b"").await.map_err(Disconnect::Network)
                    }
                }
                message = stream.recv() => {
                    self.handle_ready_message(&mut ws, &mut stream, &mut last_heartbeat, message)
                        .await
                }
            };

            if let Err(disconnect) = result {
                break disconnect;
            }
        };

        self.log_shutdown(&disconnect);
        self.close_if_needed(ws, disconnect).await;
    }

    async fn handle_ready_message(
        &self,
        ws: &mut Session,
        stream: &mut MessageStream,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), Disconnect> {
        let Some(message) = message else {
            return Err(Disconnect::StreamClosed);
        };
        let message = message.map_err(Disconnect::Protocol)?;

        match message {
            Message::Ping(payload) => {
                *last_heartbeat = Instant::now();
                ws.pong(&payload).await.map_err(Disconnect::Network)
            }
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Message::Close(reason) => Err(Disconnect::ClientClosed(reason)),
            Message::Text(text) => {
                let result = self.handle_text_unit(ws, stream, text.as_ref()).await;
                // Reset after, not before: a generation is latency-unbounded
                // and must not count towards the ready-state idle limit.
                *last_heartbeat = Instant::now();
                result
            }
        }
    }

    async fn handle_text_unit(
        &self,
        ws: &mut Session,
        stream: &mut MessageStream,
        text: &str,
    ) -> Result<(), Disconnect> {
        match parse_client_unit(text) {
            ClientUnit::Malformed => self
                .send_json(ws, &ErrorUnit {
                    error: MALFORMED_UNIT_ERROR,
                })
                .await
                .map_err(Disconnect::Network),
            ClientUnit::MissingInput => self
                .send_json(ws, &ErrorUnit {
                    error: MISSING_INPUT_ERROR,
                })
                .await
                .map_err(Disconnect::Network),
            ClientUnit::Input(input) => self.generate(ws, stream, &input).await,
        }
    }

    /// Drive one generation to completion, forwarding and accumulating
    /// every chunk the gateway produces.
    async fn generate(
        &self,
        ws: &mut Session,
        stream: &mut MessageStream,
        input: &str,
    ) -> Result<(), Disconnect> {
        if let Err(err) = self.state.sessions.update_input(self.session_id, input).await {
            error!(
                error = %err,
                session_id = %self.session_id,
                "failed to update session input"
            );
            return self
                .send_json(ws, &ErrorUnit {
                    error: GENERATION_START_ERROR,
                })
                .await
                .map_err(Disconnect::Network);
        }

        let mut chunks = self.state.generator.diagnose(input).await;
        let mut accumulated = String::new();

        loop {
            tokio::select! {
                chunk = chunks.next() => match chunk {
                    Some(chunk) => {
                        if chunk.is_empty() {
                            continue;
                        }
                        accumulated.push_str(&chunk);
                        // A failed forward loses that chunk only; the
                        // accumulator keeps the text so the final result
                        // still persists in full.
                        if let Err(err) = self.send_json(ws, &ChunkUnit { chunk: &chunk }).await {
                            debug!(error = %err, "chunk forward failed; generation continues");
                        }
                    }
                    None => break,
                },
                message = stream.recv() => match message {
                    Some(Ok(Message::Text(_))) => {
                        // At most one generation per connection; new input is
                        // rejected rather than queued.
                        if let Err(err) = self
                            .send_json(ws, &ErrorUnit {
                                error: GENERATION_IN_PROGRESS_ERROR,
                            })
                            .await
                        {
                            debug!(error = %err, "reject notice failed; generation continues");
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if let Err(err) = ws.pong(&payload).await {
                            debug!(error = %err, "pong failed; generation continues");
                        }
                    }
                    Some(Ok(Message::Close(reason))) => {
                        return Err(Disconnect::ClientClosed(reason));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(Disconnect::Protocol(err)),
                    None => return Err(Disconnect::StreamClosed),
                }
            }
        }

        if let Err(err) = self
            .state
            .diagnostics
            .record_result(self.session_id, input, &accumulated)
            .await
        {
            // Best effort: the client still gets its answer; the loss is
            // surfaced to the operator only.
            error!(
                error = %err,
                session_id = %self.session_id,
                "failed to persist diagnostic result"
            );
        }

        self.send_json(ws, &CompleteUnit {
            complete: true,
            result: &accumulated,
        })
        .await
        .map_err(Disconnect::Network)
    }

    async fn send_json<T: Serialize>(&self, ws: &mut Session, payload: &T) -> Result<(), Closed> {
        match serde_json::to_string(payload) {
            Ok(body) => ws.text(body).await,
            Err(err) => {
                warn!(error = %err, "failed to serialise relay payload");
                Ok(())
            }
        }
    }

    fn log_shutdown(&self, disconnect: &Disconnect) {
        match disconnect {
            Disconnect::HeartbeatTimeout => {
                warn!(session_id = %self.session_id, "relay heartbeat timeout; closing connection");
            }
            Disconnect::Protocol(err) => {
                warn!(error = %err, session_id = %self.session_id, "relay protocol error");
            }
            Disconnect::Network(err) => {
                debug!(error = %err, session_id = %self.session_id, "relay send failed; connection gone");
            }
            Disconnect::ClientClosed(_) | Disconnect::StreamClosed => {
                debug!(session_id = %self.session_id, "client disconnected");
            }
        }
    }

    async fn close_if_needed(&self, ws: Session, disconnect: Disconnect) {
        let reason = match disconnect {
            Disconnect::HeartbeatTimeout => Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("heartbeat timeout".to_owned()),
            }),
            Disconnect::Protocol(_) => Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            }),
            Disconnect::ClientClosed(reason) => reason,
            Disconnect::StreamClosed | Disconnect::Network(_) => return,
        };

        if let Err(err) = ws.close(reason).await {
            debug!(error = %err, "failed to close relay session");
        }
    }
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
