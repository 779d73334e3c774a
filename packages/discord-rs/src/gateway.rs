//! Gateway websocket client.
//!
//! Maintains the realtime connection: hello/identify handshake, heartbeats at
//! the server-provided interval with sequence tracking, and dispatch of the
//! events the bot consumes (`READY`, `MESSAGE_CREATE`) over an mpsc channel.
//! Any close or protocol error tears the session down and the connection is
//! re-established with capped exponential backoff.

use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use crate::error::{DiscordError, Result};
use crate::types::{Message, User};

pub const INTENT_GUILDS: u64 = 1 << 0;
pub const INTENT_GUILD_MEMBERS: u64 = 1 << 1;
pub const INTENT_GUILD_MODERATION: u64 = 1 << 2;
pub const INTENT_GUILD_EXPRESSIONS: u64 = 1 << 3;
pub const INTENT_GUILD_MESSAGES: u64 = 1 << 9;
pub const INTENT_MESSAGE_CONTENT: u64 = 1 << 15;

const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

const OP_DISPATCH: u8 = 0;
const OP_HEARTBEAT: u8 = 1;
const OP_IDENTIFY: u8 = 2;
const OP_RECONNECT: u8 = 7;
const OP_INVALID_SESSION: u8 = 9;
const OP_HELLO: u8 = 10;
const OP_HEARTBEAT_ACK: u8 = 11;

const MAX_BACKOFF_SECS: u64 = 60;

/// Events surfaced to the application.
#[derive(Debug)]
pub enum Event {
    Ready(Ready),
    MessageCreate(Box<Message>),
}

/// `READY` dispatch payload.
#[derive(Debug, Deserialize)]
pub struct Ready {
    pub user: User,
    #[serde(default)]
    pub guilds: Vec<UnavailableGuild>,
}

#[derive(Debug, Deserialize)]
pub struct UnavailableGuild {
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct GatewayPayload {
    op: u8,
    #[serde(default)]
    d: Value,
    s: Option<u64>,
    t: Option<String>,
}

enum SessionEnd {
    /// The server closed the connection or asked for a reconnect.
    Disconnected,
    /// The application dropped the event receiver; stop entirely.
    ReceiverClosed,
}

pub struct Gateway {
    token: String,
    intents: u64,
}

impl Gateway {
    pub fn new(token: String, intents: u64) -> Self {
        Self { token, intents }
    }

    /// Connect and deliver events forever, reconnecting on any session loss.
    /// Returns only when the event receiver has been dropped.
    pub async fn run(self, events: mpsc::Sender<Event>) {
        let mut backoff_secs = 1;
        loop {
            match self.run_session(&events).await {
                Ok(SessionEnd::ReceiverClosed) => {
                    tracing::info!("event receiver closed, shutting down gateway");
                    return;
                }
                Ok(SessionEnd::Disconnected) => {
                    backoff_secs = 1;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "gateway session failed");
                }
            }

            tracing::info!(seconds = backoff_secs, "reconnecting to gateway");
            tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
            backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
        }
    }

    async fn run_session(&self, events: &mpsc::Sender<Event>) -> Result<SessionEnd> {
        let (mut ws, _) = connect_async(GATEWAY_URL)
            .await
            .map_err(|e| DiscordError::Gateway(format!("connect failed: {e}")))?;
        tracing::debug!("gateway connection established");

        // Handshake: the server speaks first with HELLO.
        let hello = Self::next_payload(&mut ws).await?;
        if hello.op != OP_HELLO {
            return Err(DiscordError::Gateway(format!(
                "expected hello, got op {}",
                hello.op
            )));
        }
        let heartbeat_ms = hello.d["heartbeat_interval"]
            .as_u64()
            .ok_or_else(|| DiscordError::Gateway("hello missing heartbeat_interval".into()))?;

        let identify = json!({
            "op": OP_IDENTIFY,
            "d": {
                "token": self.token,
                "intents": self.intents,
                "properties": {
                    "os": std::env::consts::OS,
                    "browser": "discord-rs",
                    "device": "discord-rs",
                },
            },
        });
        Self::send_json(&mut ws, &identify).await?;

        let mut heartbeat = tokio::time::interval(Duration::from_millis(heartbeat_ms));
        heartbeat.tick().await; // consume the immediate first tick
        let mut last_seq: Option<u64> = None;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    Self::send_json(&mut ws, &json!({"op": OP_HEARTBEAT, "d": last_seq})).await?;
                }
                frame = ws.next() => {
                    let payload = match frame {
                        None => return Ok(SessionEnd::Disconnected),
                        Some(Err(e)) => {
                            return Err(DiscordError::Gateway(format!("read failed: {e}")));
                        }
                        Some(Ok(WsMessage::Close(frame))) => {
                            tracing::info!(?frame, "gateway closed the connection");
                            return Ok(SessionEnd::Disconnected);
                        }
                        Some(Ok(WsMessage::Text(text))) => {
                            match serde_json::from_str::<GatewayPayload>(&text) {
                                Ok(payload) => payload,
                                Err(err) => {
                                    tracing::warn!(error = %err, "unparseable gateway payload");
                                    continue;
                                }
                            }
                        }
                        // Pings are answered by the websocket layer.
                        Some(Ok(_)) => continue,
                    };

                    if let Some(seq) = payload.s {
                        last_seq = Some(seq);
                    }

                    match payload.op {
                        OP_DISPATCH => {
                            if self.dispatch(payload, events).await.is_err() {
                                return Ok(SessionEnd::ReceiverClosed);
                            }
                        }
                        OP_HEARTBEAT => {
                            Self::send_json(&mut ws, &json!({"op": OP_HEARTBEAT, "d": last_seq}))
                                .await?;
                        }
                        OP_RECONNECT => {
                            tracing::info!("gateway requested reconnect");
                            return Ok(SessionEnd::Disconnected);
                        }
                        OP_INVALID_SESSION => {
                            tracing::warn!("gateway invalidated the session, re-identifying");
                            return Ok(SessionEnd::Disconnected);
                        }
                        OP_HEARTBEAT_ACK => {
                            tracing::trace!("heartbeat acknowledged");
                        }
                        other => {
                            tracing::trace!(op = other, "ignoring gateway opcode");
                        }
                    }
                }
            }
        }
    }

    /// Forward a dispatch payload to the application. `Err` means the
    /// receiver is gone.
    async fn dispatch(
        &self,
        payload: GatewayPayload,
        events: &mpsc::Sender<Event>,
    ) -> std::result::Result<(), ()> {
        match payload.t.as_deref() {
            Some("READY") => match serde_json::from_value::<Ready>(payload.d) {
                Ok(ready) => events.send(Event::Ready(ready)).await.map_err(|_| ()),
                Err(err) => {
                    tracing::warn!(error = %err, "unparseable READY payload");
                    Ok(())
                }
            },
            Some("MESSAGE_CREATE") => match serde_json::from_value::<Message>(payload.d) {
                Ok(message) => events
                    .send(Event::MessageCreate(Box::new(message)))
                    .await
                    .map_err(|_| ()),
                Err(err) => {
                    tracing::warn!(error = %err, "unparseable MESSAGE_CREATE payload");
                    Ok(())
                }
            },
            other => {
                tracing::trace!(event = ?other, "ignoring dispatch event");
                Ok(())
            }
        }
    }

    async fn next_payload<S>(ws: &mut S) -> Result<GatewayPayload>
    where
        S: Stream<Item = std::result::Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        loop {
            match ws.next().await {
                None => return Err(DiscordError::Gateway("connection closed".into())),
                Some(Err(e)) => {
                    return Err(DiscordError::Gateway(format!("read failed: {e}")));
                }
                Some(Ok(WsMessage::Text(text))) => {
                    return serde_json::from_str(&text)
                        .map_err(|e| DiscordError::Gateway(format!("bad payload: {e}")));
                }
                Some(Ok(_)) => continue,
            }
        }
    }

    async fn send_json<S>(ws: &mut S, value: &Value) -> Result<()>
    where
        S: Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
    {
        ws.send(WsMessage::Text(value.to_string()))
            .await
            .map_err(|e| DiscordError::Gateway(format!("send failed: {e}")))
    }
}
