//! Change feed over the hosted database's realtime socket (Phoenix channels).

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::models::change_event::ChangeEvent;
use crate::repositories::errors::repository_errors::RepositoryError;

#[cfg(test)]
use mockall::automock;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const JOIN_REF: &str = "1";
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

/// What one inbound frame means for the session.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Change(ChangeEvent),
    Rejected(String),
    Ignored,
}

pub fn game_topic(game_id: &str) -> String {
    format!("realtime:game:{}", game_id)
}

/// Joins the game topic with one filter for new moves and one for game row updates.
pub fn join_message(game_id: &str, access_token: &str) -> PhoenixMessage {
    PhoenixMessage {
        topic: game_topic(game_id),
        event: "phx_join".to_string(),
        payload: json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    {
                        "event": "INSERT",
                        "schema": "public",
                        "table": "moves",
                        "filter": format!("game_id=eq.{}", game_id),
                    },
                    {
                        "event": "UPDATE",
                        "schema": "public",
                        "table": "games",
                        "filter": format!("id=eq.{}", game_id),
                    },
                ],
            },
            "access_token": access_token,
        }),
        reference: Some(JOIN_REF.to_string()),
    }
}

pub fn heartbeat_message(reference: u64) -> PhoenixMessage {
    PhoenixMessage {
        topic: "phoenix".to_string(),
        event: "heartbeat".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

pub fn parse_message(text: &str) -> Result<FeedMessage, RepositoryError> {
    let message: PhoenixMessage = serde_json::from_str(text)?;
    let payload = &message.payload;

    match message.event.as_str() {
        "postgres_changes" => {
            let data = &payload["data"];
            let record = data["record"].clone();
            match (data["table"].as_str(), data["type"].as_str()) {
                (Some("moves"), Some("INSERT")) => Ok(FeedMessage::Change(
                    ChangeEvent::MoveInserted(serde_json::from_value(record)?),
                )),
                (Some("games"), Some("UPDATE")) => Ok(FeedMessage::Change(
                    ChangeEvent::GameUpdated(serde_json::from_value(record)?),
                )),
                _ => Ok(FeedMessage::Ignored),
            }
        }
        "phx_reply" if payload["status"] == "error" => {
            Ok(FeedMessage::Rejected(payload["response"].to_string()))
        }
        "system" if payload["status"] == "error" => Ok(FeedMessage::Rejected(
            payload["message"].as_str().unwrap_or("unknown error").to_string(),
        )),
        "phx_error" => Ok(FeedMessage::Rejected(format!(
            "Channel {} crashed",
            message.topic
        ))),
        _ => Ok(FeedMessage::Ignored),
    }
}

/// Live change events for one game. Dropping it closes the socket.
pub struct ChangeSubscription {
    receiver: mpsc::Receiver<ChangeEvent>,
    task: Option<JoinHandle<()>>,
}

impl ChangeSubscription {
    pub fn new(receiver: mpsc::Receiver<ChangeEvent>, task: Option<JoinHandle<()>>) -> Self {
        ChangeSubscription { receiver, task }
    }

    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.receiver.recv().await
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(&self, game_id: &str) -> Result<ChangeSubscription, RepositoryError>;
}

pub struct SupabaseRealtime {
    url: String,
    access_token: String,
}

impl SupabaseRealtime {
    pub fn new(config: &Config) -> Self {
        SupabaseRealtime {
            url: config.realtime_url(),
            access_token: config.bearer_token().to_string(),
        }
    }
}

#[async_trait]
impl ChangeFeed for SupabaseRealtime {
    async fn subscribe(&self, game_id: &str) -> Result<ChangeSubscription, RepositoryError> {
        let (stream, _) = connect_async(self.url.as_str()).await?;
        let (mut write, mut read) = stream.split();

        let join = serde_json::to_string(&join_message(game_id, &self.access_token))?;
        write.send(Message::Text(join)).await?;
        info!("Subscribed to changes of game {}", game_id);

        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let topic = game_topic(game_id);
        let task = tokio::spawn(async move {
            let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
            heartbeat.tick().await;
            let mut next_ref: u64 = 2;

            loop {
                tokio::select! {
                    _ = heartbeat.tick() => {
                        let frame = match serde_json::to_string(&heartbeat_message(next_ref)) {
                            Ok(frame) => frame,
                            Err(e) => {
                                error!("Failed to encode heartbeat: {}", e);
                                break;
                            }
                        };
                        next_ref += 1;
                        if let Err(e) = write.send(Message::Text(frame)).await {
                            warn!("Heartbeat on {} failed: {}", topic, e);
                            break;
                        }
                    }
                    frame = read.next() => match frame {
                        Some(Ok(Message::Text(text))) => match parse_message(&text) {
                            Ok(FeedMessage::Change(event)) => {
                                if sender.send(event).await.is_err() {
                                    break;
                                }
                            }
                            Ok(FeedMessage::Rejected(reason)) => {
                                error!("Realtime channel {} rejected: {}", topic, reason);
                                break;
                            }
                            Ok(FeedMessage::Ignored) => {}
                            Err(e) => warn!("Skipping unreadable realtime frame: {}", e),
                        },
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Realtime socket for {} closed", topic);
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            error!("Realtime socket for {} failed: {}", topic, e);
                            break;
                        }
                    },
                    _ = sender.closed() => {
                        debug!("Change subscriber for {} went away", topic);
                        break;
                    }
                }
            }
        });

        Ok(ChangeSubscription::new(receiver, Some(task)))
    }
}
