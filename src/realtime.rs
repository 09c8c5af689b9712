//! Push notifications from the backing service's realtime channel, exposed as
//! a cancellable event stream. The listener runs as a long-lived task beside
//! ordinary request/response calls; delivery is at-least-once and unordered
//! across distinct items, so consumers deduplicate by document id.

use futures::{SinkExt, StreamExt};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use urlencoding::encode;

use crate::config::Config;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Created,
    Deleted,
}

/// A raw document event observed on a channel.
#[derive(Debug, Clone)]
pub struct RealtimeEvent {
    pub kind: EventKind,
    pub payload: Value,
}

/// Handle to a live subscription. Dropping or closing it detaches the
/// listener; no events are delivered after `close` returns.
pub struct Subscription {
    events: mpsc::Receiver<RealtimeEvent>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Next event, or `None` once the stream is closed or the connection has
    /// gone away.
    pub async fn recv(&mut self) -> Option<RealtimeEvent> {
        self.events.recv().await
    }

    pub fn close(self) {
        self.task.abort();
    }
}

/// Document channel name for the stories collection.
pub fn story_channel(config: &Config) -> String {
    format!(
        "databases.{}.collections.{}.documents",
        config.database_id, config.stories_collection_id
    )
}

/// Open a websocket subscription to one channel. Creation and deletion events
/// for documents on the channel are forwarded to the returned handle.
pub async fn subscribe(config: &Config, channel: &str) -> Result<Subscription> {
    let endpoint = config
        .endpoint
        .trim_end_matches('/')
        .replacen("https://", "wss://", 1)
        .replacen("http://", "ws://", 1);
    let url = format!(
        "{endpoint}/realtime?project={}&channels[]={}",
        encode(&config.project_id),
        encode(channel)
    );

    let (stream, _) = connect_async(url.as_str())
        .await
        .map_err(|e| Error::Realtime(format!("connect to {channel} failed: {e}")))?;
    let (mut write, mut read) = stream.split();

    let (events_tx, events_rx) = mpsc::channel(64);
    let task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if let Some(event) = parse_event(&text) {
                        if events_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                }
                Ok(Message::Ping(data)) => {
                    if write.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    warn!("realtime connection lost: {err}");
                    break;
                }
            }
        }
    });

    Ok(Subscription {
        events: events_rx,
        task,
    })
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// Decode one wire message into a document event. Heartbeats, connection
/// acknowledgements and unrelated event types yield `None`.
fn parse_event(raw: &str) -> Option<RealtimeEvent> {
    let envelope: Envelope = match serde_json::from_str(raw) {
        Ok(envelope) => envelope,
        Err(err) => {
            debug!("unparseable realtime message: {err}");
            return None;
        }
    };
    if envelope.kind != "event" {
        return None;
    }
    let names = envelope.data.get("events")?.as_array()?;
    let has = |suffix: &str| {
        names
            .iter()
            .any(|name| name.as_str().is_some_and(|n| n.ends_with(suffix)))
    };
    let kind = if has(".create") {
        EventKind::Created
    } else if has(".delete") {
        EventKind::Deleted
    } else {
        return None;
    };
    let payload = envelope.data.get("payload")?.clone();
    Some(RealtimeEvent { kind, payload })
}
