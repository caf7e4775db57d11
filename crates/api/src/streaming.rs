//! WebSocket streaming: the broadcast hub and the connection handler.
//!
//! Each event is a room; members are live WebSocket connections. Every
//! committed mutation produces exactly one frame, so per-event frame order
//! is commit order. Delivery is best-effort and at-most-once: a member that
//! cannot keep up (full queue) or has gone away is pruned and never blocks
//! its siblings.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use liveq_common::{AppResult, config::BroadcastConfig};
use liveq_core::EventBroadcaster;
use liveq_db::entities::event;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::middleware::AppState;

/// Close code sent when the requested event slug does not exist.
const CLOSE_UNKNOWN_EVENT: u16 = 4004;

/// How often idle connections are checked.
const IDLE_CHECK_PERIOD: Duration = Duration::from_secs(10);

/// Fan-out hub for event rooms.
///
/// Cheap to clone; all clones share the same room map. The room map is
/// only ever locked for short, non-awaiting critical sections: membership
/// changes and sender snapshots.
#[derive(Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    rooms: Mutex<HashMap<i64, HashMap<u64, mpsc::Sender<String>>>>,
    next_conn_id: AtomicU64,
    queue_capacity: usize,
    idle_timeout: Duration,
}

impl BroadcastHub {
    /// Create a new hub.
    #[must_use]
    pub fn new(config: &BroadcastConfig) -> Self {
        Self {
            inner: Arc::new(HubInner {
                rooms: Mutex::new(HashMap::new()),
                next_conn_id: AtomicU64::new(1),
                queue_capacity: config.queue_capacity,
                idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            }),
        }
    }

    /// Join an event room. The room is created on demand.
    ///
    /// Returns the member's connection id and the receiving end of its
    /// bounded delivery queue.
    pub fn join(&self, event_id: i64) -> (u64, mpsc::Receiver<String>) {
        let conn_id = self.inner.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.queue_capacity);

        let mut rooms = self.lock_rooms();
        rooms.entry(event_id).or_default().insert(conn_id, tx);
        drop(rooms);

        debug!(event_id, conn_id, "Connection joined room");
        (conn_id, rx)
    }

    /// Leave an event room. Empty rooms are reclaimed.
    pub fn leave(&self, event_id: i64, conn_id: u64) {
        let mut rooms = self.lock_rooms();
        if let Some(members) = rooms.get_mut(&event_id) {
            members.remove(&conn_id);
            if members.is_empty() {
                rooms.remove(&event_id);
            }
        }
        drop(rooms);

        debug!(event_id, conn_id, "Connection left room");
    }

    /// Current member count of a room.
    #[must_use]
    pub fn member_count(&self, event_id: i64) -> usize {
        self.lock_rooms().get(&event_id).map_or(0, HashMap::len)
    }

    /// Idle timeout for connections in this hub.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        self.inner.idle_timeout
    }

    /// Broadcast one frame to every current member of a room.
    ///
    /// The frame is serialized once. Senders are snapshotted under the
    /// lock, delivery happens outside it. A member whose queue is full or
    /// closed counts as failed and is pruned.
    pub fn broadcast(&self, event_id: i64, frame_type: &str, data: Value) {
        let frame = compose_frame(frame_type, data);

        let snapshot: Vec<(u64, mpsc::Sender<String>)> = {
            let rooms = self.lock_rooms();
            match rooms.get(&event_id) {
                Some(members) => members
                    .iter()
                    .map(|(id, tx)| (*id, tx.clone()))
                    .collect(),
                None => return,
            }
        };

        let mut failed = Vec::new();
        for (conn_id, tx) in snapshot {
            if tx.try_send(frame.clone()).is_err() {
                failed.push(conn_id);
            }
        }

        if !failed.is_empty() {
            let mut rooms = self.lock_rooms();
            if let Some(members) = rooms.get_mut(&event_id) {
                for conn_id in &failed {
                    members.remove(conn_id);
                }
                if members.is_empty() {
                    rooms.remove(&event_id);
                }
            }
            drop(rooms);
            warn!(event_id, pruned = failed.len(), "Pruned unreachable members");
        }
    }

    fn lock_rooms(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<i64, HashMap<u64, mpsc::Sender<String>>>> {
        self.inner.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl EventBroadcaster for BroadcastHub {
    async fn poll_created(&self, event_id: i64, payload: Value) -> AppResult<()> {
        self.broadcast(event_id, "poll_created", payload);
        Ok(())
    }

    async fn poll_status_updated(&self, event_id: i64, payload: Value) -> AppResult<()> {
        self.broadcast(event_id, "poll_status_updated", payload);
        Ok(())
    }

    async fn vote_updated(&self, event_id: i64, payload: Value) -> AppResult<()> {
        self.broadcast(event_id, "vote_updated", payload);
        Ok(())
    }

    async fn question_submitted(&self, event_id: i64, payload: Value) -> AppResult<()> {
        self.broadcast(event_id, "question_submitted", payload);
        Ok(())
    }

    async fn question_upvoted(&self, event_id: i64, payload: Value) -> AppResult<()> {
        self.broadcast(event_id, "question_upvoted", payload);
        Ok(())
    }
}

/// Compose an outbound frame: the payload's fields sit at the top level
/// next to `type` and `timestamp`, the shape clients consume directly.
fn compose_frame(frame_type: &str, data: Value) -> String {
    let mut frame = serde_json::Map::new();
    frame.insert("type".to_string(), json!(frame_type));
    if let Value::Object(fields) = data {
        frame.extend(fields);
    }
    frame.insert("timestamp".to_string(), json!(Utc::now().timestamp_millis()));
    Value::Object(frame).to_string()
}

fn error_frame(message: &str) -> String {
    compose_frame("error", json!({ "message": message }))
}

/// WebSocket handler for `/ws/events/{slug}`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, slug, state))
}

/// Handle one WebSocket connection for its lifetime.
async fn handle_socket(socket: WebSocket, slug: String, state: AppState) {
    let event = match state.event_service.get_by_slug(&slug).await {
        Ok(event) => event,
        Err(e) => {
            debug!(slug = %slug, error = %e, "Rejecting stream for unknown event");
            close_unknown_event(socket).await;
            return;
        }
    };

    let (conn_id, mut queue) = state.hub.join(event.id);
    let (mut sender, mut receiver) = socket.split();

    let connected = compose_frame(
        "connected",
        json!({ "event_id": event.id, "slug": event.slug }),
    );
    if sender.send(Message::Text(connected.into())).await.is_err() {
        state.hub.leave(event.id, conn_id);
        return;
    }

    info!(event_id = event.id, conn_id, "Stream connected");

    let idle_timeout = state.hub.idle_timeout();
    let mut last_activity = Instant::now();
    let mut idle_check = tokio::time::interval(IDLE_CHECK_PERIOD);
    idle_check.tick().await;

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        last_activity = Instant::now();
                        if let Some(reply) = handle_client_frame(text.as_str(), &event)
                            && sender.send(Message::Text(reply.into())).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        last_activity = Instant::now();
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(conn_id, error = %e, "WebSocket transport error");
                        break;
                    }
                }
            }

            Some(frame) = queue.recv() => {
                if sender.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }

            _ = idle_check.tick() => {
                if last_activity.elapsed() >= idle_timeout {
                    info!(conn_id, "Closing idle stream");
                    break;
                }
            }
        }
    }

    state.hub.leave(event.id, conn_id);
    info!(event_id = event.id, conn_id, "Stream closed");
}

/// Handle one inbound client frame, returning the reply to send, if any.
///
/// Protocol errors are answered with an `error` frame; only transport
/// failures terminate the connection.
fn handle_client_frame(text: &str, event: &event::Model) -> Option<String> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return Some(error_frame("Invalid JSON format")),
    };

    match value.get("type").and_then(Value::as_str) {
        Some("join") => Some(compose_frame(
            "joined",
            json!({ "event_id": event.id, "slug": event.slug }),
        )),
        Some("ping") => {
            // Echo the client's timestamp verbatim so it can measure RTT.
            let timestamp = value
                .get("timestamp")
                .cloned()
                .unwrap_or_else(|| json!(Utc::now().timestamp_millis()));
            Some(json!({ "type": "pong", "timestamp": timestamp }).to_string())
        }
        Some(other) => Some(error_frame(&format!("Unknown message type: {other}"))),
        None => Some(error_frame("Missing message type")),
    }
}

async fn close_unknown_event(mut socket: WebSocket) {
    let frame = CloseFrame {
        code: CLOSE_UNKNOWN_EVENT,
        reason: "Event not found".into(),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        debug!(error = %e, "Failed to send close frame");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn hub() -> BroadcastHub {
        BroadcastHub::new(&BroadcastConfig {
            queue_capacity: 4,
            idle_timeout_secs: 300,
        })
    }

    fn test_event() -> event::Model {
        event::Model {
            id: 1,
            title: "Town Hall".to_string(),
            slug: "town-hall".to_string(),
            description: None,
            short_code: "ABCD1234".to_string(),
            host_code: "host_abc123def456".to_string(),
            is_active: true,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_members() {
        let hub = hub();
        let (_id_a, mut rx_a) = hub.join(1);
        let (_id_b, mut rx_b) = hub.join(1);

        hub.broadcast(1, "vote_updated", json!({ "poll_id": 7 }));

        for rx in [&mut rx_a, &mut rx_b] {
            let frame: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
            assert_eq!(frame["type"], "vote_updated");
            // Payload fields are flat, not nested under an envelope key.
            assert_eq!(frame["poll_id"], 7);
            assert!(frame.get("data").is_none());
            assert!(frame["timestamp"].is_i64());
        }
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let hub = hub();
        let (_id_a, mut rx_a) = hub.join(1);
        let (_id_b, mut rx_b) = hub.join(2);

        hub.broadcast(1, "question_submitted", json!({ "id": 9 }));

        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dead_member_is_pruned_without_affecting_siblings() {
        let hub = hub();
        let (_dead_id, dead_rx) = hub.join(1);
        let (_live_id, mut live_rx) = hub.join(1);
        drop(dead_rx);

        hub.broadcast(1, "vote_updated", json!({}));

        assert!(live_rx.recv().await.is_some());
        assert_eq!(hub.member_count(1), 1);
    }

    #[tokio::test]
    async fn test_slow_member_is_pruned_when_queue_fills() {
        let hub = BroadcastHub::new(&BroadcastConfig {
            queue_capacity: 1,
            idle_timeout_secs: 300,
        });
        let (_slow_id, _slow_rx) = hub.join(1);

        // First frame fills the queue, second one overflows it.
        hub.broadcast(1, "vote_updated", json!({ "n": 1 }));
        hub.broadcast(1, "vote_updated", json!({ "n": 2 }));

        assert_eq!(hub.member_count(1), 0);
    }

    #[tokio::test]
    async fn test_empty_room_is_reclaimed_on_leave() {
        let hub = hub();
        let (conn_id, _rx) = hub.join(1);
        assert_eq!(hub.member_count(1), 1);

        hub.leave(1, conn_id);
        assert_eq!(hub.member_count(1), 0);
        assert!(hub.lock_rooms().get(&1).is_none());
    }

    #[test]
    fn test_join_frame_acked() {
        let reply = handle_client_frame(r#"{"type":"join"}"#, &test_event()).unwrap();
        let frame: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(frame["type"], "joined");
        assert_eq!(frame["event_id"], 1);
        assert_eq!(frame["slug"], "town-hall");
    }

    #[test]
    fn test_ping_echoes_timestamp_verbatim() {
        let reply =
            handle_client_frame(r#"{"type":"ping","timestamp":123456}"#, &test_event()).unwrap();
        let frame: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(frame["type"], "pong");
        assert_eq!(frame["timestamp"], 123_456);
    }

    #[test]
    fn test_invalid_json_gets_error_frame() {
        let reply = handle_client_frame("not json", &test_event()).unwrap();
        let frame: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(frame["type"], "error");
        assert_eq!(frame["message"], "Invalid JSON format");
    }

    #[test]
    fn test_unknown_type_gets_error_frame() {
        let reply = handle_client_frame(r#"{"type":"dance"}"#, &test_event()).unwrap();
        let frame: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(frame["type"], "error");
        assert_eq!(frame["message"], "Unknown message type: dance");
    }
}
