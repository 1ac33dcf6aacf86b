//! Event fan-out behind a trait so state logic never touches a transport
//! directly. The production implementation is a tokio broadcast channel that
//! the websocket layer subscribes to; tests swap in a recorder.

use tokio::sync::broadcast;

use crate::protocol::RoomEvent;
use crate::types::RoomCode;

/// Sink for room events. Publishing is fire-and-forget; a room with no
/// connected clients drops events silently.
pub trait Broadcaster: Send + Sync {
    fn publish(&self, room_code: &str, event: RoomEvent);
}

/// Broadcast-channel-backed fan-out shared by all rooms; subscribers filter
/// by room code.
pub struct ChannelBroadcaster {
    tx: broadcast::Sender<(RoomCode, RoomEvent)>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<(RoomCode, RoomEvent)> {
        self.tx.subscribe()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn publish(&self, room_code: &str, event: RoomEvent) {
        // Ignore send errors (no receivers connected is fine)
        let _ = self.tx.send((room_code.to_string(), event));
    }
}

/// Test double that records everything published
#[derive(Default)]
pub struct RecordingBroadcaster {
    pub events: std::sync::Mutex<Vec<(RoomCode, RoomEvent)>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<(RoomCode, RoomEvent)> {
        std::mem::take(&mut self.events.lock().unwrap())
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn publish(&self, room_code: &str, event: RoomEvent) {
        self.events
            .lock()
            .unwrap()
            .push((room_code.to_string(), event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let broadcaster = ChannelBroadcaster::default();
        let mut rx = broadcaster.subscribe();

        broadcaster.publish(
            "ROOM1234",
            RoomEvent::GameCompleted {
                message: "over".to_string(),
            },
        );

        let (code, event) = rx.recv().await.unwrap();
        assert_eq!(code, "ROOM1234");
        assert!(matches!(event, RoomEvent::GameCompleted { .. }));
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let broadcaster = ChannelBroadcaster::default();
        broadcaster.publish(
            "ROOM1234",
            RoomEvent::PlayerKicked {
                player_id: "p1".to_string(),
            },
        );
    }
}
