use thiserror::Error;

use super::{Player, Room, RoomStatus};

/// Identifies a registered [RoomObserver] within its room
pub type SubscriberId = u64;

/// State changes a [Room] reports to its observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomEvent {
    PlayerJoined(Player),
    PlayerLeft(Player),
    VotePlaced { player: Player, value: i64 },
    StatusChanged(RoomStatus),
}

/// An observer could not take the messages rendered for it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("outbound queue is full")]
    QueueFull,
    #[error("receiving session is gone")]
    Disconnected,
}

/// [RoomObserver] is notified synchronously, while the room is still held exclusively,
/// with every event a single room operation produced, in emission order.
///
/// Returning an error unsubscribes the observer. The operation itself is never rolled back.
pub trait RoomObserver: Send {
    fn notify(&self, room: &Room, events: &[RoomEvent]) -> Result<(), DeliveryError>;
}
