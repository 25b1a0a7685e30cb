use comms::event::{self, Event, RoomStateBroadcastEvent};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::room_manager::{DeliveryError, Room, RoomEvent, RoomObserver, RoomStatus};

/// Most messages a single room operation renders for one session: a `VOTE` announcement and a snapshot.
/// An outbound queue smaller than this drops even a caught-up session.
pub const MAX_MESSAGES_PER_OPERATION: usize = 2;

/// Render the snapshot of a room, one entry per current player in join order
pub fn render_room_state(room: &Room) -> RoomStateBroadcastEvent {
    let votes = room.votes();

    match room.status() {
        RoomStatus::Progress => RoomStateBroadcastEvent::Progress(
            votes
                .into_iter()
                .map(|(player, vote)| event::VoteProgress {
                    player_id: player.id(),
                    has_voted: vote.is_some(),
                })
                .collect(),
        ),
        // every current player has voted while the room shows its result
        RoomStatus::Result => RoomStateBroadcastEvent::Result(
            votes
                .into_iter()
                .filter_map(|(player, vote)| {
                    vote.map(|value| event::VoteResult {
                        player_id: player.id(),
                        value,
                    })
                })
                .collect(),
        ),
    }
}

/// Render the messages a single room operation produces for one session:
/// a `VOTE` announcement per placed vote, followed by one snapshot of the settled room
pub fn render_room_events(room: &Room, events: &[RoomEvent]) -> Vec<Event> {
    events
        .iter()
        .filter_map(|room_event| match room_event {
            RoomEvent::VotePlaced { player, .. } => Some(Event::Vote(event::VoteBroadcastEvent {
                player_id: player.id(),
            })),
            RoomEvent::PlayerJoined(_)
            | RoomEvent::PlayerLeft(_)
            | RoomEvent::StatusChanged(_) => None,
        })
        .chain(std::iter::once(Event::RoomState(render_room_state(room))))
        .collect()
}

#[derive(Debug)]
/// [SessionRelay] is the observer a session registers on its room.
///
/// It renders room events into outbound events and pushes them to the session's own ordered queue,
/// the session task drains the queue and writes to the connection.
pub struct SessionRelay {
    session_id: String,
    outbound_tx: mpsc::Sender<Event>,
}

impl SessionRelay {
    pub fn new(session_id: &str, outbound_tx: mpsc::Sender<Event>) -> Self {
        SessionRelay {
            session_id: String::from(session_id),
            outbound_tx,
        }
    }
}

impl RoomObserver for SessionRelay {
    fn notify(&self, room: &Room, events: &[RoomEvent]) -> Result<(), DeliveryError> {
        let outbound = render_room_events(room, events);

        if self.outbound_tx.is_closed() {
            return Err(DeliveryError::Disconnected);
        }
        // the room is the only producer, so either every event fits or none is queued
        if self.outbound_tx.capacity() < outbound.len() {
            log::warn!(
                "session {} cannot keep up with room '{}'",
                self.session_id,
                room.id()
            );
            return Err(DeliveryError::QueueFull);
        }

        for event in outbound {
            self.outbound_tx.try_send(event).map_err(|err| match err {
                TrySendError::Full(_) => DeliveryError::QueueFull,
                TrySendError::Closed(_) => DeliveryError::Disconnected,
            })?;
        }

        Ok(())
    }
}
