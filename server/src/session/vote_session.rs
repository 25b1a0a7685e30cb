use std::sync::Arc;

use comms::{
    command::UserCommand,
    event::{self, Event},
};
use tokio::sync::mpsc;

use crate::room_manager::{Player, RoomRegistry, SharedRoom, SubscriberId};

use super::relay::{render_room_state, SessionRelay};

/// [VoteSession] binds one connection to one room, and to at most one player of that room.
///
/// Room broadcasts reach the session through its [SessionRelay] and are queued in order,
/// replies to the session's own commands are handed back to the caller directly.
pub(super) struct VoteSession {
    session_id: String,
    room_id: String,
    registry: Arc<RoomRegistry>,
    room: SharedRoom,
    subscription: SubscriberId,
    player: Option<Player>,
    outbound_rx: mpsc::Receiver<Event>,
}

impl VoteSession {
    /// Acquire the room from the registry and subscribe the session to its broadcasts
    pub async fn open(
        session_id: &str,
        room_id: &str,
        registry: Arc<RoomRegistry>,
        outbound_queue_capacity: usize,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(outbound_queue_capacity);
        let room = registry.acquire(room_id).await;
        let subscription = room
            .lock()
            .await
            .subscribe(SessionRelay::new(session_id, outbound_tx));

        VoteSession {
            session_id: String::from(session_id),
            room_id: String::from(room_id),
            registry,
            room,
            subscription,
            player: None,
            outbound_rx,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn player(&self) -> Option<Player> {
        self.player
    }

    /// Handle a user command against the room, returns the events to send to this session only.
    ///
    /// Replies carrying room state come after every broadcast still queued for the session,
    /// so the connection never sees an older snapshot after a fresh reply.
    pub async fn handle_user_command(&mut self, cmd: UserCommand) -> Vec<Event> {
        match cmd {
            UserCommand::Join => {
                let mut room = self.room.lock().await;
                let mut replies = drain_queued(&mut self.outbound_rx);

                // a session holds at most one player, joining again only repeats the welcome
                let player = match self.player {
                    Some(player) => {
                        log::debug!("session {} is already {}", self.session_id, player);
                        player
                    }
                    None => {
                        let player = room.new_player();
                        self.player = Some(player);
                        player
                    }
                };

                replies.push(Event::Welcome(event::WelcomeReplyEvent {
                    player_id: player.id(),
                }));
                replies
            }
            UserCommand::Vote(cmd) => {
                let Some(player) = self.player else {
                    log::warn!(
                        "session {} voted without joining room '{}', ignored",
                        self.session_id,
                        self.room_id
                    );
                    return Vec::new();
                };

                if let Err(err) = self.room.lock().await.vote(player, cmd.value) {
                    log::warn!("session {} vote ignored: {}", self.session_id, err);
                }

                Vec::new()
            }
            UserCommand::Reset => {
                self.room.lock().await.reset();

                Vec::new()
            }
            UserCommand::GetState => {
                let room = self.room.lock().await;
                let mut replies = drain_queued(&mut self.outbound_rx);

                replies.push(Event::RoomState(render_room_state(&room)));
                replies
            }
            UserCommand::Echo(cmd) => vec![Event::Echo(event::EchoReplyEvent {
                payload: cmd.payload,
            })],
            // closing is up to the connection loop
            UserCommand::Close => Vec::new(),
        }
    }

    /// Receive the next event broadcasted by the room, in the order the room produced them
    ///
    /// Returns `None` once the room dropped the subscription, e.g. because the session could not keep up.
    pub async fn recv(&mut self) -> Option<Event> {
        self.outbound_rx.recv().await
    }

    /// Remove the player of the session, unsubscribe from the room and give the room back to the registry
    pub async fn close(self) -> anyhow::Result<()> {
        {
            let mut room = self.room.lock().await;

            if let Some(player) = self.player {
                if let Err(err) = room.remove_player(player) {
                    log::warn!("session {} could not leave: {}", self.session_id, err);
                }
            }

            room.unsubscribe(self.subscription);
        }

        self.registry.release(&self.room_id).await
    }
}

/// Take the broadcasts already queued for the session.
/// Called under the room lock, which every producer holds while queueing.
fn drain_queued(outbound_rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut queued = Vec::new();
    while let Ok(event) = outbound_rx.try_recv() {
        queued.push(event);
    }
    queued
}
