use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use super::room::Room;

/// A room shared between all the sessions opened against it
pub type SharedRoom = Arc<Mutex<Room>>;

#[derive(Debug)]
struct RoomEntry {
    room: SharedRoom,
    /// Number of sessions which acquired the room and did not release it yet
    sessions: usize,
}

#[derive(Debug, Default)]
/// [RoomRegistry] maps room identifiers to live rooms and the number of sessions using them.
///
/// Rooms are created on first use and evicted when their last session releases them.
/// Acquiring and releasing happen under a single lock, so a session arriving while the last one
/// departs either reuses the room or gets a fresh one, never an evicted room.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, RoomEntry>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        RoomRegistry {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Get the room with the given id for a new session, creating it if it does not exist
    pub async fn acquire(&self, room_id: &str) -> SharedRoom {
        let mut rooms = self.rooms.lock().await;

        let entry = rooms.entry(String::from(room_id)).or_insert_with(|| {
            log::info!("room '{}' created", room_id);

            RoomEntry {
                room: Arc::new(Mutex::new(Room::new(room_id))),
                sessions: 0,
            }
        });
        entry.sessions += 1;

        Arc::clone(&entry.room)
    }

    /// Give back a room acquired by a session, the room is evicted when no session uses it anymore
    pub async fn release(&self, room_id: &str) -> anyhow::Result<()> {
        let evicted = {
            let mut rooms = self.rooms.lock().await;

            let entry = rooms
                .get_mut(room_id)
                .ok_or_else(|| anyhow::anyhow!("room '{}' not found", room_id))?;
            entry.sessions = entry.sessions.saturating_sub(1);

            if entry.sessions == 0 {
                rooms.remove(room_id)
            } else {
                None
            }
        };

        // out of the map already, so the registry lock is not held while waiting for the room
        if let Some(entry) = evicted {
            let dropped = entry.room.lock().await.unsubscribe_all();
            log::info!(
                "room '{}' evicted, dropped {} remaining subscriber(s)",
                room_id,
                dropped
            );
        }

        Ok(())
    }

    /// Evict every room and drop their subscribers, returns the number of evicted rooms
    pub async fn shutdown(&self) -> usize {
        let drained = self.rooms.lock().await.drain().collect::<Vec<_>>();

        for (_, entry) in drained.iter() {
            entry.room.lock().await.unsubscribe_all();
        }

        drained.len()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    pub async fn contains(&self, room_id: &str) -> bool {
        self.rooms.lock().await.contains_key(room_id)
    }

    /// Number of sessions holding the room, `None` if the room does not exist
    pub async fn session_count(&self, room_id: &str) -> Option<usize> {
        self.rooms
            .lock()
            .await
            .get(room_id)
            .map(|entry| entry.sessions)
    }
}
