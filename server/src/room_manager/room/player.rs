use std::fmt;

/// Room scoped player identifier, issued from a counter which never hands out the same value twice
pub type PlayerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// [Player] identifies a participant within a single [super::Room]
///
/// Players are ordered by their id, which is also the order they joined the room in.
pub struct Player {
    id: PlayerId,
}

impl Player {
    pub(super) fn new(id: PlayerId) -> Self {
        Player { id }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.id)
    }
}
