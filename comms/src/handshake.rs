use std::{fmt, str::FromStr};

use thiserror::Error;

/// Keyword of the opening frame of every connection
pub const ROOM_KEYWORD: &str = "ROOM";

/// The first frame a client sends, naming the room the connection is opened against.
///
/// Room identifiers are opaque, the only requirement is that they are a single non-empty token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomHandshake {
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    #[error("connection closed before the handshake")]
    Missing,
    #[error("expected 'ROOM <room>', got '{0}'")]
    Malformed(String),
}

impl RoomHandshake {
    pub fn new(room: &str) -> Self {
        RoomHandshake {
            room: String::from(room),
        }
    }
}

impl FromStr for RoomHandshake {
    type Err = HandshakeError;

    fn from_str(frame: &str) -> Result<Self, Self::Err> {
        let mut tokens = frame.split_whitespace();

        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(ROOM_KEYWORD), Some(room), None) => Ok(RoomHandshake::new(room)),
            _ => Err(HandshakeError::Malformed(String::from(frame))),
        }
    }
}

impl fmt::Display for RoomHandshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", ROOM_KEYWORD, self.room)
    }
}
