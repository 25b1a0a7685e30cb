use std::{fmt, str::FromStr};

use thiserror::Error;

/// Suffix appended to unrecognized frames echoed back to the sender
pub const ECHO_SUFFIX: &str = "/answer";

/// Reply to a session's own join, carries the freshly allocated player id
#[derive(Debug, Clone, PartialEq)]
pub struct WelcomeReplyEvent {
    pub player_id: u64,
}

/// A player of the room has placed a vote, the value stays hidden
#[derive(Debug, Clone, PartialEq)]
pub struct VoteBroadcastEvent {
    pub player_id: u64,
}

/// Whether a player has voted yet, shown while votes are being collected
#[derive(Debug, Clone, PartialEq)]
pub struct VoteProgress {
    pub player_id: u64,
    pub has_voted: bool,
}

/// The revealed vote of a player, shown once every player has voted
#[derive(Debug, Clone, PartialEq)]
pub struct VoteResult {
    pub player_id: u64,
    pub value: i64,
}

/// Snapshot of a room, one entry per current player in join order
#[derive(Debug, Clone, PartialEq)]
pub enum RoomStateBroadcastEvent {
    Progress(Vec<VoteProgress>),
    Result(Vec<VoteResult>),
}

/// Reply to an unrecognized frame
#[derive(Debug, Clone, PartialEq)]
pub struct EchoReplyEvent {
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq)]
/// Events that can be sent to the client
/// Events are either replies to the session's own commands or broadcasts from the room
pub enum Event {
    Welcome(WelcomeReplyEvent),
    Vote(VoteBroadcastEvent),
    RoomState(RoomStateBroadcastEvent),
    Echo(EchoReplyEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseEventError {
    #[error("unknown event: '{0}'")]
    Unknown(String),
    #[error("malformed '{keyword}' event: '{frame}'")]
    Malformed { keyword: &'static str, frame: String },
}

impl fmt::Display for RoomStateBroadcastEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomStateBroadcastEvent::Progress(entries) => {
                f.write_str("ROOM_STATE PROGRESS")?;
                for entry in entries {
                    write!(f, " {}:{}", entry.player_id, entry.has_voted)?;
                }
            }
            RoomStateBroadcastEvent::Result(entries) => {
                f.write_str("ROOM_STATE RESULT")?;
                for entry in entries {
                    write!(f, " {}:{}", entry.player_id, entry.value)?;
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Welcome(event) => write!(f, "WELCOME {}", event.player_id),
            Event::Vote(event) => write!(f, "VOTE {}", event.player_id),
            Event::RoomState(event) => fmt::Display::fmt(event, f),
            Event::Echo(event) => write!(f, "{}{}", event.payload, ECHO_SUFFIX),
        }
    }
}

/// Splits a `<player_id>:<value>` pair of a room state event
fn parse_pair<V: FromStr>(pair: &str) -> Option<(u64, V)> {
    let (player_id, value) = pair.split_once(':')?;

    Some((player_id.parse().ok()?, value.parse().ok()?))
}

fn parse_room_state(mut tokens: std::str::SplitWhitespace<'_>) -> Option<Event> {
    let state = match tokens.next()? {
        "PROGRESS" => RoomStateBroadcastEvent::Progress(
            tokens
                .map(|pair| {
                    parse_pair(pair).map(|(player_id, has_voted)| VoteProgress {
                        player_id,
                        has_voted,
                    })
                })
                .collect::<Option<Vec<_>>>()?,
        ),
        "RESULT" => RoomStateBroadcastEvent::Result(
            tokens
                .map(|pair| parse_pair(pair).map(|(player_id, value)| VoteResult { player_id, value }))
                .collect::<Option<Vec<_>>>()?,
        ),
        _ => return None,
    };

    Some(Event::RoomState(state))
}

impl FromStr for Event {
    type Err = ParseEventError;

    fn from_str(frame: &str) -> Result<Self, Self::Err> {
        // echo replies may carry any payload, so they are recognized by their suffix first
        if let Some(payload) = frame.strip_suffix(ECHO_SUFFIX) {
            return Ok(Event::Echo(EchoReplyEvent {
                payload: String::from(payload),
            }));
        }

        let malformed = |keyword: &'static str| ParseEventError::Malformed {
            keyword,
            frame: String::from(frame),
        };
        let mut tokens = frame.split_whitespace();

        match tokens.next() {
            Some("WELCOME") => tokens
                .next()
                .and_then(|id| id.parse().ok())
                .map(|player_id| Event::Welcome(WelcomeReplyEvent { player_id }))
                .ok_or_else(|| malformed("WELCOME")),
            Some("VOTE") => tokens
                .next()
                .and_then(|id| id.parse().ok())
                .map(|player_id| Event::Vote(VoteBroadcastEvent { player_id }))
                .ok_or_else(|| malformed("VOTE")),
            Some("ROOM_STATE") => {
                parse_room_state(tokens).ok_or_else(|| malformed("ROOM_STATE"))
            }
            _ => Err(ParseEventError::Unknown(String::from(frame))),
        }
    }
}
