use std::{fmt, str::FromStr};

use thiserror::Error;

/// Keyword prefix of a vote command, any frame starting with it is treated as a vote attempt
pub const VOTE_KEYWORD: &str = "VOTE";

/// User Command for casting a hidden vote.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteCommand {
    // The value of the vote.
    pub value: i64,
}

/// User Command for unrecognized input, the server answers it with an echo.
#[derive(Debug, Clone, PartialEq)]
pub struct EchoCommand {
    // The raw frame as it was received.
    pub payload: String,
}

/// A user command which can be sent to the server by a single user session.
/// All commands are processed in the context of the room the session was opened against.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Join,
    Vote(VoteCommand),
    Reset,
    GetState,
    Close,
    Echo(EchoCommand),
}

/// A frame which looked like a command but could not be parsed into one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("malformed vote command: '{payload}'")]
    MalformedVote { payload: String },
}

impl FromStr for UserCommand {
    type Err = ParseCommandError;

    fn from_str(frame: &str) -> Result<Self, Self::Err> {
        match frame {
            "JOIN" => Ok(UserCommand::Join),
            "RESET" => Ok(UserCommand::Reset),
            "GETSTATE" => Ok(UserCommand::GetState),
            "close" => Ok(UserCommand::Close),
            vote if vote.starts_with(VOTE_KEYWORD) => vote
                .split_whitespace()
                .nth(1)
                .and_then(|value| value.parse::<i64>().ok())
                .map(|value| UserCommand::Vote(VoteCommand { value }))
                .ok_or_else(|| ParseCommandError::MalformedVote {
                    payload: String::from(vote),
                }),
            other => Ok(UserCommand::Echo(EchoCommand {
                payload: String::from(other),
            })),
        }
    }
}

impl fmt::Display for UserCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserCommand::Join => f.write_str("JOIN"),
            UserCommand::Vote(cmd) => write!(f, "{} {}", VOTE_KEYWORD, cmd.value),
            UserCommand::Reset => f.write_str("RESET"),
            UserCommand::GetState => f.write_str("GETSTATE"),
            UserCommand::Close => f.write_str("close"),
            UserCommand::Echo(cmd) => f.write_str(&cmd.payload),
        }
    }
}
