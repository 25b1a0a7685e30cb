use anyhow::Context;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{tcp::OwnedWriteHalf, TcpStream},
};
use tokio_stream::{wrappers::LinesStream, StreamExt};

use crate::{
    command, event,
    handshake::{HandshakeError, RoomHandshake},
};

use super::common::{to_frame_bytes, BoxedStream};

/// [CommandStream] is a stream of [crate::command::UserCommand]s sent by the client
///
/// A frame which could not be parsed yields an error that downcasts to
/// [crate::command::ParseCommandError], any other error means the stream itself failed.
///
/// # Cancel Safety
///
/// This stream is cancel-safe, meaning that it can be used in [tokio::select!]
/// without the risk of missing commands.
pub type CommandStream = BoxedStream<anyhow::Result<command::UserCommand>>;

/// [EventWriter] is a wrapper around a [TcpStream] which writes [crate::event::Event]s to the client
pub struct EventWriter {
    writer: OwnedWriteHalf,
}

impl EventWriter {
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Self { writer }
    }

    /// Send a [crate::event::Event] to the backing [TcpStream]
    ///
    /// # Cancel Safety
    ///
    /// This method is not cancellation safe. If it is used as the event
    /// in a [tokio::select!] statement and some other
    /// branch completes first, then the provided [crate::event::Event] may have been
    /// partially written, but future calls to `write` will start over
    /// from the beginning of the buffer. Causing undefined behaviour.
    pub async fn write(&mut self, event: &event::Event) -> anyhow::Result<()> {
        self.writer
            .write_all(to_frame_bytes(&event.to_string()).as_slice())
            .await
            .context("could not write event to the client")?;

        Ok(())
    }
}

/// Reads the opening [RoomHandshake] of a TCP stream, then splits it into a stream of commands and an event writer.
///
/// # Arguments
///
/// - `stream` - A freshly accepted [TcpStream]
///
/// # Errors
///
/// Fails with a [HandshakeError] if the client closes the stream or sends anything but a handshake first.
pub async fn accept_tcp_stream(
    stream: TcpStream,
) -> anyhow::Result<(RoomHandshake, CommandStream, EventWriter)> {
    let (reader, writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let handshake = lines
        .next_line()
        .await
        .context("could not read handshake from the client")?
        .ok_or(HandshakeError::Missing)?
        .parse::<RoomHandshake>()?;

    Ok((
        handshake,
        Box::pin(LinesStream::new(lines).map(|line| {
            line.context("could not read line from the client")
                .and_then(|line| {
                    line.parse::<command::UserCommand>()
                        .context("failed to parse command from client")
                })
        })),
        EventWriter::new(writer),
    ))
}
