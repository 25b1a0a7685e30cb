use anyhow::Context;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{tcp::OwnedWriteHalf, TcpStream},
};
use tokio_stream::{wrappers::LinesStream, StreamExt};

use crate::{command, event, handshake::RoomHandshake};

use super::common::{to_frame_bytes, BoxedStream};

/// [EventStream] is a stream of [crate::event::Event]s sent by the server
///
/// # Cancel Safety
///
/// This stream is cancel-safe, meaning that it can be used in [tokio::select]
/// without the risk of missing events.
pub type EventStream = BoxedStream<anyhow::Result<event::Event>>;

/// [CommandWriter] is a wrapper around a [TcpStream] which writes [crate::command::UserCommand]s to the server
pub struct CommandWriter {
    writer: OwnedWriteHalf,
}

impl CommandWriter {
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Self { writer }
    }

    /// Send a [crate::command::UserCommand] to the backing [TcpStream]
    ///
    /// # Cancel Safety
    ///
    /// This method is not cancellation safe. If it is used as the event
    /// in a [tokio::select!] statement and some other
    /// branch completes first, then the provided [crate::command::UserCommand] may have been
    /// partially written, but future calls to `write` will start over
    /// from the beginning of the buffer. Causing undefined behaviour.
    pub async fn write(&mut self, command: &command::UserCommand) -> anyhow::Result<()> {
        self.write_frame(&command.to_string()).await
    }

    /// Send a raw text frame, which does not have to be a valid command
    pub async fn write_frame(&mut self, frame: &str) -> anyhow::Result<()> {
        self.writer
            .write_all(to_frame_bytes(frame).as_slice())
            .await
            .context("could not write frame to the server")?;

        Ok(())
    }
}

/// Opens the given room over a TCP stream by sending the [RoomHandshake],
/// then splits the stream into a stream of events and a command writer.
///
/// # Arguments
///
/// - `stream` - A [TcpStream] connected to the server
/// - `room` - The identifier of the room to open
pub async fn connect_tcp_stream(
    stream: TcpStream,
    room: &str,
) -> anyhow::Result<(EventStream, CommandWriter)> {
    let (reader, writer) = stream.into_split();
    let mut command_writer = CommandWriter::new(writer);

    command_writer
        .write_frame(&RoomHandshake::new(room).to_string())
        .await
        .context("could not send handshake to the server")?;

    Ok((
        Box::pin(
            LinesStream::new(BufReader::new(reader).lines()).map(|line| {
                line.context("could not read line from the server")
                    .and_then(|line| {
                        line.parse::<event::Event>()
                            .context("failed to parse event from the server")
                    })
            }),
        ),
        command_writer,
    ))
}
