use std::sync::Arc;

use comms::{
    command::{ParseCommandError, UserCommand},
    transport::{self, server::CommandStream, server::EventWriter},
};
use nanoid::nanoid;
use tokio::{net::TcpStream, sync::broadcast};
use tokio_stream::StreamExt;

use crate::room_manager::RoomRegistry;

use self::vote_session::VoteSession;

mod relay;
mod vote_session;

pub use self::relay::{
    render_room_events, render_room_state, SessionRelay, MAX_MESSAGES_PER_OPERATION,
};

/// Why the connection loop of a session stopped
#[derive(Debug)]
enum SessionEnd {
    /// The user sent a close command or closed the tcp stream
    Closed,
    /// The room dropped the session's subscription
    Unsubscribed,
    /// The server is shutting down
    Quit,
}

/// Given a tcp stream and a room registry, handles the user session
/// until the user quits the session, or the tcp stream is closed for some reason, or the server shuts down
pub async fn handle_user_session(
    registry: Arc<RoomRegistry>,
    outbound_queue_capacity: usize,
    mut quit_rx: broadcast::Receiver<()>,
    stream: TcpStream,
) -> anyhow::Result<()> {
    let session_id = nanoid!();
    // The first frame names the room, the rest of the stream is split into commands and an event writer
    let accepted = tokio::select! {
        accepted = transport::server::accept_tcp_stream(stream) => accepted,
        Ok(_) = quit_rx.recv() => return Ok(()),
    };
    let (handshake, mut commands, mut event_writer) = match accepted {
        Ok(accepted) => accepted,
        Err(err) => {
            log::warn!("session {} rejected: {:#}", session_id, err);
            return Ok(());
        }
    };

    // Vote Session will abstract the room membership of this connection
    let mut vote_session = VoteSession::open(
        &session_id,
        &handshake.room,
        registry,
        outbound_queue_capacity,
    )
    .await;
    log::info!("session {} opened room '{}'", session_id, handshake.room);

    let result = run_session(
        &mut vote_session,
        &mut commands,
        &mut event_writer,
        &mut quit_rx,
    )
    .await;

    // If the server is shutting down, we can just close the tcp streams
    // the registry drops every room as a whole afterwards
    if let Ok(SessionEnd::Quit) = result {
        drop(event_writer);
        log::info!("Gracefully shutting down session {}.", session_id);
        return Ok(());
    }

    // Otherwise the player leaves the room, which notifies the other sessions about the departure
    let player = vote_session.player();
    let room_id = String::from(vote_session.room_id());
    if let Err(err) = vote_session.close().await {
        log::warn!("session {} could not release room '{}': {:#}", session_id, room_id, err);
    }
    log::info!(
        "session {} closed room '{}'{}",
        session_id,
        room_id,
        player
            .map(|player| format!(" as {}", player))
            .unwrap_or_default()
    );

    result.map(|_| ())
}

async fn run_session(
    vote_session: &mut VoteSession,
    commands: &mut CommandStream,
    event_writer: &mut EventWriter,
    quit_rx: &mut broadcast::Receiver<()>,
) -> anyhow::Result<SessionEnd> {
    loop {
        tokio::select! {
            cmd = commands.next() => match cmd {
                // If the user closes the tcp stream, or sends a close cmd
                None | Some(Ok(UserCommand::Close)) => return Ok(SessionEnd::Closed),
                // Handle a valid user command, replies are sent to this user only
                Some(Ok(cmd)) => {
                    log::debug!("session {} received {:?}", vote_session.session_id(), cmd);
                    for reply in vote_session.handle_user_command(cmd).await {
                        event_writer.write(&reply).await?;
                    }
                }
                // A frame which could not be parsed is ignored, anything else means the stream broke
                Some(Err(err)) => match err.downcast_ref::<ParseCommandError>() {
                    Some(malformed) => {
                        log::warn!("session {} ignored {}", vote_session.session_id(), malformed)
                    }
                    None => return Err(err),
                },
            },
            // Broadcasted events of the room are sent to the user in the order they were produced
            event = vote_session.recv() => match event {
                Some(event) => event_writer.write(&event).await?,
                None => {
                    log::warn!("session {} was dropped by its room", vote_session.session_id());
                    return Ok(SessionEnd::Unsubscribed);
                }
            },
            Ok(_) = quit_rx.recv() => return Ok(SessionEnd::Quit),
        }
    }
}
