use std::sync::Arc;

use tokio::{net::TcpListener, sync::broadcast, task::JoinSet};

pub mod config;
pub mod room_manager;
pub mod session;

use crate::room_manager::RoomRegistry;

/// Accept connections and run a session for each of them until the quit signal is received.
///
/// Waits for every session to finish before the registry is shut down.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<RoomRegistry>,
    outbound_queue_capacity: usize,
    mut quit_rx: broadcast::Receiver<()>,
) {
    let mut join_set: JoinSet<anyhow::Result<()>> = JoinSet::new();

    loop {
        tokio::select! {
            _ = quit_rx.recv() => break,
            accepted = listener.accept() => match accepted {
                Ok((socket, addr)) => {
                    log::debug!("accepted connection from {}", addr);
                    join_set.spawn(session::handle_user_session(
                        Arc::clone(&registry),
                        outbound_queue_capacity,
                        quit_rx.resubscribe(),
                        socket,
                    ));
                }
                Err(err) => log::error!("could not accept connection: {}", err),
            },
            Some(finished) = join_set.join_next() => log_session_result(finished),
        }
    }

    while let Some(finished) = join_set.join_next().await {
        log_session_result(finished);
    }

    let evicted = registry.shutdown().await;
    log::info!("evicted {} room(s) on shutdown", evicted);
}

fn log_session_result(finished: Result<anyhow::Result<()>, tokio::task::JoinError>) {
    match finished {
        Ok(Ok(())) => {}
        Ok(Err(err)) => log::error!("{:#}", err),
        Err(err) => log::error!("session task failed: {}", err),
    }
}
