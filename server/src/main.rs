use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use server::{config::Settings, room_manager::RoomRegistry};
use tokio::{
    net::TcpListener,
    signal::unix::{signal, SignalKind},
    sync::broadcast,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::parse();
    let registry = Arc::new(RoomRegistry::new());

    let mut interrupt =
        signal(SignalKind::interrupt()).expect("failed to create interrupt signal stream");
    let listener = TcpListener::bind(settings.address())
        .await
        .with_context(|| format!("could not bind to {}", settings.address()))?;
    let (quit_tx, quit_rx) = broadcast::channel::<()>(1);

    log::info!("Listening on {}", settings.address());
    tokio::spawn(async move {
        interrupt.recv().await;
        log::info!("Server interrupted. Gracefully shutting down.");
        let _ = quit_tx.send(());
    });

    server::serve(listener, registry, settings.outbound_queue_capacity, quit_rx).await;
    log::info!("Server shut down");

    Ok(())
}
