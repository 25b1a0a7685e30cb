/// Client side of a room connection: sends the handshake, then writes commands and reads events
#[cfg(feature = "client")]
pub mod client;
#[cfg(any(feature = "client", feature = "server"))]
mod common;
/// Server side of a room connection: accepts the handshake, then reads commands and writes events
#[cfg(feature = "server")]
pub mod server;
