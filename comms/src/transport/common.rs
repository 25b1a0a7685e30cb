use std::pin::Pin;

use tokio_stream::Stream;

pub const NEW_LINE: &[u8; 2] = b"\r\n";

pub type BoxedStream<Item> = Pin<Box<dyn Stream<Item = Item> + Send>>;

/// Appends the frame delimiter to a rendered text frame
pub fn to_frame_bytes(frame: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frame.len() + NEW_LINE.len());
    bytes.extend_from_slice(frame.as_bytes());
    bytes.extend_from_slice(NEW_LINE);
    bytes
}
