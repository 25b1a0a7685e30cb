use clap::Parser;

use crate::session::MAX_MESSAGES_PER_OPERATION;

const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 100;

#[derive(Debug, Clone, Parser)]
#[command(name = "ninjutsu-server", version, about = "Hidden vote rooms over TCP")]
/// [Settings] of the server process, read from the command line or the environment
pub struct Settings {
    /// Address to bind the listener to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to accept connections on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Number of events a session may fall behind its room before it is dropped
    #[arg(
        long,
        env = "OUTBOUND_QUEUE_CAPACITY",
        default_value_t = DEFAULT_OUTBOUND_QUEUE_CAPACITY,
        value_parser = parse_queue_capacity
    )]
    pub outbound_queue_capacity: usize,
}

impl Settings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_queue_capacity(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(capacity) if capacity < MAX_MESSAGES_PER_OPERATION => Err(format!(
            "capacity must be at least {}",
            MAX_MESSAGES_PER_OPERATION
        )),
        Ok(capacity) => Ok(capacity),
        Err(err) => Err(err.to_string()),
    }
}
