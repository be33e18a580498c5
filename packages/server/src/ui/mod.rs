//! Karaoke room server: HTTP API and the WebSocket action channel.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::{Server, router};
pub use signal::shutdown_signal;
