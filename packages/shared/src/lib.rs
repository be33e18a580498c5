//! Utilities shared by the karaoke server and client.

pub mod logger;
pub mod time;
