//! Data Transfer Objects (DTOs) for the karaoke server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket action DTOs
//! - `http`: HTTP API response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
