//! Karaoke room server library.
//!
//! Shared song queue with round-robin fairness and a single player authority
//! per room, replicated to every member over WebSocket.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod bootstrap;
pub mod config;
