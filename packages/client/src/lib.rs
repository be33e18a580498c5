//! Interactive CLI client for the karaoke room server.

pub mod command;
pub mod error;
pub mod formatter;
pub mod policy;
pub mod runner;
pub mod session;
pub mod ui;

pub use runner::run_client;
pub use session::SessionOptions;
