//! インメモリ実装

pub mod connection;
pub mod room;

pub use connection::InMemoryConnectionTracker;
pub use room::InMemoryRoomRepository;
