//! Domain layer: room state, queue engine, player authority and the seams
//! the core depends on.

pub mod catalog;
pub mod command;
pub mod connection;
pub mod error;
pub mod event;
pub mod identity;
pub mod message_pusher;
pub mod player;
pub mod queue;
pub mod repository;
pub mod room;
pub mod value_object;

pub use catalog::{Artist, Catalog, Library, Prefs, RefreshReport, Song};
pub use command::{Command, Request};
pub use connection::ConnectionRef;
pub use error::{CatalogError, MessagePushError, RepositoryError, RoomError};
pub use event::{Audience, Outbound, PlaybackStatus, Reply, RoomEvent};
pub use identity::{Identity, IdentityContext, IdentityResolver};
pub use message_pusher::{FaultReporter, MessagePusher, PusherChannel};
pub use player::{AuthorityState, PlayerAuthority, PlayerState, PlayerStatus};
pub use queue::{EnqueueRequest, Queue, QueueEntry, Requester, SongMeta};
pub use repository::{ConnectionTracker, RoomGuard, RoomRepository};
pub use room::{RoomSnapshot, RoomState, Transition};
pub use value_object::{
    ArtistId, ConnectionId, CorrelationId, QueueId, RoomId, SongId, Timestamp, UserId,
    ValueObjectError, Volume,
};

#[cfg(test)]
pub use catalog::MockCatalog;
