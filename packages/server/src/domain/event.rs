//! Room deltas and direct replies produced by room operations.

use super::{
    catalog::{Artist, Library, Prefs, Song},
    error::RoomError,
    player::PlayerState,
    queue::QueueEntry,
    room::RoomSnapshot,
    value_object::{CorrelationId, QueueId, RoomId, Volume},
};

/// Progress report from the authoritative player
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStatus {
    pub queue_id: Option<QueueId>,
    pub position_secs: f64,
}

/// Who a broadcast is relevant to.
///
/// The server always sends to the whole room; receivers not showing the
/// player view drop `Player` deltas locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Room,
    Player,
    Direct,
}

/// Minimal state change replicated to room members
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    QueueAdded { entry: QueueEntry, index: usize },
    QueueRemoved { queue_id: QueueId },
    /// The head entry moved into the now-playing slot
    QueueAdvanced { queue_id: QueueId },
    QueueEnd,
    /// The head of the queue changed; `None` once the queue is empty
    UpNext(Option<QueueEntry>),
    PlayerPlay { queue_id: QueueId },
    PlayerPause,
    PlayerNext { queue_id: Option<QueueId> },
    PlayerVolume { volume: Volume },
    /// Authority or stop change; carries the full (small) player state
    PlayerState(PlayerState),
    PlaybackStatus(PlaybackStatus),
    PlaybackError { message: String },
    LibraryUpdate(Library),
    ArtistUpdate(Artist),
    SongUpdate(Song),
    PrefsChange(Prefs),
}

impl RoomEvent {
    pub fn audience(&self) -> Audience {
        match self {
            Self::PlayerPlay { .. }
            | Self::PlayerPause
            | Self::PlayerNext { .. }
            | Self::PlayerVolume { .. }
            | Self::PlaybackStatus(_)
            | Self::PlaybackError { .. } => Audience::Player,
            _ => Audience::Room,
        }
    }
}

/// Result of a successful action, sent back to a correlated request
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Joined { room_id: RoomId },
    Left { room_id: Option<RoomId> },
    QueueAdded(QueueEntry),
    QueueRemoved { queue_id: QueueId },
    Player(PlayerState),
    SongUpdated(Song),
    PrefsSaved(Prefs),
    LibraryRefreshed { artist_count: usize, song_count: usize },
    Accepted,
}

/// Everything the server pushes to a connection
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Delta fanned out to the whole room
    Broadcast(RoomEvent),
    /// Delta sent to a single connection only
    Direct(RoomEvent),
    /// Full room state replayed on join or resync
    Snapshot(RoomSnapshot),
    Ack {
        correlation_id: CorrelationId,
        reply: Reply,
    },
    Error {
        correlation_id: Option<CorrelationId>,
        error: RoomError,
    },
}

impl Outbound {
    pub fn audience(&self) -> Audience {
        match self {
            Self::Broadcast(event) => event.audience(),
            _ => Audience::Direct,
        }
    }
}
