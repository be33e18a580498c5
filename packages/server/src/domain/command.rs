//! Decoded client actions.
//!
//! ワイヤ上の文字列タグではなく閉じた enum で表現し、Action Router で網羅的に match する。

use super::{
    catalog::Prefs,
    event::PlaybackStatus,
    value_object::{CorrelationId, QueueId, RoomId, SongId},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Join { room_id: RoomId },
    Leave,
    SnapshotRequest,
    QueueAdd { song_id: SongId },
    QueueRemove { queue_id: QueueId },
    PlayerClaim,
    PlayerRelease,
    PlayerPlay,
    PlayerPause,
    PlayerNext,
    PlayerVolume { level: i64 },
    PlayerMediaEnded { queue_id: QueueId },
    PlayerStatusReport(PlaybackStatus),
    PlayerErrorReport { message: String },
    ProviderRefresh,
    ToggleSongStarred { song_id: SongId },
    SetPrefs(Prefs),
}

/// A command plus the optional correlation id of its direct reply
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub command: Command,
    pub correlation_id: Option<CorrelationId>,
}

impl Request {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            correlation_id: None,
        }
    }

    pub fn correlated(command: Command, correlation_id: CorrelationId) -> Self {
        Self {
            command,
            correlation_id: Some(correlation_id),
        }
    }
}
