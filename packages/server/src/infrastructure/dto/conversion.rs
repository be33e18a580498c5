//! Conversion logic between DTOs and domain models.

use crate::{
    domain::{
        Artist, Audience, Command, CorrelationId, Library, Outbound, PlaybackStatus, PlayerState,
        PlayerStatus, QueueEntry, QueueId, Reply, Request, RoomError, RoomEvent, RoomId,
        RoomSnapshot, Song, SongId,
    },
    infrastructure::dto::{
        http::{LibraryDto, RoomDetailDto, RoomSummaryDto},
        websocket::{
            AckResultDto, ArtistDto, AudienceDto, ClientAction, ClientEnvelope, PlayerStateDto,
            PlayerStatusDto, QueueDeltaDto, QueueEntryDto, ServerAction, ServerEnvelope, SongDto,
        },
    },
};
use karaoke_shared::time::timestamp_to_rfc3339;

// ========================================
// DTO → Domain Model
// ========================================

/// An inbound frame that could not be turned into a `Request`
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedFrame {
    pub correlation_id: Option<CorrelationId>,
    pub error: RoomError,
}

impl TryFrom<ClientAction> for Command {
    type Error = RoomError;

    fn try_from(action: ClientAction) -> Result<Self, Self::Error> {
        let command = match action {
            ClientAction::Join { room_id } => Command::Join {
                room_id: RoomId::new(room_id).map_err(|e| RoomError::InvalidAction(e.to_string()))?,
            },
            ClientAction::Leave => Command::Leave,
            ClientAction::RoomSnapshotRequest => Command::SnapshotRequest,
            ClientAction::QueueAdd { song_id } => Command::QueueAdd {
                song_id: SongId::new(song_id),
            },
            ClientAction::QueueRemove { queue_id } => Command::QueueRemove {
                queue_id: QueueId::new(queue_id),
            },
            ClientAction::PlayerClaimRequest => Command::PlayerClaim,
            ClientAction::PlayerReleaseRequest => Command::PlayerRelease,
            ClientAction::PlayerPlayRequest => Command::PlayerPlay,
            ClientAction::PlayerPauseRequest => Command::PlayerPause,
            ClientAction::PlayerNextRequest => Command::PlayerNext,
            ClientAction::PlayerVolumeRequest { level } => Command::PlayerVolume { level },
            ClientAction::PlayerMediaEnded { queue_id } => Command::PlayerMediaEnded {
                queue_id: QueueId::new(queue_id),
            },
            ClientAction::PlayerStatusReport { queue_id, position } => {
                Command::PlayerStatusReport(PlaybackStatus {
                    queue_id: queue_id.map(QueueId::new),
                    position_secs: position,
                })
            }
            ClientAction::PlayerErrorReport { message } => Command::PlayerErrorReport { message },
            ClientAction::ProviderRefreshRequest => Command::ProviderRefresh,
            ClientAction::ToggleSongStarred { song_id } => Command::ToggleSongStarred {
                song_id: SongId::new(song_id),
            },
            ClientAction::SetPrefs { prefs } => Command::SetPrefs(prefs),
        };
        Ok(command)
    }
}

impl TryFrom<ClientEnvelope> for Request {
    type Error = RejectedFrame;

    fn try_from(envelope: ClientEnvelope) -> Result<Self, Self::Error> {
        let correlation_id = envelope
            .correlation_id
            .map(CorrelationId::new)
            .transpose()
            .map_err(|e| RejectedFrame {
                correlation_id: None,
                error: RoomError::InvalidAction(e.to_string()),
            })?;

        let command = envelope
            .action
            .map_err(RoomError::InvalidAction)
            .and_then(Command::try_from)
            .map_err(|error| RejectedFrame {
                correlation_id: correlation_id.clone(),
                error,
            })?;

        Ok(Request {
            command,
            correlation_id,
        })
    }
}

// ========================================
// Domain Model → DTO
// ========================================

impl From<&QueueEntry> for QueueEntryDto {
    fn from(entry: &QueueEntry) -> Self {
        Self {
            queue_id: entry.queue_id.value(),
            song_id: entry.song_id.value(),
            user_id: entry.user_id.value(),
            user_display_name: entry.user_display_name.clone(),
            inserted_at: entry.inserted_at.value(),
            title: entry.song.as_ref().map(|song| song.title.clone()),
            artist: entry.song.as_ref().map(|song| song.artist_name.clone()),
            duration: entry.song.as_ref().map(|song| song.duration_secs),
        }
    }
}

impl From<PlayerStatus> for PlayerStatusDto {
    fn from(status: PlayerStatus) -> Self {
        match status {
            PlayerStatus::Stopped => Self::Stopped,
            PlayerStatus::Playing => Self::Playing,
            PlayerStatus::Paused => Self::Paused,
        }
    }
}

impl From<&PlayerState> for PlayerStateDto {
    fn from(state: &PlayerState) -> Self {
        Self {
            status: state.status.into(),
            current_queue_id: state.current_queue_id.map(|id| id.value()),
            volume: state.volume.value(),
            player_connection_id: state
                .player_connection_id
                .as_ref()
                .map(|id| id.as_str().to_string()),
        }
    }
}

impl From<&Song> for SongDto {
    fn from(song: &Song) -> Self {
        Self {
            song_id: song.song_id.value(),
            artist_id: song.artist_id.value(),
            title: song.title.clone(),
            artist: song.artist_name.clone(),
            duration: song.duration_secs,
            is_starred: song.is_starred,
        }
    }
}

impl From<&Artist> for ArtistDto {
    fn from(artist: &Artist) -> Self {
        Self {
            artist_id: artist.artist_id.value(),
            name: artist.name.clone(),
            song_ids: artist.song_ids.iter().map(|id| id.value()).collect(),
        }
    }
}

impl From<Audience> for AudienceDto {
    fn from(audience: Audience) -> Self {
        match audience {
            Audience::Room => Self::Room,
            Audience::Player => Self::Player,
            Audience::Direct => Self::Direct,
        }
    }
}

impl From<&Reply> for AckResultDto {
    fn from(reply: &Reply) -> Self {
        match reply {
            Reply::Joined { room_id } => Self::Joined {
                room_id: room_id.as_str().to_string(),
            },
            Reply::Left { room_id } => Self::Left {
                room_id: room_id.as_ref().map(|id| id.as_str().to_string()),
            },
            Reply::QueueAdded(entry) => Self::QueueAdded {
                entry: entry.into(),
            },
            Reply::QueueRemoved { queue_id } => Self::QueueRemoved {
                queue_id: queue_id.value(),
            },
            Reply::Player(state) => Self::Player {
                player: state.into(),
            },
            Reply::SongUpdated(song) => Self::SongUpdated { song: song.into() },
            Reply::PrefsSaved(prefs) => Self::PrefsSaved {
                prefs: prefs.clone(),
            },
            Reply::LibraryRefreshed {
                artist_count,
                song_count,
            } => Self::LibraryRefreshed {
                artist_count: *artist_count,
                song_count: *song_count,
            },
            Reply::Accepted => Self::Accepted,
        }
    }
}

impl From<&RoomEvent> for ServerAction {
    fn from(event: &RoomEvent) -> Self {
        match event {
            RoomEvent::QueueAdded { entry, index } => Self::QueueUpdate {
                delta: QueueDeltaDto::Added {
                    entry: entry.into(),
                    index: *index,
                },
            },
            RoomEvent::QueueRemoved { queue_id } => Self::QueueUpdate {
                delta: QueueDeltaDto::Removed {
                    queue_id: queue_id.value(),
                },
            },
            RoomEvent::QueueAdvanced { queue_id } => Self::QueueUpdate {
                delta: QueueDeltaDto::Advanced {
                    queue_id: queue_id.value(),
                },
            },
            RoomEvent::QueueEnd => Self::QueueEnd,
            RoomEvent::UpNext(entry) => Self::QueueUpNext {
                entry: entry.as_ref().map(QueueEntryDto::from),
            },
            RoomEvent::PlayerPlay { queue_id } => Self::PlayerPlay {
                queue_id: queue_id.value(),
            },
            RoomEvent::PlayerPause => Self::PlayerPause,
            RoomEvent::PlayerNext { queue_id } => Self::PlayerNext {
                queue_id: queue_id.map(|id| id.value()),
            },
            RoomEvent::PlayerVolume { volume } => Self::PlayerVolume {
                level: volume.value(),
            },
            RoomEvent::PlayerState(state) => Self::PlayerState {
                player: state.into(),
            },
            RoomEvent::PlaybackStatus(status) => Self::EmitStatus {
                queue_id: status.queue_id.map(|id| id.value()),
                position: status.position_secs,
            },
            RoomEvent::PlaybackError { message } => Self::EmitError {
                message: message.clone(),
            },
            RoomEvent::LibraryUpdate(library) => Self::LibraryUpdate {
                artists: library.artists.iter().map(ArtistDto::from).collect(),
                songs: library.songs.iter().map(SongDto::from).collect(),
            },
            RoomEvent::ArtistUpdate(artist) => Self::ArtistUpdate {
                artist: artist.into(),
            },
            RoomEvent::SongUpdate(song) => Self::SongUpdate { song: song.into() },
            RoomEvent::PrefsChange(prefs) => Self::PrefsChange {
                prefs: prefs.clone(),
            },
        }
    }
}

impl From<&RoomSnapshot> for ServerAction {
    fn from(snapshot: &RoomSnapshot) -> Self {
        Self::RoomSnapshot {
            room_id: snapshot.room_id.as_str().to_string(),
            queue: snapshot.queue.iter().map(QueueEntryDto::from).collect(),
            now_playing: snapshot.now_playing.as_ref().map(QueueEntryDto::from),
            up_next: snapshot.up_next.as_ref().map(QueueEntryDto::from),
            player: (&snapshot.player).into(),
            member_count: snapshot.member_count,
        }
    }
}

/// Authentication/authorization failures use their own action so clients can re-authenticate
fn error_action(error: &RoomError) -> ServerAction {
    let kind = error.kind().to_string();
    let message = error.to_string();
    if error.is_auth_failure() {
        ServerAction::SocketAuthError { kind, message }
    } else {
        ServerAction::Error { kind, message }
    }
}

impl From<&Outbound> for ServerEnvelope {
    fn from(outbound: &Outbound) -> Self {
        let (action, correlation_id) = match outbound {
            Outbound::Broadcast(event) | Outbound::Direct(event) => (event.into(), None),
            Outbound::Snapshot(snapshot) => (snapshot.into(), None),
            Outbound::Ack {
                correlation_id,
                reply,
            } => (
                ServerAction::Ack {
                    result: reply.into(),
                },
                Some(correlation_id.as_str().to_string()),
            ),
            Outbound::Error {
                correlation_id,
                error,
            } => (
                error_action(error),
                correlation_id.as_ref().map(|id| id.as_str().to_string()),
            ),
        };

        Self {
            action,
            audience: outbound.audience().into(),
            correlation_id,
        }
    }
}

impl From<&RoomSnapshot> for RoomSummaryDto {
    fn from(snapshot: &RoomSnapshot) -> Self {
        Self {
            room_id: snapshot.room_id.as_str().to_string(),
            created_at: timestamp_to_rfc3339(snapshot.created_at.value()),
            member_count: snapshot.member_count,
            queue_length: snapshot.queue.len(),
            player: (&snapshot.player).into(),
        }
    }
}

impl From<&RoomSnapshot> for RoomDetailDto {
    fn from(snapshot: &RoomSnapshot) -> Self {
        Self {
            room_id: snapshot.room_id.as_str().to_string(),
            created_at: timestamp_to_rfc3339(snapshot.created_at.value()),
            member_count: snapshot.member_count,
            queue: snapshot.queue.iter().map(QueueEntryDto::from).collect(),
            now_playing: snapshot.now_playing.as_ref().map(QueueEntryDto::from),
            up_next: snapshot.up_next.as_ref().map(QueueEntryDto::from),
            player: (&snapshot.player).into(),
        }
    }
}

impl From<&Library> for LibraryDto {
    fn from(library: &Library) -> Self {
        Self {
            artists: library.artists.iter().map(ArtistDto::from).collect(),
            songs: library.songs.iter().map(SongDto::from).collect(),
        }
    }
}
