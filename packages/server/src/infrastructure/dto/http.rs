//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::{ArtistDto, PlayerStateDto, QueueEntryDto, SongDto};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    pub connections: usize,
    pub rooms: usize,
}

/// Room list item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub room_id: String,
    pub created_at: String,
    pub member_count: usize,
    pub queue_length: usize,
    pub player: PlayerStateDto,
}

/// Room detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub room_id: String,
    pub created_at: String,
    pub member_count: usize,
    pub queue: Vec<QueueEntryDto>,
    pub now_playing: Option<QueueEntryDto>,
    pub up_next: Option<QueueEntryDto>,
    pub player: PlayerStateDto,
}

/// Library as served by `GET /api/library`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDto {
    pub artists: Vec<ArtistDto>,
    pub songs: Vec<SongDto>,
}
