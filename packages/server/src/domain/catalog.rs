//! External catalog collaborator.
//!
//! 曲・アーティスト・ユーザー設定の永続化は外部サービスの責務であり、
//! ドメイン層は検索・更新のインターフェースだけを定義する。

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{
    error::CatalogError,
    value_object::{ArtistId, SongId, UserId},
};

/// Song metadata as served by the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub song_id: SongId,
    pub artist_id: ArtistId,
    pub title: String,
    pub artist_name: String,
    pub duration_secs: u32,
    /// Whether the requesting user has starred this song
    pub is_starred: bool,
}

/// An artist and the songs attributed to it
#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub artist_id: ArtistId,
    pub name: String,
    pub song_ids: Vec<SongId>,
}

/// Full artists + songs snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    pub artists: Vec<Artist>,
    pub songs: Vec<Song>,
}

/// Result of a provider rescan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    pub library: Library,
    /// Artists whose song list differs from before the rescan
    pub changed_artists: Vec<Artist>,
}

/// Free-form server preferences keyed by name
pub type Prefs = BTreeMap<String, serde_json::Value>;

/// Catalog lookups consumed by the room core
///
/// 失敗しても Queue の更新はブロックしない（エントリは id のみに縮退する）。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up one song
    async fn get_song(&self, song_id: SongId) -> Result<Song, CatalogError>;

    /// Snapshot of the whole library
    async fn get_library(&self) -> Result<Library, CatalogError>;

    /// Rescan the media provider and report what changed
    async fn refresh(&self) -> Result<RefreshReport, CatalogError>;

    /// Toggle the user's star on a song; returns the song as seen by that user
    async fn toggle_starred(&self, user_id: UserId, song_id: SongId) -> Result<Song, CatalogError>;

    /// Merge preferences and return the stored result
    async fn set_prefs(&self, prefs: Prefs) -> Result<Prefs, CatalogError>;
}
