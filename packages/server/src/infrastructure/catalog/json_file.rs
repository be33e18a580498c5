//! JSON file backed catalog.
//!
//! 曲とアーティストの一覧を JSON ファイルから読み込む。`refresh` でファイルを
//! 読み直し、曲の構成が変わったアーティストを報告する。
//! お気に入りと設定はプロセス内にのみ保持する。
//!
//! ```json
//! {
//!   "artists": [{ "artistId": 1, "name": "The Band" }],
//!   "songs": [{ "songId": 10, "artistId": 1, "title": "Hit", "duration": 215 }]
//! }
//! ```

use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::domain::{
    Artist, ArtistId, Catalog, CatalogError, Library, Prefs, RefreshReport, Song, SongId, UserId,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtistRecord {
    artist_id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SongRecord {
    song_id: i64,
    artist_id: i64,
    title: String,
    #[serde(default)]
    duration: u32,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    artists: Vec<ArtistRecord>,
    #[serde(default)]
    songs: Vec<SongRecord>,
}

impl CatalogFile {
    fn into_library(self) -> Library {
        let names: BTreeMap<i64, String> = self
            .artists
            .iter()
            .map(|artist| (artist.artist_id, artist.name.clone()))
            .collect();

        let songs: Vec<Song> = self
            .songs
            .into_iter()
            .map(|song| Song {
                song_id: SongId::new(song.song_id),
                artist_id: ArtistId::new(song.artist_id),
                artist_name: names.get(&song.artist_id).cloned().unwrap_or_default(),
                title: song.title,
                duration_secs: song.duration,
                is_starred: false,
            })
            .collect();

        let artists = self
            .artists
            .into_iter()
            .map(|artist| Artist {
                artist_id: ArtistId::new(artist.artist_id),
                song_ids: songs
                    .iter()
                    .filter(|song| song.artist_id.value() == artist.artist_id)
                    .map(|song| song.song_id)
                    .collect(),
                name: artist.name,
            })
            .collect();

        Library { artists, songs }
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    library: Library,
    starred: HashSet<(UserId, SongId)>,
    prefs: Prefs,
}

/// Catalog served from a JSON file
#[derive(Debug, Default)]
pub struct JsonFileCatalog {
    path: Option<PathBuf>,
    state: RwLock<CatalogState>,
}

impl JsonFileCatalog {
    /// Catalog with no backing file
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let library = parse_library(json)?;
        Ok(Self {
            path: None,
            state: RwLock::new(CatalogState {
                library,
                ..CatalogState::default()
            }),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref().to_path_buf();
        let json = std::fs::read_to_string(&path)
            .map_err(|e| CatalogError::Backend(format!("{}: {e}", path.display())))?;

        let mut catalog = Self::from_json(&json)?;
        catalog.path = Some(path);
        Ok(catalog)
    }

    fn song_for(state: &CatalogState, user_id: Option<UserId>, song_id: SongId) -> Result<Song, CatalogError> {
        let mut song = state
            .library
            .songs
            .iter()
            .find(|song| song.song_id == song_id)
            .cloned()
            .ok_or(CatalogError::SongNotFound(song_id))?;
        song.is_starred = user_id.is_some_and(|user| state.starred.contains(&(user, song_id)));
        Ok(song)
    }
}

fn parse_library(json: &str) -> Result<Library, CatalogError> {
    let file: CatalogFile =
        serde_json::from_str(json).map_err(|e| CatalogError::Backend(e.to_string()))?;
    Ok(file.into_library())
}

/// Artists that are new or whose song list differs
fn changed_artists(before: &Library, after: &Library) -> Vec<Artist> {
    after
        .artists
        .iter()
        .filter(|artist| {
            !before
                .artists
                .iter()
                .any(|old| old.artist_id == artist.artist_id && old.song_ids == artist.song_ids)
        })
        .cloned()
        .collect()
}

#[async_trait]
impl Catalog for JsonFileCatalog {
    async fn get_song(&self, song_id: SongId) -> Result<Song, CatalogError> {
        let state = self.state.read().await;
        Self::song_for(&state, None, song_id)
    }

    async fn get_library(&self) -> Result<Library, CatalogError> {
        Ok(self.state.read().await.library.clone())
    }

    async fn refresh(&self) -> Result<RefreshReport, CatalogError> {
        let library = match &self.path {
            Some(path) => {
                let json = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| CatalogError::Backend(format!("{}: {e}", path.display())))?;
                parse_library(&json)?
            }
            None => self.state.read().await.library.clone(),
        };

        let mut state = self.state.write().await;
        let changed = changed_artists(&state.library, &library);
        state.library = library.clone();
        tracing::info!(
            "Catalog refreshed: {} artists, {} songs, {} changed",
            library.artists.len(),
            library.songs.len(),
            changed.len()
        );

        Ok(RefreshReport {
            library,
            changed_artists: changed,
        })
    }

    async fn toggle_starred(&self, user_id: UserId, song_id: SongId) -> Result<Song, CatalogError> {
        let mut state = self.state.write().await;
        // 存在しない曲はお気に入りにできない
        Self::song_for(&state, Some(user_id), song_id)?;

        if !state.starred.remove(&(user_id, song_id)) {
            state.starred.insert((user_id, song_id));
        }
        Self::song_for(&state, Some(user_id), song_id)
    }

    async fn set_prefs(&self, prefs: Prefs) -> Result<Prefs, CatalogError> {
        let mut state = self.state.write().await;
        state.prefs.extend(prefs);
        Ok(state.prefs.clone())
    }
}
