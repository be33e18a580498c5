//! UseCase: ライブラリ・お気に入り・サーバー設定
//!
//! ライブラリと設定の変更はルームに依存しないため、ルームに参加している
//! すべての接続へ配信する。お気に入りはユーザーごとの状態なので本人にだけ返す。

use std::sync::Arc;

use super::room_access::RoomAccess;
use crate::domain::{
    Catalog, ConnectionId, Identity, Library, Outbound, Prefs, RefreshReport, RoomError, RoomEvent,
    Song, SongId,
};

/// カタログ操作のユースケース
pub struct LibraryUseCase {
    access: RoomAccess,
    catalog: Arc<dyn Catalog>,
}

impl LibraryUseCase {
    pub fn new(access: RoomAccess, catalog: Arc<dyn Catalog>) -> Self {
        Self { access, catalog }
    }

    /// Current library, for clients that have not seen a refresh yet
    pub async fn library(&self) -> Result<Library, RoomError> {
        Ok(self.catalog.get_library().await?)
    }

    /// Rescan the provider (admins only) and fan out the new library
    pub async fn refresh(&self, connection_id: &ConnectionId) -> Result<RefreshReport, RoomError> {
        let identity = self.admin(connection_id).await?;

        let report = self.catalog.refresh().await?;
        tracing::info!(
            "Library refreshed by user {}: {} artists, {} songs, {} changed",
            identity.user_id,
            report.library.artists.len(),
            report.library.songs.len(),
            report.changed_artists.len()
        );

        let mut events = vec![RoomEvent::LibraryUpdate(report.library.clone())];
        events.extend(report.changed_artists.iter().cloned().map(RoomEvent::ArtistUpdate));
        self.broadcast_all(events).await;
        Ok(report)
    }

    /// Flip the caller's star on a song; only the caller sees the update
    pub async fn toggle_starred(&self, connection_id: &ConnectionId, song_id: SongId) -> Result<Song, RoomError> {
        let (_, identity) = self.access.authenticated(connection_id).await?;

        let song = self.catalog.toggle_starred(identity.user_id, song_id).await?;
        self.access
            .send(connection_id, Outbound::Direct(RoomEvent::SongUpdate(song.clone())))
            .await;
        Ok(song)
    }

    /// Merge server preferences (admins only)
    pub async fn set_prefs(&self, connection_id: &ConnectionId, prefs: Prefs) -> Result<Prefs, RoomError> {
        self.admin(connection_id).await?;

        let stored = self.catalog.set_prefs(prefs).await?;
        self.broadcast_all(vec![RoomEvent::PrefsChange(stored.clone())])
            .await;
        Ok(stored)
    }

    async fn admin(&self, connection_id: &ConnectionId) -> Result<Identity, RoomError> {
        let (connection, identity) = self.access.authenticated(connection_id).await?;
        if !connection.is_admin() {
            return Err(RoomError::Unauthorized("admin only".to_string()));
        }
        Ok(identity)
    }

    async fn broadcast_all(&self, events: Vec<RoomEvent>) {
        let recipients = self.access.tracker().joined_connection_ids().await;
        if recipients.is_empty() {
            return;
        }

        for event in events {
            let message = Outbound::Broadcast(event);
            if let Err(e) = self
                .access
                .message_pusher()
                .broadcast(&recipients, &message)
                .await
            {
                tracing::warn!("Failed to broadcast library change: {}", e);
            }
        }
    }
}
