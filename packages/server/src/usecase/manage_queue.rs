//! UseCase: キュー操作（追加・削除）
//!
//! 曲情報の取得はルームの排他区間に入る前に行う。取得に失敗してもキューの
//! 更新は止めず、エントリは曲 ID のみで登録される。

use std::sync::Arc;

use karaoke_shared::time::Clock;

use super::room_access::RoomAccess;
use crate::domain::{
    Catalog, ConnectionId, EnqueueRequest, QueueEntry, QueueId, Requester, RoomError, SongId,
    SongMeta, Timestamp,
};

/// キュー操作のユースケース
pub struct ManageQueueUseCase {
    access: RoomAccess,
    catalog: Arc<dyn Catalog>,
    clock: Arc<dyn Clock>,
}

impl ManageQueueUseCase {
    pub fn new(access: RoomAccess, catalog: Arc<dyn Catalog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            access,
            catalog,
            clock,
        }
    }

    /// Add a song at the fairness position and broadcast the insertion
    pub async fn add(&self, connection_id: &ConnectionId, song_id: SongId) -> Result<QueueEntry, RoomError> {
        let member = self.access.member(connection_id).await?;

        let song = match self.catalog.get_song(song_id).await {
            Ok(song) => Some(SongMeta::from(&song)),
            Err(e) => {
                tracing::warn!("Catalog lookup for song {} failed: {}", song_id, e);
                None
            }
        };

        let request = EnqueueRequest {
            song_id,
            user_id: member.identity.user_id,
            user_display_name: member.identity.display_name.clone(),
            song,
        };

        let mut room = self.access.lock_joined(&member).await?;
        let (entry, events) = room.enqueue(request, Timestamp::new(self.clock.now_millis()));
        self.access.publish(&room, events).await;

        tracing::info!(
            "Queued song {} as #{} in room '{}' for user {}",
            song_id,
            entry.queue_id,
            member.room_id,
            member.identity.user_id
        );
        Ok(entry)
    }

    /// Remove an entry owned by the requester (any entry, for admins)
    pub async fn remove(&self, connection_id: &ConnectionId, queue_id: QueueId) -> Result<QueueEntry, RoomError> {
        let member = self.access.member(connection_id).await?;
        let requester = Requester {
            user_id: member.identity.user_id,
            is_admin: member.identity.is_admin,
        };

        let mut room = self.access.lock_joined(&member).await?;
        let (removed, events) = room.remove(queue_id, requester)?;
        self.access.publish(&room, events).await;

        tracing::info!("Removed #{} from room '{}'", queue_id, member.room_id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{CatalogError, MockCatalog, RoomRepository},
        infrastructure::dto::websocket::{QueueDeltaDto, ServerAction},
        usecase::test_support::{Harness, drain, room},
    };

    #[tokio::test]
    async fn test_add_broadcasts_to_all_members() {
        // テスト項目: 追加は参加者全員に QUEUE_UPDATE として配信される
        // given (前提条件):
        let harness = Harness::new();
        let (alice, mut alice_rx) = harness.connect(1, "Alice", false).await;
        let (bob, mut bob_rx) = harness.connect(2, "Bob", false).await;
        harness.join(&alice, "r1").await;
        harness.join(&bob, "r1").await;
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // when (操作):
        let entry = harness.queue_usecase().add(&alice, SongId::new(1)).await.unwrap();

        // then (期待する結果):
        assert_eq!(entry.user_display_name, "Alice");
        assert_eq!(entry.song.as_ref().unwrap().title, "Opener");
        for frames in [drain(&mut alice_rx), drain(&mut bob_rx)] {
            assert_eq!(frames.len(), 2);
            assert!(matches!(
                &frames[0].action,
                ServerAction::QueueUpdate { delta: QueueDeltaDto::Added { entry: dto, index: 0 } }
                    if dto.queue_id == entry.queue_id.value()
            ));
            assert!(matches!(
                &frames[1].action,
                ServerAction::QueueUpNext { entry: Some(dto) } if dto.queue_id == entry.queue_id.value()
            ));
        }
    }

    #[tokio::test]
    async fn test_add_applies_round_robin_order() {
        // テスト項目: U1 が S1,S2、U2 が S3 を追加すると S1, S3, S2 の順になる
        // given (前提条件):
        let harness = Harness::new();
        let (u1, _rx1) = harness.connect(1, "U1", false).await;
        let (u2, _rx2) = harness.connect(2, "U2", false).await;
        harness.join(&u1, "r1").await;
        harness.join(&u2, "r1").await;
        let queue = harness.queue_usecase();

        // when (操作):
        queue.add(&u1, SongId::new(1)).await.unwrap();
        queue.add(&u1, SongId::new(2)).await.unwrap();
        queue.add(&u2, SongId::new(3)).await.unwrap();

        // then (期待する結果):
        let snapshot = harness.repository.snapshot(&room("r1")).await.unwrap();
        let songs: Vec<i64> = snapshot.queue.iter().map(|e| e.song_id.value()).collect();
        assert_eq!(songs, vec![1, 3, 2]);
    }

    #[tokio::test]
    async fn test_add_degrades_when_catalog_fails() {
        // テスト項目: カタログ障害時も曲 ID のみのエントリとして追加される
        // given (前提条件):
        let mut catalog = MockCatalog::new();
        catalog
            .expect_get_song()
            .returning(|_| Err(CatalogError::Backend("offline".to_string())));
        let harness = Harness::with_catalog(Arc::new(catalog));
        let (alice, _rx) = harness.connect(1, "Alice", false).await;
        harness.join(&alice, "r1").await;

        // when (操作):
        let entry = harness.queue_usecase().add(&alice, SongId::new(77)).await.unwrap();

        // then (期待する結果):
        assert_eq!(entry.song_id, SongId::new(77));
        assert!(entry.song.is_none());
    }

    #[tokio::test]
    async fn test_add_without_room_fails() {
        // テスト項目: ルーム未参加の追加は RoomNotFound になる
        // given (前提条件):
        let harness = Harness::new();
        let (alice, _rx) = harness.connect(1, "Alice", false).await;

        // when (操作):
        let result = harness.queue_usecase().add(&alice, SongId::new(1)).await;

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::RoomNotFound(None)));
    }

    #[tokio::test]
    async fn test_remove_by_non_owner_is_rejected() {
        // テスト項目: 所有者でも管理者でもない削除は Unauthorized で、キューは変化しない
        // given (前提条件):
        let harness = Harness::new();
        let (alice, _a) = harness.connect(1, "Alice", false).await;
        let (bob, mut bob_rx) = harness.connect(2, "Bob", false).await;
        harness.join(&alice, "r1").await;
        harness.join(&bob, "r1").await;
        let entry = harness.queue_usecase().add(&alice, SongId::new(1)).await.unwrap();
        drain(&mut bob_rx);

        // when (操作):
        let result = harness.queue_usecase().remove(&bob, entry.queue_id).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RoomError::Unauthorized(_))));
        assert!(drain(&mut bob_rx).is_empty());
        let snapshot = harness.repository.snapshot(&room("r1")).await.unwrap();
        assert_eq!(snapshot.queue.len(), 1);
    }

    #[tokio::test]
    async fn test_admin_may_remove_any_entry() {
        // テスト項目: 管理者は他人のエントリを削除できる
        // given (前提条件):
        let harness = Harness::new();
        let (alice, _a) = harness.connect(1, "Alice", false).await;
        let (admin, _b) = harness.connect(9, "Admin", true).await;
        harness.join(&alice, "r1").await;
        harness.join(&admin, "r1").await;
        let entry = harness.queue_usecase().add(&alice, SongId::new(1)).await.unwrap();

        // when (操作):
        let removed = harness.queue_usecase().remove(&admin, entry.queue_id).await;

        // then (期待する結果):
        assert_eq!(removed.unwrap().queue_id, entry.queue_id);
    }

    #[tokio::test]
    async fn test_remove_unknown_entry_is_not_found() {
        // テスト項目: 存在しない queueId の削除は NotFound になる
        // given (前提条件):
        let harness = Harness::new();
        let (alice, _a) = harness.connect(1, "Alice", false).await;
        harness.join(&alice, "r1").await;

        // when (操作):
        let result = harness.queue_usecase().remove(&alice, QueueId::new(42)).await;

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::NotFound(QueueId::new(42))));
    }
}
