//! InMemory Room Registry 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! `HashMap<RoomId, Arc<Mutex<RoomState>>>` をインメモリのレジストリとして使用する。
//!
//! ## 排他制御
//!
//! - マップ全体の `RwLock` は参照の取得・追加・削除の間だけ保持する
//! - ルームごとの `Mutex` がそのルームの排他区間となる
//! - ロック順序は常に「マップ -> ルーム」

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{
    RepositoryError, RoomGuard, RoomId, RoomRepository, RoomSnapshot, RoomState, Timestamp,
};

type RoomMap = RwLock<HashMap<RoomId, Arc<Mutex<RoomState>>>>;

/// インメモリ Room Registry 実装
pub struct InMemoryRoomRepository {
    rooms: Arc<RoomMap>,
    /// How long an empty room survives before being discarded
    eviction_grace: Duration,
}

impl InMemoryRoomRepository {
    pub fn new(eviction_grace: Duration) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            eviction_grace,
        }
    }

    async fn find(&self, room_id: &RoomId) -> Option<Arc<Mutex<RoomState>>> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Remove the room if it is still empty and nobody joined since `epoch`
    async fn evict(rooms: &RoomMap, room_id: &RoomId, epoch: u64) -> bool {
        let mut map = rooms.write().await;
        let Some(room) = map.get(room_id).cloned() else {
            return false;
        };

        let mut state = room.lock().await;
        if !state.is_empty() || state.epoch() != epoch {
            return false;
        }

        state.close();
        map.remove(room_id);
        true
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn lock_or_create(&self, room_id: &RoomId, now: Timestamp) -> RoomGuard {
        loop {
            let room = match self.find(room_id).await {
                Some(room) => room,
                None => {
                    let mut map = self.rooms.write().await;
                    map.entry(room_id.clone())
                        .or_insert_with(|| {
                            tracing::info!("Room '{}' created", room_id);
                            Arc::new(Mutex::new(RoomState::new(room_id.clone(), now)))
                        })
                        .clone()
                }
            };

            let guard = room.lock_owned().await;
            // 取得待ちの間に破棄されたルームは作り直す
            if !guard.is_closed() {
                return guard;
            }
        }
    }

    async fn lock(&self, room_id: &RoomId) -> Result<RoomGuard, RepositoryError> {
        let room = self
            .find(room_id)
            .await
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.clone()))?;

        let guard = room.lock_owned().await;
        if guard.is_closed() {
            return Err(RepositoryError::RoomNotFound(room_id.clone()));
        }
        Ok(guard)
    }

    async fn evict_if_empty(&self, room_id: &RoomId) {
        let epoch = match self.lock(room_id).await {
            Ok(guard) if guard.is_empty() => guard.epoch(),
            _ => return,
        };

        if self.eviction_grace.is_zero() {
            if Self::evict(&self.rooms, room_id, epoch).await {
                tracing::info!("Room '{}' evicted", room_id);
            }
            return;
        }

        let rooms = Arc::clone(&self.rooms);
        let room_id = room_id.clone();
        let grace = self.eviction_grace;
        tracing::debug!("Room '{}' is empty; evicting in {:?}", room_id, grace);
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if Self::evict(&rooms, &room_id, epoch).await {
                tracing::info!("Room '{}' evicted after grace period", room_id);
            } else {
                tracing::debug!("Eviction of room '{}' cancelled", room_id);
            }
        });
    }

    async fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn snapshot(&self, room_id: &RoomId) -> Result<RoomSnapshot, RepositoryError> {
        let guard = self.lock(room_id).await?;
        Ok(guard.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConnectionId;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - ルームの遅延生成と取得
    // - 空になったルームの破棄（猶予なし / 猶予あり）
    // - 猶予期間中の再参加による破棄の取り消し
    // ========================================

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_lock_or_create_creates_room_once() {
        // テスト項目: 初回アクセスでルームが生成され、2 回目以降は同じルームが返る
        // given (前提条件):
        let repo = InMemoryRoomRepository::new(Duration::ZERO);

        // when (操作):
        {
            let mut guard = repo.lock_or_create(&room("r1"), Timestamp::new(10)).await;
            guard.join(conn("a"));
        }
        let guard = repo.lock_or_create(&room("r1"), Timestamp::new(20)).await;

        // then (期待する結果):
        assert_eq!(guard.created_at(), Timestamp::new(10));
        assert!(guard.is_member(&conn("a")));
        drop(guard);
        assert_eq!(repo.room_ids().await, vec![room("r1")]);
    }

    #[tokio::test]
    async fn test_lock_missing_room_fails() {
        // テスト項目: 存在しないルームのロックは RoomNotFound になる
        // given (前提条件):
        let repo = InMemoryRoomRepository::new(Duration::ZERO);

        // when (操作):
        let result = repo.lock(&room("ghost")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_room_is_evicted_immediately_without_grace() {
        // テスト項目: 猶予 0 の場合、空のルームは即座に破棄される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new(Duration::ZERO);
        {
            let mut guard = repo.lock_or_create(&room("r1"), Timestamp::new(0)).await;
            guard.join(conn("a"));
            guard.leave(&conn("a"));
        }

        // when (操作):
        repo.evict_if_empty(&room("r1")).await;

        // then (期待する結果):
        assert!(repo.room_ids().await.is_empty());
        assert!(repo.snapshot(&room("r1")).await.is_err());
    }

    #[tokio::test]
    async fn test_occupied_room_is_not_evicted() {
        // テスト項目: メンバーがいるルームは破棄されない
        // given (前提条件):
        let repo = InMemoryRoomRepository::new(Duration::ZERO);
        {
            let mut guard = repo.lock_or_create(&room("r1"), Timestamp::new(0)).await;
            guard.join(conn("a"));
        }

        // when (操作):
        repo.evict_if_empty(&room("r1")).await;

        // then (期待する結果):
        assert_eq!(repo.room_ids().await.len(), 1);
    }

    #[tokio::test]
    async fn test_rejoin_within_grace_keeps_queue() {
        // テスト項目: 猶予期間内に再参加すると破棄が取り消され、状態が保持される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new(Duration::from_millis(50));
        {
            let mut guard = repo.lock_or_create(&room("r1"), Timestamp::new(0)).await;
            guard.join(conn("a"));
            guard.leave(&conn("a"));
        }
        repo.evict_if_empty(&room("r1")).await;

        // when (操作): 猶予期間内に再参加し、その後猶予を過ぎるまで待つ
        {
            let mut guard = repo.lock_or_create(&room("r1"), Timestamp::new(5)).await;
            guard.join(conn("b"));
            guard.leave(&conn("b"));
        }
        tokio::time::sleep(Duration::from_millis(150)).await;

        // then (期待する結果): 最初の破棄予約は無効になっている
        let snapshot = repo.snapshot(&room("r1")).await.unwrap();
        assert_eq!(snapshot.created_at, Timestamp::new(0));
    }

    #[tokio::test]
    async fn test_room_is_evicted_after_grace() {
        // テスト項目: 猶予期間内に再参加がなければルームは破棄される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new(Duration::from_millis(30));
        {
            let mut guard = repo.lock_or_create(&room("r1"), Timestamp::new(0)).await;
            guard.join(conn("a"));
            guard.leave(&conn("a"));
        }

        // when (操作):
        repo.evict_if_empty(&room("r1")).await;
        let before = repo.room_ids().await.len();
        tokio::time::sleep(Duration::from_millis(120)).await;

        // then (期待する結果):
        assert_eq!(before, 1);
        assert!(repo.room_ids().await.is_empty());
    }
}
