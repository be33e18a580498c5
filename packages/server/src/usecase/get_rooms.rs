//! UseCase: ルーム一覧・詳細の取得（HTTP API 用）

use std::sync::Arc;

use crate::domain::{RepositoryError, RoomId, RoomRepository, RoomSnapshot};

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// Snapshots of every live room, ordered by room id
    pub async fn execute(&self) -> Vec<RoomSnapshot> {
        let mut room_ids = self.repository.room_ids().await;
        room_ids.sort();

        let mut snapshots = Vec::with_capacity(room_ids.len());
        for room_id in room_ids {
            // 列挙後に破棄されたルームは読み飛ばす
            if let Ok(snapshot) = self.repository.snapshot(&room_id).await {
                snapshots.push(snapshot);
            }
        }
        snapshots
    }

    pub async fn get(&self, room_id: &RoomId) -> Result<RoomSnapshot, RepositoryError> {
        self.repository.snapshot(room_id).await
    }

    pub async fn count(&self) -> usize {
        self.repository.room_ids().await.len()
    }
}
