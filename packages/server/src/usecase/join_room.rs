//! UseCase: ルーム参加・退出・再同期
//!
//! 参加が確定した時点のルーム状態をスナップショットとして本人にだけ送り、
//! 以降は差分のみを受け取る。スナップショットの送信はルームのガードを
//! 保持したまま行うため、参加直後の差分がスナップショットより先に届くことはない。

use std::sync::Arc;

use karaoke_shared::time::Clock;

use super::room_access::RoomAccess;
use crate::domain::{ConnectionId, Outbound, RoomError, RoomId, RoomSnapshot, Timestamp};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    access: RoomAccess,
    clock: Arc<dyn Clock>,
}

impl JoinRoomUseCase {
    pub fn new(access: RoomAccess, clock: Arc<dyn Clock>) -> Self {
        Self { access, clock }
    }

    /// Join `room_id`, leaving the connection's previous room first
    pub async fn execute(&self, connection_id: &ConnectionId, room_id: RoomId) -> Result<RoomSnapshot, RoomError> {
        let (connection, identity) = self.access.authenticated(connection_id).await?;

        if !identity.may_join(&room_id) {
            return Err(RoomError::Unauthorized(format!(
                "not allowed to join room '{room_id}'"
            )));
        }

        if let Some(previous) = connection.room_id.as_ref()
            && previous != &room_id
        {
            self.access.tracker().exit_room(connection_id).await;
            self.access.leave_room(connection_id, previous).await;
        }

        let now = Timestamp::new(self.clock.now_millis());
        let mut room = self.access.repository().lock_or_create(&room_id, now).await;
        room.join(connection_id.clone());

        // 切断処理と競合した場合は参加を取り消す
        if self
            .access
            .tracker()
            .enter_room(connection_id, room_id.clone(), now)
            .await
            .is_none()
        {
            room.leave(connection_id);
            let empty = room.is_empty();
            drop(room);
            if empty {
                self.access.repository().evict_if_empty(&room_id).await;
            }
            return Err(RoomError::Unauthenticated);
        }

        let snapshot = room.snapshot();
        self.access
            .send(connection_id, Outbound::Snapshot(snapshot.clone()))
            .await;
        drop(room);

        tracing::info!(
            "User {} joined room '{}' via '{}' ({} members)",
            identity.user_id,
            room_id,
            connection_id,
            snapshot.member_count
        );
        Ok(snapshot)
    }

    /// Replay the current room state to the connection
    pub async fn resync(&self, connection_id: &ConnectionId) -> Result<RoomSnapshot, RoomError> {
        let member = self.access.member(connection_id).await?;
        let room = self.access.lock_joined(&member).await?;

        let snapshot = room.snapshot();
        self.access
            .send(connection_id, Outbound::Snapshot(snapshot.clone()))
            .await;
        Ok(snapshot)
    }

    /// Leave the current room without disconnecting
    pub async fn leave(&self, connection_id: &ConnectionId) -> Result<Option<RoomId>, RoomError> {
        self.access.authenticated(connection_id).await?;

        let previous = self.access.tracker().exit_room(connection_id).await;
        if let Some(room_id) = &previous {
            self.access.leave_room(connection_id, room_id).await;
        }
        Ok(previous)
    }
}
