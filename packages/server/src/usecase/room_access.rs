//! Room-scoped plumbing shared by the use cases.
//!
//! 接続の認証確認、所属ルームの排他区間の取得、差分の配信をまとめる。
//! 差分の配信はルームのガードを保持したまま行い、ルームごとの配信順序を
//! 状態遷移の順序と一致させる。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionRef, ConnectionTracker, Identity, MessagePusher, Outbound, RoomError,
    RoomEvent, RoomGuard, RoomId, RoomRepository,
};

/// An authenticated connection that has joined a room
#[derive(Debug, Clone)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub identity: Identity,
    pub room_id: RoomId,
}

#[derive(Clone)]
pub struct RoomAccess {
    repository: Arc<dyn RoomRepository>,
    tracker: Arc<dyn ConnectionTracker>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RoomAccess {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        tracker: Arc<dyn ConnectionTracker>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            tracker,
            message_pusher,
        }
    }

    pub fn repository(&self) -> &Arc<dyn RoomRepository> {
        &self.repository
    }

    pub fn tracker(&self) -> &Arc<dyn ConnectionTracker> {
        &self.tracker
    }

    pub fn message_pusher(&self) -> &Arc<dyn MessagePusher> {
        &self.message_pusher
    }

    /// The tracked connection and its identity; anonymous connections are rejected
    pub async fn authenticated(&self, connection_id: &ConnectionId) -> Result<(ConnectionRef, Identity), RoomError> {
        let connection = self
            .tracker
            .get(connection_id)
            .await
            .ok_or(RoomError::Unauthenticated)?;

        let identity = connection
            .identity()
            .cloned()
            .ok_or(RoomError::Unauthenticated)?;

        Ok((connection, identity))
    }

    /// Identity and room of a joined connection, without locking the room
    pub async fn member(&self, connection_id: &ConnectionId) -> Result<Member, RoomError> {
        let (connection, identity) = self.authenticated(connection_id).await?;
        let room_id = connection.room_id.ok_or(RoomError::RoomNotFound(None))?;

        Ok(Member {
            connection_id: connection.connection_id,
            identity,
            room_id,
        })
    }

    /// Enter the critical section of the member's room
    pub async fn lock_joined(&self, member: &Member) -> Result<RoomGuard, RoomError> {
        let guard = match self.repository.lock(&member.room_id).await {
            Ok(guard) => guard,
            Err(e) => {
                // ルームが破棄済みなら所属を解除し、再参加を促す
                self.forget_room(&member.connection_id).await;
                return Err(e.into());
            }
        };

        if !guard.is_member(&member.connection_id) {
            drop(guard);
            self.forget_room(&member.connection_id).await;
            return Err(RoomError::RoomNotFound(Some(member.room_id.clone())));
        }

        Ok(guard)
    }

    /// Fan out deltas to every member of the locked room
    pub async fn publish(&self, room: &RoomGuard, events: Vec<RoomEvent>) {
        if events.is_empty() {
            return;
        }

        let members = room.member_ids();
        for event in events {
            let message = Outbound::Broadcast(event);
            if let Err(e) = self.message_pusher.broadcast(&members, &message).await {
                tracing::warn!("Failed to broadcast to room '{}': {}", room.id(), e);
            }
        }
    }

    /// Send a message to one connection, logging failures
    pub async fn send(&self, connection_id: &ConnectionId, message: Outbound) {
        if let Err(e) = self.message_pusher.push_to(connection_id, &message).await {
            tracing::warn!("Failed to push to '{}': {}", connection_id, e);
        }
    }

    /// Remove a connection from a room, releasing player authority in the same pass
    pub async fn leave_room(&self, connection_id: &ConnectionId, room_id: &RoomId) {
        let Ok(mut room) = self.repository.lock(room_id).await else {
            return;
        };

        let events = room.leave(connection_id);
        let empty = room.is_empty();
        self.publish(&room, events).await;
        drop(room);

        tracing::info!("Connection '{}' left room '{}'", connection_id, room_id);
        if empty {
            self.repository.evict_if_empty(room_id).await;
        }
    }

    async fn forget_room(&self, connection_id: &ConnectionId) {
        self.tracker.exit_room(connection_id).await;
    }
}
