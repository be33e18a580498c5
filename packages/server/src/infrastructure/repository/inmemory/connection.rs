//! InMemory Connection Tracker 実装

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{ConnectionId, ConnectionRef, ConnectionTracker, RoomId, Timestamp};

/// 接続中のクライアントとその所属ルームを保持する
#[derive(Default)]
pub struct InMemoryConnectionTracker {
    connections: RwLock<HashMap<ConnectionId, ConnectionRef>>,
}

impl InMemoryConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionTracker for InMemoryConnectionTracker {
    async fn register(&self, connection: ConnectionRef) {
        tracing::debug!("Connection '{}' tracked", connection.connection_id);
        self.connections
            .write()
            .await
            .insert(connection.connection_id.clone(), connection);
    }

    async fn unregister(&self, connection_id: &ConnectionId) -> Option<ConnectionRef> {
        self.connections.write().await.remove(connection_id)
    }

    async fn get(&self, connection_id: &ConnectionId) -> Option<ConnectionRef> {
        self.connections.read().await.get(connection_id).cloned()
    }

    async fn enter_room(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        joined_at: Timestamp,
    ) -> Option<ConnectionRef> {
        let mut connections = self.connections.write().await;
        let connection = connections.get_mut(connection_id)?;
        connection.room_id = Some(room_id);
        connection.joined_at = Some(joined_at);
        Some(connection.clone())
    }

    async fn exit_room(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        let mut connections = self.connections.write().await;
        let connection = connections.get_mut(connection_id)?;
        connection.joined_at = None;
        connection.room_id.take()
    }

    async fn joined_connection_ids(&self) -> Vec<ConnectionId> {
        self.connections
            .read()
            .await
            .values()
            .filter(|connection| connection.room_id.is_some())
            .map(|connection| connection.connection_id.clone())
            .collect()
    }

    async fn count(&self) -> usize {
        self.connections.read().await.len()
    }
}
