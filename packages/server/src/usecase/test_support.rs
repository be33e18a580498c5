//! Shared fixtures for use case tests.

use std::{sync::Arc, time::Duration};

use karaoke_shared::time::FixedClock;
use tokio::sync::mpsc;

use super::{
    ControlPlayerUseCase, DisconnectParticipantUseCase, DispatchActionUseCase, JoinRoomUseCase,
    LibraryUseCase, ManageQueueUseCase, room_access::RoomAccess,
};
use crate::{
    domain::{
        Catalog, ConnectionId, ConnectionRef, ConnectionTracker, Identity, IdentityContext,
        MessagePusher, RoomId, RoomSnapshot, Timestamp, UserId,
    },
    infrastructure::{
        catalog::JsonFileCatalog,
        dto::websocket::ServerEnvelope,
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryConnectionTracker, InMemoryRoomRepository},
    },
};

pub const CATALOG: &str = r#"{
    "artists": [{"artistId": 1, "name": "The Band"}],
    "songs": [
        {"songId": 1, "artistId": 1, "title": "Opener", "duration": 200},
        {"songId": 2, "artistId": 1, "title": "Middle", "duration": 210},
        {"songId": 3, "artistId": 1, "title": "Closer", "duration": 220}
    ]
}"#;

pub fn room(id: &str) -> RoomId {
    RoomId::new(id.to_string()).unwrap()
}

/// Decode every frame received so far
pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<ServerEnvelope> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(ServerEnvelope::parse(&frame).unwrap());
    }
    frames
}

pub struct Harness {
    pub repository: Arc<InMemoryRoomRepository>,
    pub tracker: Arc<InMemoryConnectionTracker>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub catalog: Arc<dyn Catalog>,
    pub clock: Arc<FixedClock>,
    pub access: RoomAccess,
    pub claim_requires_admin: bool,
    _faults: mpsc::UnboundedReceiver<ConnectionId>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_catalog(Arc::new(JsonFileCatalog::from_json(CATALOG).unwrap()))
    }

    pub fn with_catalog(catalog: Arc<dyn Catalog>) -> Self {
        let repository = Arc::new(InMemoryRoomRepository::new(Duration::ZERO));
        let tracker = Arc::new(InMemoryConnectionTracker::new());
        let (fault_tx, fault_rx) = mpsc::unbounded_channel();
        let pusher = Arc::new(WebSocketMessagePusher::new(fault_tx));
        let access = RoomAccess::new(repository.clone(), tracker.clone(), pusher.clone());

        Self {
            repository,
            tracker,
            pusher,
            catalog,
            clock: Arc::new(FixedClock::new(1_000)),
            access,
            claim_requires_admin: false,
            _faults: fault_rx,
        }
    }

    async fn register(&self, identity: IdentityContext) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let connection = ConnectionRef::new(ConnectionId::generate(), identity, Timestamp::new(0));
        let connection_id = connection.connection_id.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        self.tracker.register(connection).await;
        self.pusher.register_client(connection_id.clone(), tx).await;
        (connection_id, rx)
    }

    pub async fn connect(&self, user_id: i64, name: &str, is_admin: bool) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        self.register(IdentityContext::Authenticated(Identity {
            user_id: UserId::new(user_id),
            display_name: name.to_string(),
            is_admin,
            room_id: None,
        }))
        .await
    }

    pub async fn connect_bound(&self, user_id: i64, name: &str, room_id: &str) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        self.register(IdentityContext::Authenticated(Identity {
            user_id: UserId::new(user_id),
            display_name: name.to_string(),
            is_admin: false,
            room_id: Some(room(room_id)),
        }))
        .await
    }

    pub async fn connect_anonymous(&self) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        self.register(IdentityContext::Anonymous).await
    }

    pub async fn join(&self, connection_id: &ConnectionId, room_id: &str) -> RoomSnapshot {
        self.join_usecase()
            .execute(connection_id, room(room_id))
            .await
            .unwrap()
    }

    pub async fn tracker_get(&self, connection_id: &ConnectionId) -> ConnectionRef {
        self.tracker.get(connection_id).await.unwrap()
    }

    pub fn join_usecase(&self) -> JoinRoomUseCase {
        JoinRoomUseCase::new(self.access.clone(), self.clock.clone())
    }

    pub fn queue_usecase(&self) -> ManageQueueUseCase {
        ManageQueueUseCase::new(self.access.clone(), self.catalog.clone(), self.clock.clone())
    }

    pub fn player_usecase(&self) -> ControlPlayerUseCase {
        ControlPlayerUseCase::new(self.access.clone(), self.claim_requires_admin)
    }

    pub fn library_usecase(&self) -> LibraryUseCase {
        LibraryUseCase::new(self.access.clone(), self.catalog.clone())
    }

    pub fn disconnect_usecase(&self) -> DisconnectParticipantUseCase {
        DisconnectParticipantUseCase::new(self.access.clone())
    }

    pub fn dispatcher(&self) -> DispatchActionUseCase {
        DispatchActionUseCase::new(
            Arc::new(self.join_usecase()),
            Arc::new(self.queue_usecase()),
            Arc::new(self.player_usecase()),
            Arc::new(self.library_usecase()),
            self.access.clone(),
        )
    }
}
