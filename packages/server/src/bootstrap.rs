//! Dependency wiring.
//!
//! Repository → MessagePusher → UseCase → AppState → Server の順に組み立てる。

use std::{sync::Arc, time::Duration};

use karaoke_shared::time::Clock;
use tokio::sync::mpsc;

use crate::{
    domain::{Catalog, ConnectionId, IdentityResolver},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryConnectionTracker, InMemoryRoomRepository},
    },
    ui::{Server, state::AppState},
    usecase::{
        ConnectParticipantUseCase, ControlPlayerUseCase, DisconnectParticipantUseCase,
        DispatchActionUseCase, GetRoomsUseCase, JoinRoomUseCase, LibraryUseCase,
        ManageQueueUseCase, RoomAccess,
    },
};

/// Tunables that shape room behavior
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomSettings {
    pub eviction_grace: Duration,
    pub claim_requires_admin: bool,
}

/// Assemble a server around the given collaborators
pub fn build_server(
    settings: RoomSettings,
    identity_resolver: Arc<dyn IdentityResolver>,
    catalog: Arc<dyn Catalog>,
    clock: Arc<dyn Clock>,
) -> Server {
    let (state, faults) = build_state(settings, identity_resolver, catalog, clock);
    Server::new(state, faults)
}

/// Wire the shared state; the receiver yields connections whose transport failed
pub fn build_state(
    settings: RoomSettings,
    identity_resolver: Arc<dyn IdentityResolver>,
    catalog: Arc<dyn Catalog>,
    clock: Arc<dyn Clock>,
) -> (Arc<AppState>, mpsc::UnboundedReceiver<ConnectionId>) {
    // 1. Repository
    let repository = Arc::new(InMemoryRoomRepository::new(settings.eviction_grace));
    let tracker = Arc::new(InMemoryConnectionTracker::new());

    // 2. MessagePusher
    let (fault_tx, fault_rx) = mpsc::unbounded_channel();
    let message_pusher = Arc::new(WebSocketMessagePusher::new(fault_tx));

    // 3. UseCases
    let access = RoomAccess::new(repository.clone(), tracker.clone(), message_pusher.clone());
    let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
        tracker.clone(),
        message_pusher.clone(),
        identity_resolver,
        clock.clone(),
    ));
    let disconnect_participant_usecase =
        Arc::new(DisconnectParticipantUseCase::new(access.clone()));
    let library_usecase = Arc::new(LibraryUseCase::new(access.clone(), catalog.clone()));
    let dispatch_action_usecase = Arc::new(DispatchActionUseCase::new(
        Arc::new(JoinRoomUseCase::new(access.clone(), clock.clone())),
        Arc::new(ManageQueueUseCase::new(access.clone(), catalog, clock)),
        Arc::new(ControlPlayerUseCase::new(
            access.clone(),
            settings.claim_requires_admin,
        )),
        library_usecase.clone(),
        access,
    ));
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(repository));

    // 4. AppState
    let state = Arc::new(AppState {
        connect_participant_usecase,
        disconnect_participant_usecase,
        dispatch_action_usecase,
        get_rooms_usecase,
        library_usecase,
        tracker,
    });

    (state, fault_rx)
}
