//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::ConnectionTracker,
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, DispatchActionUseCase,
        GetRoomsUseCase, LibraryUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（接続受付のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// DispatchActionUseCase（クライアントアクションの振り分け）
    pub dispatch_action_usecase: Arc<DispatchActionUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// LibraryUseCase（ライブラリ取得）
    pub library_usecase: Arc<LibraryUseCase>,
    /// ConnectionTracker（ヘルスチェック用の接続数）
    pub tracker: Arc<dyn ConnectionTracker>,
}
