//! UseCase: 切断処理
//!
//! WebSocket の終了、または送信失敗（TransportFault）の通知から呼ばれる。
//! 同じ接続に対して複数回呼ばれても 2 回目以降は何もしない。

use super::room_access::RoomAccess;
use crate::domain::{ConnectionId, ConnectionRef};

/// 切断のユースケース
pub struct DisconnectParticipantUseCase {
    access: RoomAccess,
}

impl DisconnectParticipantUseCase {
    pub fn new(access: RoomAccess) -> Self {
        Self { access }
    }

    /// 切断を実行
    ///
    /// # Returns
    ///
    /// * `Some(ConnectionRef)` - 切断した接続の最終状態
    /// * `None` - 既に切断済み
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<ConnectionRef> {
        let connection = self.access.tracker().unregister(connection_id).await?;

        // 所属ルームからの削除とプレイヤー権限の解放は同じ排他区間で行われる
        if let Some(room_id) = &connection.room_id {
            self.access.leave_room(connection_id, room_id).await;
        }
        self.access.message_pusher().unregister_client(connection_id).await;

        tracing::info!("Connection '{}' closed", connection_id);
        Some(connection)
    }
}
