//! UseCase: プレイヤー権限と再生操作
//!
//! claim / release と、権限を持つ接続からの再生操作を扱う。
//! 遷移はすべてルームの排他区間内で行い、差分は同じ区間内で配信する。

use super::room_access::RoomAccess;
use crate::domain::{
    ConnectionId, PlaybackStatus, PlayerState, QueueId, RoomError, RoomState, Transition,
};

/// プレイヤー操作のユースケース
pub struct ControlPlayerUseCase {
    access: RoomAccess,
    /// Only admins may claim player authority
    claim_requires_admin: bool,
}

impl ControlPlayerUseCase {
    pub fn new(access: RoomAccess, claim_requires_admin: bool) -> Self {
        Self {
            access,
            claim_requires_admin,
        }
    }

    pub async fn claim(&self, connection_id: &ConnectionId) -> Result<PlayerState, RoomError> {
        let member = self.access.member(connection_id).await?;
        if self.claim_requires_admin && !member.identity.is_admin {
            return Err(RoomError::Unauthorized(
                "only admins may claim the player".to_string(),
            ));
        }

        let state = self.apply(connection_id, |room, id| room.claim(id)).await?;
        tracing::info!("Connection '{}' claimed the player of room '{}'", connection_id, member.room_id);
        Ok(state)
    }

    pub async fn release(&self, connection_id: &ConnectionId) -> Result<PlayerState, RoomError> {
        self.apply(connection_id, |room, id| room.release(id)).await
    }

    /// Fails with `QueueEmpty` when there is nothing to play
    pub async fn play(&self, connection_id: &ConnectionId) -> Result<PlayerState, RoomError> {
        self.apply(connection_id, |room, id| room.request_play(id)).await
    }

    pub async fn pause(&self, connection_id: &ConnectionId) -> Result<PlayerState, RoomError> {
        self.apply(connection_id, |room, id| room.request_pause(id)).await
    }

    pub async fn next(&self, connection_id: &ConnectionId) -> Result<PlayerState, RoomError> {
        self.apply(connection_id, |room, id| room.request_next(id)).await
    }

    pub async fn volume(&self, connection_id: &ConnectionId, level: i64) -> Result<PlayerState, RoomError> {
        self.apply(connection_id, |room, id| room.request_volume(id, level)).await
    }

    pub async fn media_ended(&self, connection_id: &ConnectionId, queue_id: QueueId) -> Result<PlayerState, RoomError> {
        self.apply(connection_id, |room, id| room.notify_media_ended(id, queue_id))
            .await
    }

    pub async fn report_status(
        &self,
        connection_id: &ConnectionId,
        status: PlaybackStatus,
    ) -> Result<PlayerState, RoomError> {
        self.apply(connection_id, |room, id| room.report_status(id, status))
            .await
    }

    pub async fn report_error(&self, connection_id: &ConnectionId, message: String) -> Result<PlayerState, RoomError> {
        self.apply(connection_id, |room, id| room.report_error(id, message))
            .await
    }

    /// Run one transition inside the room's critical section and broadcast its deltas
    async fn apply<F>(&self, connection_id: &ConnectionId, transition: F) -> Result<PlayerState, RoomError>
    where
        F: FnOnce(&mut RoomState, &ConnectionId) -> Transition + Send,
    {
        let member = self.access.member(connection_id).await?;
        let mut room = self.access.lock_joined(&member).await?;

        let events = transition(&mut room, connection_id)?;
        tracing::debug!(
            "Player transition in room '{}' produced {} events",
            member.room_id,
            events.len()
        );
        self.access.publish(&room, events).await;
        Ok(room.player().state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{PlayerStatus, RoomRepository, SongId},
        infrastructure::dto::websocket::{AudienceDto, QueueDeltaDto, ServerAction},
        usecase::test_support::{Harness, drain, room},
    };

    #[tokio::test]
    async fn test_playback_scenario_through_queue_end() {
        // テスト項目: claim → play → 再生終了 → 削除 → next で QUEUE_END が配信されるまで
        // given (前提条件):
        let harness = Harness::new();
        let (u1, mut rx1) = harness.connect(1, "U1", false).await;
        let (u2, _rx2) = harness.connect(2, "U2", false).await;
        harness.join(&u1, "r1").await;
        harness.join(&u2, "r1").await;
        let queue = harness.queue_usecase();
        let s1 = queue.add(&u1, SongId::new(1)).await.unwrap();
        let s2 = queue.add(&u1, SongId::new(2)).await.unwrap();
        let s3 = queue.add(&u2, SongId::new(3)).await.unwrap();
        let player = harness.player_usecase();

        // when (操作):
        player.claim(&u1).await.unwrap();
        let playing = player.play(&u1).await.unwrap();
        let after_end = player.media_ended(&u1, s1.queue_id).await.unwrap();
        queue.remove(&u1, s2.queue_id).await.unwrap();
        drain(&mut rx1);
        let stopped = player.next(&u1).await.unwrap();

        // then (期待する結果):
        assert_eq!(playing.current_queue_id, Some(s1.queue_id));
        assert_eq!(playing.status, PlayerStatus::Playing);
        assert_eq!(after_end.current_queue_id, Some(s3.queue_id));
        assert_eq!(after_end.status, PlayerStatus::Playing);
        assert_eq!(stopped.status, PlayerStatus::Stopped);
        assert_eq!(stopped.current_queue_id, None);

        let frames = drain(&mut rx1);
        let actions: Vec<&ServerAction> = frames.iter().map(|f| &f.action).collect();
        assert_eq!(
            actions,
            vec![
                &ServerAction::PlayerNext { queue_id: None },
                &ServerAction::QueueEnd
            ]
        );
        assert_eq!(frames[0].audience, AudienceDto::Player);
    }

    #[tokio::test]
    async fn test_play_broadcasts_advance_and_play() {
        // テスト項目: 最初の play でキューの先頭が再生中になり、差分が配信される
        // given (前提条件):
        let harness = Harness::new();
        let (u1, mut rx1) = harness.connect(1, "U1", false).await;
        harness.join(&u1, "r1").await;
        let s1 = harness.queue_usecase().add(&u1, SongId::new(1)).await.unwrap();
        harness.player_usecase().claim(&u1).await.unwrap();
        drain(&mut rx1);

        // when (操作):
        harness.player_usecase().play(&u1).await.unwrap();

        // then (期待する結果):
        let frames = drain(&mut rx1);
        assert_eq!(
            frames[0].action,
            ServerAction::QueueUpdate {
                delta: QueueDeltaDto::Advanced {
                    queue_id: s1.queue_id.value()
                }
            }
        );
        assert_eq!(
            frames[1].action,
            ServerAction::PlayerPlay {
                queue_id: s1.queue_id.value()
            }
        );
        let snapshot = harness.repository.snapshot(&room("r1")).await.unwrap();
        assert!(snapshot.queue.is_empty());
        assert_eq!(snapshot.now_playing.unwrap().queue_id, s1.queue_id);
    }

    #[tokio::test]
    async fn test_play_on_empty_queue_reports_queue_empty() {
        // テスト項目: キューが空のとき play は QueueEmpty を返し STOPPED のまま
        // given (前提条件):
        let harness = Harness::new();
        let (u1, _rx) = harness.connect(1, "U1", false).await;
        harness.join(&u1, "r1").await;
        harness.player_usecase().claim(&u1).await.unwrap();

        // when (操作):
        let result = harness.player_usecase().play(&u1).await;

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::QueueEmpty));
        let snapshot = harness.repository.snapshot(&room("r1")).await.unwrap();
        assert_eq!(snapshot.player.status, PlayerStatus::Stopped);
    }

    #[tokio::test]
    async fn test_non_holder_cannot_drive_transport() {
        // テスト項目: 権限を持たない接続の再生操作は Unauthorized になる
        // given (前提条件):
        let harness = Harness::new();
        let (u1, _rx1) = harness.connect(1, "U1", false).await;
        let (u2, _rx2) = harness.connect(2, "U2", false).await;
        harness.join(&u1, "r1").await;
        harness.join(&u2, "r1").await;
        harness.player_usecase().claim(&u1).await.unwrap();

        // when (操作):
        let result = harness.player_usecase().volume(&u2, 10).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RoomError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_claim_requires_admin_when_configured() {
        // テスト項目: 管理者限定の設定では一般ユーザーの claim が拒否される
        // given (前提条件):
        let mut harness = Harness::new();
        harness.claim_requires_admin = true;
        let (user, _rx1) = harness.connect(1, "U1", false).await;
        let (admin, _rx2) = harness.connect(9, "Admin", true).await;
        harness.join(&user, "r1").await;
        harness.join(&admin, "r1").await;

        // when (操作):
        let by_user = harness.player_usecase().claim(&user).await;
        let by_admin = harness.player_usecase().claim(&admin).await;

        // then (期待する結果):
        assert!(matches!(by_user, Err(RoomError::Unauthorized(_))));
        assert_eq!(by_admin.unwrap().player_connection_id, Some(admin));
    }

    #[tokio::test]
    async fn test_status_report_is_rebroadcast() {
        // テスト項目: 再生位置の報告が EMIT_STATUS として配信される
        // given (前提条件):
        let harness = Harness::new();
        let (u1, _rx1) = harness.connect(1, "U1", false).await;
        let (u2, mut rx2) = harness.connect(2, "U2", false).await;
        harness.join(&u1, "r1").await;
        harness.join(&u2, "r1").await;
        harness.player_usecase().claim(&u1).await.unwrap();
        drain(&mut rx2);

        // when (操作):
        harness
            .player_usecase()
            .report_status(
                &u1,
                PlaybackStatus {
                    queue_id: None,
                    position_secs: 12.5,
                },
            )
            .await
            .unwrap();

        // then (期待する結果):
        let frames = drain(&mut rx2);
        assert_eq!(
            frames[0].action,
            ServerAction::EmitStatus {
                queue_id: None,
                position: 12.5
            }
        );
    }
}
