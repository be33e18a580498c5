//! UseCase: クライアントアクションの振り分け（Action Router）
//!
//! デコード済みの `Command` を各ユースケースへ振り分け、結果を送信元へ返す。
//! 成功時は correlationId がある場合のみ ACK を返し、失敗時は常にエラーを返す。

use std::sync::Arc;

use super::{
    ControlPlayerUseCase, JoinRoomUseCase, LibraryUseCase, ManageQueueUseCase,
    room_access::RoomAccess,
};
use crate::domain::{
    Command, ConnectionId, CorrelationId, Outbound, Reply, Request, RoomError, RoomEvent,
};

/// Action Router
pub struct DispatchActionUseCase {
    join: Arc<JoinRoomUseCase>,
    queue: Arc<ManageQueueUseCase>,
    player: Arc<ControlPlayerUseCase>,
    library: Arc<LibraryUseCase>,
    access: RoomAccess,
}

impl DispatchActionUseCase {
    pub fn new(
        join: Arc<JoinRoomUseCase>,
        queue: Arc<ManageQueueUseCase>,
        player: Arc<ControlPlayerUseCase>,
        library: Arc<LibraryUseCase>,
        access: RoomAccess,
    ) -> Self {
        Self {
            join,
            queue,
            player,
            library,
            access,
        }
    }

    /// Route one request and send its reply to the originating connection
    pub async fn execute(&self, connection_id: &ConnectionId, request: Request) -> Result<Reply, RoomError> {
        let Request {
            command,
            correlation_id,
        } = request;

        tracing::debug!("Dispatching {:?} from '{}'", command, connection_id);
        match self.route(connection_id, command).await {
            Ok(reply) => {
                if let Some(correlation_id) = correlation_id {
                    self.access
                        .send(
                            connection_id,
                            Outbound::Ack {
                                correlation_id,
                                reply: reply.clone(),
                            },
                        )
                        .await;
                }
                Ok(reply)
            }
            Err(error) => {
                self.reject(connection_id, correlation_id, error.clone()).await;
                Err(error)
            }
        }
    }

    /// Report a failed or undecodable action to the sender
    pub async fn reject(&self, connection_id: &ConnectionId, correlation_id: Option<CorrelationId>, error: RoomError) {
        if error.is_auth_failure() {
            tracing::warn!("Rejected action from '{}': {}", connection_id, error);
        } else {
            tracing::debug!("Action from '{}' failed: {}", connection_id, error);
        }

        // 再生要求時にキューが空なら QUEUE_END を本人に返してからエラーを返す
        if error == RoomError::QueueEmpty {
            self.access
                .send(connection_id, Outbound::Direct(RoomEvent::QueueEnd))
                .await;
        }
        self.access
            .send(
                connection_id,
                Outbound::Error {
                    correlation_id,
                    error,
                },
            )
            .await;
    }

    async fn route(&self, connection_id: &ConnectionId, command: Command) -> Result<Reply, RoomError> {
        let id = connection_id;
        let reply = match command {
            Command::Join { room_id } => {
                let snapshot = self.join.execute(id, room_id).await?;
                Reply::Joined {
                    room_id: snapshot.room_id,
                }
            }
            Command::Leave => Reply::Left {
                room_id: self.join.leave(id).await?,
            },
            Command::SnapshotRequest => {
                self.join.resync(id).await?;
                Reply::Accepted
            }
            Command::QueueAdd { song_id } => Reply::QueueAdded(self.queue.add(id, song_id).await?),
            Command::QueueRemove { queue_id } => {
                let removed = self.queue.remove(id, queue_id).await?;
                Reply::QueueRemoved {
                    queue_id: removed.queue_id,
                }
            }
            Command::PlayerClaim => Reply::Player(self.player.claim(id).await?),
            Command::PlayerRelease => Reply::Player(self.player.release(id).await?),
            Command::PlayerPlay => Reply::Player(self.player.play(id).await?),
            Command::PlayerPause => Reply::Player(self.player.pause(id).await?),
            Command::PlayerNext => Reply::Player(self.player.next(id).await?),
            Command::PlayerVolume { level } => Reply::Player(self.player.volume(id, level).await?),
            Command::PlayerMediaEnded { queue_id } => {
                Reply::Player(self.player.media_ended(id, queue_id).await?)
            }
            Command::PlayerStatusReport(status) => {
                Reply::Player(self.player.report_status(id, status).await?)
            }
            Command::PlayerErrorReport { message } => {
                Reply::Player(self.player.report_error(id, message).await?)
            }
            Command::ProviderRefresh => {
                let report = self.library.refresh(id).await?;
                Reply::LibraryRefreshed {
                    artist_count: report.library.artists.len(),
                    song_count: report.library.songs.len(),
                }
            }
            Command::ToggleSongStarred { song_id } => {
                Reply::SongUpdated(self.library.toggle_starred(id, song_id).await?)
            }
            Command::SetPrefs(prefs) => Reply::PrefsSaved(self.library.set_prefs(id, prefs).await?),
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{PlayerStatus, QueueId, RoomRepository, SongId},
        infrastructure::dto::websocket::{
            AckResultDto, AudienceDto, QueueDeltaDto, ServerAction, ServerEnvelope,
        },
        usecase::test_support::{Harness, drain, room},
    };

    fn correlation(value: &str) -> CorrelationId {
        CorrelationId::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_queue_add_broadcasts_and_acks_sender_only() {
        // テスト項目: QUEUE_ADD は両者に QUEUE_UPDATE、送信元にだけ queueId 付きの ACK を返す
        // given (前提条件):
        let harness = Harness::new();
        let (a, mut a_rx) = harness.connect(1, "Alice", false).await;
        let (b, mut b_rx) = harness.connect(2, "Bob", false).await;
        harness.join(&a, "r1").await;
        harness.join(&b, "r1").await;
        drain(&mut a_rx);
        drain(&mut b_rx);

        // when (操作):
        let reply = harness
            .dispatcher()
            .execute(
                &a,
                Request::correlated(
                    Command::QueueAdd {
                        song_id: SongId::new(1),
                    },
                    correlation("c-1"),
                ),
            )
            .await
            .unwrap();

        // then (期待する結果):
        let Reply::QueueAdded(entry) = reply else {
            panic!("unexpected reply");
        };
        let a_frames = drain(&mut a_rx);
        let b_frames = drain(&mut b_rx);
        assert_eq!(a_frames.len(), 3);
        assert_eq!(b_frames.len(), 2);
        for frames in [&a_frames, &b_frames] {
            assert!(matches!(
                &frames[0].action,
                ServerAction::QueueUpdate { delta: QueueDeltaDto::Added { index: 0, .. } }
            ));
            assert!(matches!(&frames[1].action, ServerAction::QueueUpNext { entry: Some(_) }));
        }
        assert_eq!(a_frames[2].correlation_id.as_deref(), Some("c-1"));
        assert!(matches!(
            &a_frames[2].action,
            ServerAction::Ack { result: AckResultDto::QueueAdded { entry: dto } }
                if dto.queue_id == entry.queue_id.value()
        ));
    }

    #[tokio::test]
    async fn test_uncorrelated_success_sends_no_ack() {
        // テスト項目: correlationId のない成功には ACK を返さない
        // given (前提条件):
        let harness = Harness::new();
        let (a, mut rx) = harness.connect(1, "Alice", false).await;
        harness.join(&a, "r1").await;
        drain(&mut rx);

        // when (操作):
        harness
            .dispatcher()
            .execute(&a, Request::new(Command::PlayerClaim))
            .await
            .unwrap();

        // then (期待する結果):
        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0].action, ServerAction::PlayerState { .. }));
    }

    #[tokio::test]
    async fn test_anonymous_action_gets_socket_auth_error() {
        // テスト項目: 匿名接続のアクションは SOCKET_AUTH_ERROR で拒否される
        // given (前提条件):
        let harness = Harness::new();
        let (anonymous, mut rx) = harness.connect_anonymous().await;

        // when (操作):
        let result = harness
            .dispatcher()
            .execute(
                &anonymous,
                Request::new(Command::Join {
                    room_id: room("r1"),
                }),
            )
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::Unauthenticated));
        let frames = drain(&mut rx);
        assert!(matches!(
            &frames[0].action,
            ServerAction::SocketAuthError { kind, .. } if kind == "UNAUTHENTICATED"
        ));
    }

    #[tokio::test]
    async fn test_play_on_empty_queue_sends_queue_end_then_error() {
        // テスト項目: 空キューでの再生要求は本人に QUEUE_END と ERROR を順に返し、他の参加者には何も送らない
        // given (前提条件):
        let harness = Harness::new();
        let (a, mut a_rx) = harness.connect(1, "Alice", false).await;
        let (b, mut b_rx) = harness.connect(2, "Bob", false).await;
        harness.join(&a, "r1").await;
        harness.join(&b, "r1").await;
        harness.player_usecase().claim(&a).await.unwrap();
        drain(&mut a_rx);
        drain(&mut b_rx);

        // when (操作):
        let result = harness
            .dispatcher()
            .execute(&a, Request::correlated(Command::PlayerPlay, correlation("p-1")))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::QueueEmpty));
        let frames = drain(&mut a_rx);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].action, ServerAction::QueueEnd);
        assert_eq!(frames[0].audience, AudienceDto::Direct);
        assert_eq!(
            frames[1].action,
            ServerAction::Error {
                kind: "QUEUE_EMPTY".to_string(),
                message: "Queue is empty".to_string()
            }
        );
        assert_eq!(frames[1].correlation_id.as_deref(), Some("p-1"));
        assert!(drain(&mut b_rx).is_empty());
    }

    #[tokio::test]
    async fn test_full_flow_through_router() {
        // テスト項目: 参加から再生・削除・退出までをルーター経由で実行できる
        // given (前提条件):
        let harness = Harness::new();
        let (a, _rx) = harness.connect(1, "Alice", false).await;
        let dispatcher = harness.dispatcher();

        // when (操作):
        let joined = dispatcher
            .execute(&a, Request::new(Command::Join { room_id: room("r1") }))
            .await
            .unwrap();
        dispatcher
            .execute(&a, Request::new(Command::QueueAdd { song_id: SongId::new(1) }))
            .await
            .unwrap();
        dispatcher
            .execute(&a, Request::new(Command::QueueAdd { song_id: SongId::new(2) }))
            .await
            .unwrap();
        dispatcher.execute(&a, Request::new(Command::PlayerClaim)).await.unwrap();
        let playing = dispatcher.execute(&a, Request::new(Command::PlayerPlay)).await.unwrap();
        let removed = dispatcher
            .execute(&a, Request::new(Command::QueueRemove { queue_id: QueueId::new(2) }))
            .await
            .unwrap();
        let left = dispatcher.execute(&a, Request::new(Command::Leave)).await.unwrap();

        // then (期待する結果):
        assert_eq!(joined, Reply::Joined { room_id: room("r1") });
        assert!(matches!(playing, Reply::Player(state) if state.status == PlayerStatus::Playing));
        assert_eq!(removed, Reply::QueueRemoved { queue_id: QueueId::new(2) });
        assert_eq!(left, Reply::Left { room_id: Some(room("r1")) });
    }

    /// `QUEUE_UP_NEXT` payloads in arrival order, as queue ids
    fn up_next_ids(frames: &[ServerEnvelope]) -> Vec<Option<u64>> {
        frames
            .iter()
            .filter_map(|frame| match &frame.action {
                ServerAction::QueueUpNext { entry } => Some(entry.as_ref().map(|e| e.queue_id)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_up_next_tracks_add_remove_and_advance() {
        // テスト項目: 先頭を変える追加・削除・再生のたびに QUEUE_UP_NEXT が配信され、スナップショットにも反映される
        // given (前提条件):
        let harness = Harness::new();
        let (a, _a_rx) = harness.connect(1, "Alice", false).await;
        let (b, mut b_rx) = harness.connect(2, "Bob", false).await;
        let dispatcher = harness.dispatcher();
        harness.join(&a, "r1").await;
        harness.join(&b, "r1").await;
        drain(&mut b_rx);

        // when (操作): 空キューへの追加と、先頭以外への追加
        dispatcher
            .execute(&a, Request::new(Command::QueueAdd { song_id: SongId::new(1) }))
            .await
            .unwrap();
        dispatcher
            .execute(&b, Request::new(Command::QueueAdd { song_id: SongId::new(2) }))
            .await
            .unwrap();

        // then (期待する結果): 先頭が決まったときだけ通知される
        assert_eq!(up_next_ids(&drain(&mut b_rx)), vec![Some(1)]);
        let snapshot = harness.repository.snapshot(&room("r1")).await.unwrap();
        assert_eq!(snapshot.up_next.map(|e| e.queue_id), Some(QueueId::new(1)));

        // when (操作): 先頭を削除
        dispatcher
            .execute(&a, Request::new(Command::QueueRemove { queue_id: QueueId::new(1) }))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(up_next_ids(&drain(&mut b_rx)), vec![Some(2)]);

        // when (操作): 再生で先頭が再生中に移る
        dispatcher.execute(&a, Request::new(Command::PlayerClaim)).await.unwrap();
        dispatcher.execute(&a, Request::new(Command::PlayerPlay)).await.unwrap();

        // then (期待する結果): キューが空になったことが通知される
        assert_eq!(up_next_ids(&drain(&mut b_rx)), vec![None]);
        let snapshot = harness.repository.snapshot(&room("r1")).await.unwrap();
        assert_eq!(snapshot.up_next, None);
        assert_eq!(snapshot.now_playing.map(|e| e.queue_id), Some(QueueId::new(2)));
    }
}
