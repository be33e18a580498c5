//! UseCase: 接続受付処理
//!
//! トークンを Identity に解決し、接続を Connection Tracker と MessagePusher に登録する。
//! 匿名の接続も受け付けるが、以降のアクションはすべて拒否される。

use std::sync::Arc;

use karaoke_shared::time::Clock;

use crate::domain::{
    ConnectionId, ConnectionRef, ConnectionTracker, IdentityContext, IdentityResolver,
    MessagePusher, PusherChannel, Timestamp,
};

/// 接続受付のユースケース
pub struct ConnectParticipantUseCase {
    tracker: Arc<dyn ConnectionTracker>,
    message_pusher: Arc<dyn MessagePusher>,
    identity_resolver: Arc<dyn IdentityResolver>,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    pub fn new(
        tracker: Arc<dyn ConnectionTracker>,
        message_pusher: Arc<dyn MessagePusher>,
        identity_resolver: Arc<dyn IdentityResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tracker,
            message_pusher,
            identity_resolver,
            clock,
        }
    }

    /// 接続を登録する
    ///
    /// # Arguments
    ///
    /// * `token` - 接続時に提示された不透明なトークン（なければ匿名）
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    pub async fn execute(&self, token: Option<&str>, sender: PusherChannel) -> ConnectionRef {
        let identity = match token {
            Some(token) => self.identity_resolver.resolve(token).await,
            None => IdentityContext::Anonymous,
        };

        let connection = ConnectionRef::new(
            ConnectionId::generate(),
            identity,
            Timestamp::new(self.clock.now_millis()),
        );

        self.tracker.register(connection.clone()).await;
        self.message_pusher
            .register_client(connection.connection_id.clone(), sender)
            .await;

        match connection.identity() {
            Some(identity) => tracing::info!(
                "Connection '{}' opened by user {} ({})",
                connection.connection_id,
                identity.user_id,
                identity.display_name
            ),
            None => tracing::info!("Anonymous connection '{}' opened", connection.connection_id),
        }

        connection
    }
}
