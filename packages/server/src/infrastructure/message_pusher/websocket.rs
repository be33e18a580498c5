//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - WebSocket の `UnboundedSender` を管理
//! - ドメインの `Outbound` を JSON フレームに変換して送信（push_to, broadcast）
//! - 送信に失敗した接続を `FaultReporter` に通知
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! 送信失敗した接続の切断処理はここでは行わず、通知を受けた UI 層が
//! 通常の切断ユースケースを実行します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    domain::{ConnectionId, FaultReporter, MessagePushError, MessagePusher, Outbound, PusherChannel},
    infrastructure::dto::websocket::ServerEnvelope,
};

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの WebSocket sender
    clients: Arc<RwLock<HashMap<ConnectionId, PusherChannel>>>,
    fault_reporter: FaultReporter,
}

impl WebSocketMessagePusher {
    pub fn new(fault_reporter: FaultReporter) -> Self {
        Self {
            clients: Arc::new(RwLock::new(HashMap::new())),
            fault_reporter,
        }
    }

    fn encode(message: &Outbound) -> Result<String, MessagePushError> {
        ServerEnvelope::from(message)
            .to_json()
            .map_err(|e| MessagePushError::Encode(e.to_string()))
    }

    fn report_fault(&self, connection_id: &ConnectionId) {
        if self.fault_reporter.send(connection_id.clone()).is_err() {
            tracing::debug!("Fault reporter closed; dropping fault of '{}'", connection_id);
        }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
        self.clients.write().await.insert(connection_id, sender);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        self.clients.write().await.remove(connection_id);
        tracing::debug!("Connection '{}' unregistered from MessagePusher", connection_id);
    }

    async fn push_to(&self, connection_id: &ConnectionId, message: &Outbound) -> Result<(), MessagePushError> {
        let frame = Self::encode(message)?;
        let clients = self.clients.read().await;

        let sender = clients
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(connection_id.to_string()))?;

        if let Err(e) = sender.send(frame) {
            self.report_fault(connection_id);
            return Err(MessagePushError::PushFailed(e.to_string()));
        }

        tracing::debug!("Pushed message to '{}'", connection_id);
        Ok(())
    }

    async fn broadcast(&self, targets: &[ConnectionId], message: &Outbound) -> Result<(), MessagePushError> {
        let frame = Self::encode(message)?;
        let clients = self.clients.read().await;

        for target in targets {
            match clients.get(target) {
                Some(sender) => {
                    // ブロードキャストでは一部の送信失敗を許容
                    if let Err(e) = sender.send(frame.clone()) {
                        tracing::warn!("Failed to push message to '{}': {}", target, e);
                        self.report_fault(target);
                    }
                }
                None => {
                    tracing::warn!("Connection '{}' not found during broadcast, skipping", target);
                }
            }
        }

        Ok(())
    }
}
