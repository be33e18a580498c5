//! MessagePusher trait 定義
//!
//! UseCase 層からクライアントへの送信を抽象化する。
//! 送信内容はドメインの `Outbound` で表現し、ワイヤ形式への変換は実装側が担う。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, event::Outbound, value_object::ConnectionId};

/// Per-connection channel of encoded frames
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Channel on which connections whose transport failed are reported
pub type FaultReporter = mpsc::UnboundedSender<ConnectionId>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Register a connection's outbound channel
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// Send to one connection
    async fn push_to(&self, connection_id: &ConnectionId, message: &Outbound) -> Result<(), MessagePushError>;

    /// Send to many connections.
    ///
    /// Individual transport faults are reported, not returned.
    async fn broadcast(&self, targets: &[ConnectionId], message: &Outbound) -> Result<(), MessagePushError>;
}
