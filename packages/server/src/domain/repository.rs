//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use super::{
    connection::ConnectionRef,
    error::RepositoryError,
    room::{RoomSnapshot, RoomState},
    value_object::{ConnectionId, RoomId, Timestamp},
};

/// Exclusive access to one room for the duration of a mutation
///
/// ガードを保持している間がルームの排他区間となる。
/// 外部サービスへの問い合わせなど、待ち時間のある処理の間は保持しないこと。
pub type RoomGuard = OwnedMutexGuard<RoomState>;

/// Room Registry
///
/// `roomId -> RoomState` の対応を所有し、初回参加時の生成と
/// 最終退出後の破棄を管理する。
///
/// ロック順序は「レジストリ -> ルーム」。ルームのガードを保持したまま
/// このトレイトのメソッドを呼び出してはならない。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Lock the room, creating it first when absent
    async fn lock_or_create(&self, room_id: &RoomId, now: Timestamp) -> RoomGuard;

    /// Lock an existing room
    async fn lock(&self, room_id: &RoomId) -> Result<RoomGuard, RepositoryError>;

    /// Discard the room once it is empty, after the configured grace period.
    ///
    /// A join observed before the grace period elapses cancels the eviction.
    async fn evict_if_empty(&self, room_id: &RoomId);

    /// Ids of all live rooms
    async fn room_ids(&self) -> Vec<RoomId>;

    /// Current snapshot of a room
    async fn snapshot(&self, room_id: &RoomId) -> Result<RoomSnapshot, RepositoryError>;
}

/// Connection Membership Tracker
///
/// 接続のライフサイクルを所有する。ルーム側は接続 ID を参照として保持するのみ。
#[async_trait]
pub trait ConnectionTracker: Send + Sync {
    async fn register(&self, connection: ConnectionRef);

    /// Forget a connection; returns its last known state, `None` if already gone
    async fn unregister(&self, connection_id: &ConnectionId) -> Option<ConnectionRef>;

    async fn get(&self, connection_id: &ConnectionId) -> Option<ConnectionRef>;

    /// Record the room a connection joined.
    ///
    /// Returns the updated connection, or `None` when it is no longer tracked.
    async fn enter_room(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        joined_at: Timestamp,
    ) -> Option<ConnectionRef>;

    /// Clear the connection's room; returns the room it was in
    async fn exit_room(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    /// Connections currently joined to any room
    async fn joined_connection_ids(&self) -> Vec<ConnectionId>;

    async fn count(&self) -> usize;
}
