//! Identity Context
//!
//! 接続時に提示される不透明なトークンをユーザー情報に解決する。
//! 解決に失敗した接続は匿名として扱われる。

use async_trait::async_trait;

use super::value_object::{RoomId, UserId};

/// An authenticated user behind a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub display_name: String,
    pub is_admin: bool,
    /// Room the credential is bound to, if any
    pub room_id: Option<RoomId>,
}

impl Identity {
    /// Whether this identity may join the given room
    pub fn may_join(&self, room_id: &RoomId) -> bool {
        self.is_admin || self.room_id.as_ref().is_none_or(|bound| bound == room_id)
    }
}

/// Resolved identity of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityContext {
    Authenticated(Identity),
    Anonymous,
}

impl IdentityContext {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Anonymous => None,
        }
    }
}

/// Resolves connection tokens into identities
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve a token; unknown or expired tokens yield `Anonymous`
    async fn resolve(&self, token: &str) -> IdentityContext;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(is_admin: bool, room: Option<&str>) -> Identity {
        Identity {
            user_id: UserId::new(1),
            display_name: "Alice".to_string(),
            is_admin,
            room_id: room.map(|r| RoomId::new(r.to_string()).unwrap()),
        }
    }

    #[test]
    fn test_unbound_identity_may_join_any_room() {
        // テスト項目: ルームに紐付かないユーザーは任意のルームに参加できる
        // given (前提条件):
        let user = identity(false, None);
        let room = RoomId::new("stage".to_string()).unwrap();

        // when (操作):
        let allowed = user.may_join(&room);

        // then (期待する結果):
        assert!(allowed);
    }

    #[test]
    fn test_bound_identity_is_limited_to_its_room() {
        // テスト項目: ルームに紐付いた一般ユーザーは他のルームに参加できない
        // given (前提条件):
        let user = identity(false, Some("stage"));
        let own = RoomId::new("stage".to_string()).unwrap();
        let other = RoomId::new("backstage".to_string()).unwrap();

        // when (操作) / then (期待する結果):
        assert!(user.may_join(&own));
        assert!(!user.may_join(&other));
    }

    #[test]
    fn test_admin_may_join_any_room() {
        // テスト項目: 管理者は紐付けに関係なく任意のルームに参加できる
        // given (前提条件):
        let admin = identity(true, Some("stage"));
        let other = RoomId::new("backstage".to_string()).unwrap();

        // when (操作):
        let allowed = admin.may_join(&other);

        // then (期待する結果):
        assert!(allowed);
    }
}
