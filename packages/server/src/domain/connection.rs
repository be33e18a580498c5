//! Connection Membership Tracker の要素

use super::{
    identity::{Identity, IdentityContext},
    value_object::{ConnectionId, RoomId, Timestamp},
};

/// One live connection and the room it currently belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRef {
    pub connection_id: ConnectionId,
    pub identity: IdentityContext,
    pub connected_at: Timestamp,
    /// Room joined by this connection (at most one at a time)
    pub room_id: Option<RoomId>,
    pub joined_at: Option<Timestamp>,
}

impl ConnectionRef {
    pub fn new(connection_id: ConnectionId, identity: IdentityContext, connected_at: Timestamp) -> Self {
        Self {
            connection_id,
            identity,
            connected_at,
            room_id: None,
            joined_at: None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.identity()
    }

    pub fn is_admin(&self) -> bool {
        self.identity().is_some_and(|identity| identity.is_admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    fn connection(identity: IdentityContext) -> ConnectionRef {
        ConnectionRef::new(ConnectionId::generate(), identity, Timestamp::new(0))
    }

    fn user(is_admin: bool) -> IdentityContext {
        IdentityContext::Authenticated(Identity {
            user_id: UserId::new(1),
            display_name: "Alice".to_string(),
            is_admin,
            room_id: None,
        })
    }

    #[test]
    fn test_is_admin_requires_authenticated_admin() {
        // テスト項目: 管理者として認証された接続だけが管理者と判定される
        // given (前提条件):
        let admin = connection(user(true));
        let member = connection(user(false));
        let anonymous = connection(IdentityContext::Anonymous);

        // when (操作):
        let flags = (admin.is_admin(), member.is_admin(), anonymous.is_admin());

        // then (期待する結果):
        assert_eq!(flags, (true, false, false));
    }
}
