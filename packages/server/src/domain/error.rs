//! ドメイン層のエラー定義

use thiserror::Error;

use super::value_object::{QueueId, RoomId, SongId};

/// Failures of room operations (queue engine, player authority, routing)
///
/// `AlreadyClaimed` と `QueueEmpty` は想定内の終端状態であり、
/// Action Router で通常のステータスアクションに変換される。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoomError {
    /// The connection presented no valid identity
    #[error("authentication required")]
    Unauthenticated,

    /// An authorization rule was violated
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The referenced queue entry does not exist
    #[error("queue entry {0} not found")]
    NotFound(QueueId),

    /// Another connection already holds player authority
    #[error("player is already claimed by another connection")]
    AlreadyClaimed,

    /// Nothing left to play
    #[error("Queue is empty")]
    QueueEmpty,

    /// The room was evicted or never joined; the client must rejoin
    #[error("room not found; rejoin required")]
    RoomNotFound(Option<RoomId>),

    /// The action was malformed or failed validation
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// The external catalog failed to serve the request
    #[error("catalog unavailable: {0}")]
    Catalog(String),
}

impl RoomError {
    /// Stable machine-readable kind used on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyClaimed => "ALREADY_CLAIMED",
            Self::QueueEmpty => "QUEUE_EMPTY",
            Self::RoomNotFound(_) => "ROOM_NOT_FOUND",
            Self::InvalidAction(_) => "INVALID_ACTION",
            Self::Catalog(_) => "CATALOG_ERROR",
        }
    }

    /// Whether this failure is an authentication/authorization rejection
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Unauthorized(_))
    }
}

/// Room Registry のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("room '{0}' not found")]
    RoomNotFound(RoomId),
}

impl From<RepositoryError> for RoomError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::RoomNotFound(room_id) => RoomError::RoomNotFound(Some(room_id)),
        }
    }
}

/// メッセージ送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' is not registered")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),

    #[error("failed to encode message: {0}")]
    Encode(String),
}

/// 外部カタログサービスのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("song {0} not found")]
    SongNotFound(SongId),

    #[error("catalog backend failure: {0}")]
    Backend(String),
}

impl From<CatalogError> for RoomError {
    fn from(error: CatalogError) -> Self {
        RoomError::Catalog(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_converts_to_room_not_found() {
        // テスト項目: RepositoryError::RoomNotFound が RoomId 付きの RoomError に変換される
        // given (前提条件):
        let room_id = RoomId::new("lobby".to_string()).unwrap();

        // when (操作):
        let error: RoomError = RepositoryError::RoomNotFound(room_id.clone()).into();

        // then (期待する結果):
        assert_eq!(error, RoomError::RoomNotFound(Some(room_id)));
        assert_eq!(error.to_string(), "room not found; rejoin required");
    }

    #[test]
    fn test_auth_failures_are_classified() {
        // テスト項目: 認証・認可エラーのみが auth failure として分類される
        // given (前提条件):
        let errors = [
            RoomError::Unauthenticated,
            RoomError::Unauthorized("not owner".to_string()),
            RoomError::QueueEmpty,
            RoomError::AlreadyClaimed,
        ];

        // when (操作):
        let flags: Vec<bool> = errors.iter().map(RoomError::is_auth_failure).collect();

        // then (期待する結果):
        assert_eq!(flags, vec![true, true, false, false]);
    }

    #[test]
    fn test_queue_empty_message_is_user_facing() {
        // テスト項目: QueueEmpty はクライアントにそのまま表示できる文言を持つ
        // given (前提条件):
        let error = RoomError::QueueEmpty;

        // when (操作):
        let message = error.to_string();

        // then (期待する結果):
        assert_eq!(message, "Queue is empty");
        assert_eq!(error.kind(), "QUEUE_EMPTY");
    }
}
