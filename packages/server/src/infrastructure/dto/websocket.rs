//! WebSocket message DTOs.
//!
//! 1 フレーム = 1 アクション。形式は
//! `{"type": TAG, "payload": {...}, "correlationId": "..."}` で、
//! サーバーからの送信には `"audience"` も付与される。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const TYPE_FIELD: &str = "type";
const CORRELATION_ID_FIELD: &str = "correlationId";
const AUDIENCE_FIELD: &str = "audience";

// ========================================
// Client -> Server
// ========================================

/// Actions a client may send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ClientAction {
    Join { room_id: String },
    Leave,
    RoomSnapshotRequest,
    QueueAdd { song_id: i64 },
    QueueRemove { queue_id: u64 },
    PlayerClaimRequest,
    PlayerReleaseRequest,
    PlayerPlayRequest,
    PlayerPauseRequest,
    PlayerNextRequest,
    PlayerVolumeRequest { level: i64 },
    PlayerMediaEnded { queue_id: u64 },
    PlayerStatusReport {
        #[serde(default)]
        queue_id: Option<u64>,
        #[serde(default)]
        position: f64,
    },
    PlayerErrorReport { message: String },
    ProviderRefreshRequest,
    ToggleSongStarred { song_id: i64 },
    SetPrefs { prefs: BTreeMap<String, Value> },
}

/// A parsed inbound frame
///
/// アクションの解釈に失敗しても、correlation id が取れていればエラー応答に使う。
#[derive(Debug, Clone, PartialEq)]
pub struct ClientEnvelope {
    pub action: Result<ClientAction, String>,
    pub correlation_id: Option<String>,
}

impl ClientEnvelope {
    pub fn new(action: ClientAction, correlation_id: Option<String>) -> Self {
        Self {
            action: Ok(action),
            correlation_id,
        }
    }

    /// Parse one text frame
    pub fn parse(text: &str) -> Self {
        let mut object = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(object)) => object,
            Ok(_) => {
                return Self {
                    action: Err("action must be a JSON object".to_string()),
                    correlation_id: None,
                };
            }
            Err(e) => {
                return Self {
                    action: Err(format!("malformed JSON: {e}")),
                    correlation_id: None,
                };
            }
        };

        let correlation_id = match object.remove(CORRELATION_ID_FIELD) {
            Some(Value::String(id)) => Some(id),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let action = serde_json::from_value::<ClientAction>(Value::Object(object))
            .map_err(|e| format!("unrecognized action: {e}"));

        Self {
            action,
            correlation_id,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let action = match &self.action {
            Ok(action) => action,
            Err(message) => {
                return Err(serde::ser::Error::custom(message));
            }
        };
        let mut object = into_object(serde_json::to_value(action)?);
        if let Some(id) = &self.correlation_id {
            object.insert(CORRELATION_ID_FIELD.to_string(), Value::String(id.clone()));
        }
        serde_json::to_string(&object)
    }
}

// ========================================
// Server -> Client
// ========================================

/// Queue entry as displayed by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntryDto {
    pub queue_id: u64,
    pub song_id: i64,
    pub user_id: i64,
    pub user_display_name: String,
    pub inserted_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerStatusDto {
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStateDto {
    pub status: PlayerStatusDto,
    pub current_queue_id: Option<u64>,
    pub volume: u8,
    pub player_connection_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDto {
    pub song_id: i64,
    pub artist_id: i64,
    pub title: String,
    pub artist: String,
    pub duration: u32,
    pub is_starred: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistDto {
    pub artist_id: i64,
    pub name: String,
    pub song_ids: Vec<i64>,
}

/// Minimal queue change carried by `QUEUE_UPDATE`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum QueueDeltaDto {
    Added { entry: QueueEntryDto, index: usize },
    Removed { queue_id: u64 },
    /// The head entry became the now-playing entry
    Advanced { queue_id: u64 },
}

/// Result carried by a correlated `ACK`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum AckResultDto {
    Joined { room_id: String },
    Left { room_id: Option<String> },
    QueueAdded { entry: QueueEntryDto },
    QueueRemoved { queue_id: u64 },
    Player { player: PlayerStateDto },
    SongUpdated { song: SongDto },
    PrefsSaved { prefs: BTreeMap<String, Value> },
    LibraryRefreshed { artist_count: usize, song_count: usize },
    Accepted,
}

/// Actions the server sends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerAction {
    RoomSnapshot {
        room_id: String,
        queue: Vec<QueueEntryDto>,
        now_playing: Option<QueueEntryDto>,
        up_next: Option<QueueEntryDto>,
        player: PlayerStateDto,
        member_count: usize,
    },
    QueueUpdate { delta: QueueDeltaDto },
    QueueEnd,
    /// New head of the queue, `null` once it is empty
    QueueUpNext { entry: Option<QueueEntryDto> },
    PlayerPlay { queue_id: u64 },
    PlayerPause,
    PlayerNext { queue_id: Option<u64> },
    PlayerVolume { level: u8 },
    PlayerState { player: PlayerStateDto },
    EmitStatus { queue_id: Option<u64>, position: f64 },
    EmitError { message: String },
    LibraryUpdate { artists: Vec<ArtistDto>, songs: Vec<SongDto> },
    ArtistUpdate { artist: ArtistDto },
    SongUpdate { song: SongDto },
    PrefsChange { prefs: BTreeMap<String, Value> },
    Ack { result: AckResultDto },
    Error { kind: String, message: String },
    SocketAuthError { kind: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudienceDto {
    Room,
    Player,
    Direct,
}

/// One outbound frame
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEnvelope {
    pub action: ServerAction,
    pub audience: AudienceDto,
    pub correlation_id: Option<String>,
}

impl ServerEnvelope {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut object = into_object(serde_json::to_value(&self.action)?);
        object.insert(AUDIENCE_FIELD.to_string(), serde_json::to_value(self.audience)?);
        if let Some(id) = &self.correlation_id {
            object.insert(CORRELATION_ID_FIELD.to_string(), Value::String(id.clone()));
        }
        serde_json::to_string(&object)
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let mut object = into_object(serde_json::from_str::<Value>(text)?);

        let correlation_id = match object.remove(CORRELATION_ID_FIELD) {
            Some(Value::String(id)) => Some(id),
            _ => None,
        };
        let audience = match object.remove(AUDIENCE_FIELD) {
            Some(value) => serde_json::from_value(value)?,
            None => AudienceDto::Direct,
        };
        let action = serde_json::from_value(Value::Object(object))?;

        Ok(Self {
            action,
            audience,
            correlation_id,
        })
    }

    /// Wire tag of the action, e.g. `"QUEUE_UPDATE"`
    pub fn type_tag(&self) -> String {
        serde_json::to_value(&self.action)
            .ok()
            .and_then(|value| value.get(TYPE_FIELD).and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default()
    }
}

/// Adjacently tagged enums always serialize to objects; anything else is wrapped
fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(object) => object,
        other => {
            let mut object = Map::new();
            object.insert(TYPE_FIELD.to_string(), other);
            object
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_with_payload_and_correlation_id() {
        // テスト項目: payload と correlationId を持つフレームを解釈できる
        // given (前提条件):
        let text = r#"{"type":"QUEUE_ADD","payload":{"songId":42},"correlationId":"req-1"}"#;

        // when (操作):
        let envelope = ClientEnvelope::parse(text);

        // then (期待する結果):
        assert_eq!(envelope.action, Ok(ClientAction::QueueAdd { song_id: 42 }));
        assert_eq!(envelope.correlation_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn test_parse_action_without_payload() {
        // テスト項目: payload を持たないアクションは type だけで解釈できる
        // given (前提条件):
        let text = r#"{"type":"PLAYER_PLAY_REQUEST"}"#;

        // when (操作):
        let envelope = ClientEnvelope::parse(text);

        // then (期待する結果):
        assert_eq!(envelope.action, Ok(ClientAction::PlayerPlayRequest));
        assert_eq!(envelope.correlation_id, None);
    }

    #[test]
    fn test_parse_unknown_action_keeps_correlation_id() {
        // テスト項目: 未知のアクションはエラーになるが correlationId は保持される
        // given (前提条件):
        let text = r#"{"type":"DANCE","correlationId":"req-9"}"#;

        // when (操作):
        let envelope = ClientEnvelope::parse(text);

        // then (期待する結果):
        assert!(envelope.action.is_err());
        assert_eq!(envelope.correlation_id.as_deref(), Some("req-9"));
    }

    #[test]
    fn test_parse_non_object_is_rejected() {
        // テスト項目: オブジェクト以外の JSON はエラーになる
        // given (前提条件):
        let inputs = ["[1,2]", "not json"];

        // when (操作):
        let results: Vec<ClientEnvelope> = inputs.iter().map(|t| ClientEnvelope::parse(t)).collect();

        // then (期待する結果):
        assert!(results.iter().all(|e| e.action.is_err()));
    }

    #[test]
    fn test_server_envelope_carries_audience_and_correlation_id() {
        // テスト項目: サーバーからのフレームに audience と correlationId が付与される
        // given (前提条件):
        let envelope = ServerEnvelope {
            action: ServerAction::PlayerNext { queue_id: None },
            audience: AudienceDto::Player,
            correlation_id: Some("req-2".to_string()),
        };

        // when (操作):
        let json = envelope.to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        // then (期待する結果):
        assert_eq!(value["type"], "PLAYER_NEXT");
        assert_eq!(value["payload"]["queueId"], Value::Null);
        assert_eq!(value["audience"], "PLAYER");
        assert_eq!(value["correlationId"], "req-2");
        assert_eq!(ServerEnvelope::parse(&json).unwrap(), envelope);
    }

    #[test]
    fn test_queue_update_delta_shape() {
        // テスト項目: QUEUE_UPDATE の差分は op タグ付きで表現される
        // given (前提条件):
        let envelope = ServerEnvelope {
            action: ServerAction::QueueUpdate {
                delta: QueueDeltaDto::Removed { queue_id: 7 },
            },
            audience: AudienceDto::Room,
            correlation_id: None,
        };

        // when (操作):
        let value: Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(value["payload"]["delta"]["op"], "REMOVED");
        assert_eq!(value["payload"]["delta"]["queueId"], 7);
        assert!(value.get("correlationId").is_none());
        assert_eq!(envelope.type_tag(), "QUEUE_UPDATE");
    }
}
