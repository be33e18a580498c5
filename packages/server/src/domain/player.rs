//! Player Authority State Machine
//!
//! ルームごとに「どの接続が再生を操作できるか」と再生状態を管理する。
//!
//! - `claim`: UNCLAIMED -> STOPPED
//! - `release`: any -> UNCLAIMED
//! - `play`: STOPPED | PAUSED -> PLAYING
//! - `pause`: PLAYING -> PAUSED
//!
//! キュー操作を伴う遷移（play / next / media ended）は `RoomState` が
//! Queue Engine と組み合わせて実行する。ここでは認可と状態遷移のみを扱う。

use super::{
    error::RoomError,
    queue::QueueEntry,
    value_object::{ConnectionId, QueueId, Volume},
};

/// Transport status reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    Stopped,
    Playing,
    Paused,
}

/// The four states of the authority state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityState {
    Unclaimed,
    Stopped,
    Playing,
    Paused,
}

/// Snapshot of a room's player, as replicated to clients
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub status: PlayerStatus,
    pub current_queue_id: Option<QueueId>,
    pub volume: Volume,
    pub player_connection_id: Option<ConnectionId>,
}

/// Which connection drives playback, and what it is playing
#[derive(Debug, Clone)]
pub struct PlayerAuthority {
    holder: Option<ConnectionId>,
    status: PlayerStatus,
    /// The now-playing entry, moved out of the queue by `advance`
    current: Option<QueueEntry>,
    volume: Volume,
}

impl Default for PlayerAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerAuthority {
    pub fn new() -> Self {
        Self {
            holder: None,
            status: PlayerStatus::Stopped,
            current: None,
            volume: Volume::default(),
        }
    }

    pub fn holder(&self) -> Option<&ConnectionId> {
        self.holder.as_ref()
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.current.as_ref()
    }

    pub fn current_queue_id(&self) -> Option<QueueId> {
        self.current.as_ref().map(|entry| entry.queue_id)
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn authority_state(&self) -> AuthorityState {
        match (&self.holder, self.status) {
            (None, _) => AuthorityState::Unclaimed,
            (Some(_), PlayerStatus::Stopped) => AuthorityState::Stopped,
            (Some(_), PlayerStatus::Playing) => AuthorityState::Playing,
            (Some(_), PlayerStatus::Paused) => AuthorityState::Paused,
        }
    }

    pub fn state(&self) -> PlayerState {
        PlayerState {
            status: self.status,
            current_queue_id: self.current_queue_id(),
            volume: self.volume,
            player_connection_id: self.holder.clone(),
        }
    }

    /// `UNCLAIMED -> STOPPED`.
    ///
    /// Returns `Ok(false)` when the connection already holds authority.
    pub fn claim(&mut self, connection_id: &ConnectionId) -> Result<bool, RoomError> {
        match &self.holder {
            Some(holder) if holder == connection_id => Ok(false),
            Some(_) => Err(RoomError::AlreadyClaimed),
            None => {
                self.holder = Some(connection_id.clone());
                self.status = PlayerStatus::Stopped;
                self.current = None;
                Ok(true)
            }
        }
    }

    /// Any state `-> UNCLAIMED`; drops the now-playing entry
    pub fn release(&mut self) -> Option<QueueEntry> {
        self.holder = None;
        self.status = PlayerStatus::Stopped;
        self.current.take()
    }

    /// Only the authoritative connection may drive transport
    pub fn authorize(&self, connection_id: &ConnectionId) -> Result<(), RoomError> {
        match &self.holder {
            Some(holder) if holder == connection_id => Ok(()),
            Some(_) => Err(RoomError::Unauthorized(
                "another connection holds player authority".to_string(),
            )),
            None => Err(RoomError::Unauthorized(
                "player authority is unclaimed".to_string(),
            )),
        }
    }

    /// Start playing a freshly advanced entry
    pub fn start(&mut self, entry: QueueEntry) -> QueueId {
        let queue_id = entry.queue_id;
        self.current = Some(entry);
        self.status = PlayerStatus::Playing;
        queue_id
    }

    /// `STOPPED|PAUSED -> PLAYING` for the existing current entry
    pub fn resume(&mut self) -> Option<QueueId> {
        let queue_id = self.current_queue_id()?;
        self.status = PlayerStatus::Playing;
        Some(queue_id)
    }

    /// `PLAYING -> PAUSED`; returns whether anything changed
    pub fn pause(&mut self) -> bool {
        if self.status == PlayerStatus::Playing {
            self.status = PlayerStatus::Paused;
            true
        } else {
            false
        }
    }

    /// Clear the current entry and stop
    pub fn stop(&mut self) -> Option<QueueEntry> {
        self.status = PlayerStatus::Stopped;
        self.current.take()
    }

    pub fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
    }
}
