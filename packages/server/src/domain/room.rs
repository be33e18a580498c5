//! RoomState: one room's queue, player authority and membership.
//!
//! すべての変更操作は同期的で、呼び出し側がルーム単位の排他区間（Mutex）を
//! 保持している前提で実行される。各操作は成功時に配信すべき差分
//! (`RoomEvent`) を返し、失敗時には状態を一切変更しない。

use std::collections::BTreeSet;

use super::{
    error::RoomError,
    event::{PlaybackStatus, RoomEvent},
    player::{PlayerAuthority, PlayerState, PlayerStatus},
    queue::{EnqueueRequest, Queue, QueueEntry, Requester},
    value_object::{ConnectionId, QueueId, RoomId, Timestamp, Volume},
};

/// Events produced by a successful room mutation
pub type Transition = Result<Vec<RoomEvent>, RoomError>;

/// Full replicated state of a room, sent on join and resync
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub created_at: Timestamp,
    pub queue: Vec<QueueEntry>,
    pub now_playing: Option<QueueEntry>,
    /// Head of the queue, the entry that plays after `now_playing`
    pub up_next: Option<QueueEntry>,
    pub player: PlayerState,
    pub member_count: usize,
}

#[derive(Debug)]
pub struct RoomState {
    room_id: RoomId,
    created_at: Timestamp,
    queue: Queue,
    player: PlayerAuthority,
    /// Lookup only; connection lifecycles are owned by the tracker
    members: BTreeSet<ConnectionId>,
    /// Bumped on every join, so a pending eviction can tell a reconnect happened
    epoch: u64,
    /// Set once the registry has discarded this room
    closed: bool,
}

impl RoomState {
    pub fn new(room_id: RoomId, created_at: Timestamp) -> Self {
        Self {
            room_id,
            created_at,
            queue: Queue::new(),
            player: PlayerAuthority::new(),
            members: BTreeSet::new(),
            epoch: 0,
            closed: false,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn player(&self) -> &PlayerAuthority {
        &self.player
    }

    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.members.iter().cloned().collect()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_member(&self, connection_id: &ConnectionId) -> bool {
        self.members.contains(connection_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Mark the room as discarded; holders of a stale handle must rejoin
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.room_id.clone(),
            created_at: self.created_at,
            queue: self.queue.entries().to_vec(),
            now_playing: self.player.current().cloned(),
            up_next: self.queue.peek().cloned(),
            player: self.player.state(),
            member_count: self.members.len(),
        }
    }

    // ========================================
    // Membership
    // ========================================

    /// Add a member; returns `false` if it was already present
    pub fn join(&mut self, connection_id: ConnectionId) -> bool {
        self.epoch += 1;
        self.members.insert(connection_id)
    }

    /// Remove a member, releasing player authority in the same pass if it held it
    pub fn leave(&mut self, connection_id: &ConnectionId) -> Vec<RoomEvent> {
        if !self.members.remove(connection_id) {
            return Vec::new();
        }

        if self.player.holder() == Some(connection_id) {
            self.release_authority()
        } else {
            Vec::new()
        }
    }

    // ========================================
    // Queue Engine
    // ========================================

    pub fn enqueue(&mut self, request: EnqueueRequest, inserted_at: Timestamp) -> (QueueEntry, Vec<RoomEvent>) {
        let head = self.head_id();
        let (entry, index) = self.queue.enqueue(request, inserted_at);
        let events = vec![RoomEvent::QueueAdded {
            entry: entry.clone(),
            index,
        }];
        (entry, self.with_up_next(head, events))
    }

    /// Remove a queued or now-playing entry.
    ///
    /// Removing the now-playing entry clears `currentQueueId` and stops the player.
    pub fn remove(&mut self, queue_id: QueueId, requester: Requester) -> Result<(QueueEntry, Vec<RoomEvent>), RoomError> {
        if let Some(current) = self.player.current()
            && current.queue_id == queue_id
        {
            if !requester.may_remove(current) {
                return Err(RoomError::Unauthorized(format!(
                    "queue entry {queue_id} belongs to another user"
                )));
            }
            let removed = self.player.stop().ok_or(RoomError::NotFound(queue_id))?;
            let events = vec![
                RoomEvent::QueueRemoved { queue_id },
                RoomEvent::PlayerState(self.player.state()),
            ];
            return Ok((removed, events));
        }

        let head = self.head_id();
        let removed = self.queue.remove(queue_id, requester)?;
        let events = vec![RoomEvent::QueueRemoved { queue_id }];
        Ok((removed, self.with_up_next(head, events)))
    }

    /// The entry that plays next, shown in "up next" views
    pub fn peek(&self) -> Option<&QueueEntry> {
        self.queue.peek()
    }

    fn head_id(&self) -> Option<QueueId> {
        self.queue.peek().map(|entry| entry.queue_id)
    }

    /// Append an `UpNext` delta when the head of the queue changed since `before`
    fn with_up_next(&self, before: Option<QueueId>, mut events: Vec<RoomEvent>) -> Vec<RoomEvent> {
        if self.head_id() != before {
            events.push(RoomEvent::UpNext(self.peek().cloned()));
        }
        events
    }

    // ========================================
    // Player Authority
    // ========================================

    pub fn claim(&mut self, connection_id: &ConnectionId) -> Transition {
        if !self.is_member(connection_id) {
            return Err(RoomError::Unauthorized(
                "only room members may claim the player".to_string(),
            ));
        }

        if self.player.claim(connection_id)? {
            Ok(vec![RoomEvent::PlayerState(self.player.state())])
        } else {
            Ok(Vec::new())
        }
    }

    pub fn release(&mut self, connection_id: &ConnectionId) -> Transition {
        self.player.authorize(connection_id)?;
        Ok(self.release_authority())
    }

    /// `STOPPED|PAUSED -> PLAYING`, advancing the queue when nothing is current.
    ///
    /// Fails with `QueueEmpty` (state unchanged) when there is nothing to play.
    pub fn request_play(&mut self, connection_id: &ConnectionId) -> Transition {
        self.player.authorize(connection_id)?;

        if self.player.status() == PlayerStatus::Playing {
            return Ok(Vec::new());
        }

        if let Some(queue_id) = self.player.resume() {
            return Ok(vec![RoomEvent::PlayerPlay { queue_id }]);
        }

        let entry = self.queue.advance().ok_or(RoomError::QueueEmpty)?;
        let queue_id = self.player.start(entry);
        Ok(vec![
            RoomEvent::QueueAdvanced { queue_id },
            RoomEvent::PlayerPlay { queue_id },
            RoomEvent::UpNext(self.peek().cloned()),
        ])
    }

    pub fn request_pause(&mut self, connection_id: &ConnectionId) -> Transition {
        self.player.authorize(connection_id)?;

        if self.player.pause() {
            Ok(vec![RoomEvent::PlayerPause])
        } else {
            Ok(Vec::new())
        }
    }

    /// Skip to the next entry; an explicit "next" always resumes to `PLAYING`
    pub fn request_next(&mut self, connection_id: &ConnectionId) -> Transition {
        self.player.authorize(connection_id)?;
        Ok(self.skip_to_next())
    }

    pub fn request_volume(&mut self, connection_id: &ConnectionId, level: i64) -> Transition {
        self.player.authorize(connection_id)?;

        let volume = Volume::clamped(level);
        self.player.set_volume(volume);
        Ok(vec![RoomEvent::PlayerVolume { volume }])
    }

    /// Natural end of media; stale reports for a superseded entry are ignored
    pub fn notify_media_ended(&mut self, connection_id: &ConnectionId, queue_id: QueueId) -> Transition {
        self.player.authorize(connection_id)?;

        if self.player.current_queue_id() != Some(queue_id) {
            return Ok(Vec::new());
        }
        Ok(self.skip_to_next())
    }

    pub fn report_status(&mut self, connection_id: &ConnectionId, status: PlaybackStatus) -> Transition {
        self.player.authorize(connection_id)?;
        Ok(vec![RoomEvent::PlaybackStatus(status)])
    }

    pub fn report_error(&mut self, connection_id: &ConnectionId, message: String) -> Transition {
        self.player.authorize(connection_id)?;
        Ok(vec![RoomEvent::PlaybackError { message }])
    }

    fn skip_to_next(&mut self) -> Vec<RoomEvent> {
        match self.queue.advance() {
            Some(entry) => {
                let queue_id = self.player.start(entry);
                vec![
                    RoomEvent::QueueAdvanced { queue_id },
                    RoomEvent::PlayerNext {
                        queue_id: Some(queue_id),
                    },
                    RoomEvent::UpNext(self.peek().cloned()),
                ]
            }
            None => {
                self.player.stop();
                vec![RoomEvent::PlayerNext { queue_id: None }, RoomEvent::QueueEnd]
            }
        }
    }

    fn release_authority(&mut self) -> Vec<RoomEvent> {
        self.player.release();
        vec![RoomEvent::PlayerState(self.player.state())]
    }
}
