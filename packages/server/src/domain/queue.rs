//! Queue Engine
//!
//! ルームごとの曲リクエスト待ち行列と、挿入位置を決める公平性ポリシー（歌い手ごとのラウンドロビン）。
//!
//! ## 公平性ポリシー
//!
//! 各エントリは挿入時に「周回 (lap)」を割り当てられ、以後その値は変わらない。
//! そのユーザーの既存エントリがあれば最大周回 + 1、なければキュー内の最小周回（現在の周回）に入る。
//! 新しいエントリはそれより大きい周回のエントリの直前に挿入される（該当がなければ末尾に追加）。
//! キューは常に周回の昇順に並び、同じ周回同士は到着順（`inserted_at` が早い方が前）を保つ。
//! 削除や advance の後も周回は再計算しないため、この並びは崩れない。
//! 既存エントリの相対順序は挿入によって変わらない。

use super::{
    catalog::Song,
    error::RoomError,
    value_object::{QueueId, SongId, Timestamp, UserId},
};

/// Display metadata attached to a queue entry when the catalog lookup succeeds
#[derive(Debug, Clone, PartialEq)]
pub struct SongMeta {
    pub title: String,
    pub artist_name: String,
    pub duration_secs: u32,
}

impl From<&Song> for SongMeta {
    fn from(song: &Song) -> Self {
        Self {
            title: song.title.clone(),
            artist_name: song.artist_name.clone(),
            duration_secs: song.duration_secs,
        }
    }
}

/// One song request awaiting playback
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub queue_id: QueueId,
    pub song_id: SongId,
    pub user_id: UserId,
    pub user_display_name: String,
    pub inserted_at: Timestamp,
    /// `None` when the catalog could not be reached
    pub song: Option<SongMeta>,
}

/// A request to add a song, before a queue id is allocated
#[derive(Debug, Clone)]
pub struct EnqueueRequest {
    pub song_id: SongId,
    pub user_id: UserId,
    pub user_display_name: String,
    pub song: Option<SongMeta>,
}

/// Who is asking for a removal
#[derive(Debug, Clone, Copy)]
pub struct Requester {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Requester {
    /// Owners and admins may remove an entry
    pub fn may_remove(&self, entry: &QueueEntry) -> bool {
        self.is_admin || entry.user_id == self.user_id
    }
}

/// Ordered upcoming entries of one room
#[derive(Debug, Clone)]
pub struct Queue {
    entries: Vec<QueueEntry>,
    /// Lap of each entry, index-aligned with `entries`
    laps: Vec<usize>,
    next_id: QueueId,
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}

impl Queue {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            laps: Vec::new(),
            next_id: QueueId::new(1),
        }
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Allocate the next queue id and insert at the fairness position.
    ///
    /// Returns the inserted entry and its index.
    pub fn enqueue(&mut self, request: EnqueueRequest, inserted_at: Timestamp) -> (QueueEntry, usize) {
        let queue_id = self.next_id;
        self.next_id = queue_id.next();

        let entry = QueueEntry {
            queue_id,
            song_id: request.song_id,
            user_id: request.user_id,
            user_display_name: request.user_display_name,
            inserted_at,
            song: request.song,
        };

        let lap = self.next_lap(entry.user_id);
        let index = self.laps.partition_point(|existing| *existing <= lap);
        self.entries.insert(index, entry.clone());
        self.laps.insert(index, lap);
        (entry, index)
    }

    /// Remove an entry owned by the requester (or any entry, for admins)
    pub fn remove(&mut self, queue_id: QueueId, requester: Requester) -> Result<QueueEntry, RoomError> {
        let index = self
            .position(queue_id)
            .ok_or(RoomError::NotFound(queue_id))?;

        if !requester.may_remove(&self.entries[index]) {
            return Err(RoomError::Unauthorized(format!(
                "queue entry {queue_id} belongs to another user"
            )));
        }

        self.laps.remove(index);
        Ok(self.entries.remove(index))
    }

    /// Pop the head of the queue (the next entry to play)
    pub fn advance(&mut self) -> Option<QueueEntry> {
        if self.entries.is_empty() {
            None
        } else {
            self.laps.remove(0);
            Some(self.entries.remove(0))
        }
    }

    /// Read-only head lookup
    pub fn peek(&self) -> Option<&QueueEntry> {
        self.entries.first()
    }

    pub fn position(&self, queue_id: QueueId) -> Option<usize> {
        self.entries.iter().position(|e| e.queue_id == queue_id)
    }

    /// One past the user's latest lap, or the current lap for a user with nothing queued
    fn next_lap(&self, user_id: UserId) -> usize {
        let own = self
            .entries
            .iter()
            .zip(&self.laps)
            .filter(|(entry, _)| entry.user_id == user_id)
            .map(|(_, lap)| *lap)
            .max();

        match own {
            Some(lap) => lap + 1,
            None => self.laps.first().copied().unwrap_or(0),
        }
    }
}
