//! Message formatting utilities for client display.

use karaoke_server::infrastructure::dto::websocket::{
    AckResultDto, AudienceDto, PlayerStateDto, PlayerStatusDto, QueueDeltaDto, QueueEntryDto,
    ServerAction, ServerEnvelope,
};
use karaoke_shared::time::timestamp_to_rfc3339;

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter {
    /// Whether this client shows the player view
    player_view: bool,
}

impl MessageFormatter {
    pub fn new(player_view: bool) -> Self {
        Self { player_view }
    }

    /// Player-scoped deltas are dropped unless the player view is shown
    pub fn is_visible(&self, envelope: &ServerEnvelope) -> bool {
        self.player_view || envelope.audience != AudienceDto::Player
    }

    /// Render one frame, or `None` if this view ignores it
    pub fn format(&self, envelope: &ServerEnvelope) -> Option<String> {
        if !self.is_visible(envelope) {
            return None;
        }

        let body = match &envelope.action {
            ServerAction::RoomSnapshot {
                room_id,
                queue,
                now_playing,
                up_next,
                player,
                member_count,
            } => {
                let mut output = format!("\n\n{RULE}\nRoom '{room_id}' ({member_count} members)\n");
                output.push_str(&format!("Player: {}\n", format_player(player)));
                if let Some(entry) = now_playing {
                    output.push_str(&format!("Now playing: {}\n", format_entry(entry)));
                }
                if let Some(entry) = up_next {
                    output.push_str(&format!("Up next: {}\n", format_entry(entry)));
                }
                if queue.is_empty() {
                    output.push_str("(Queue is empty)\n");
                } else {
                    for (i, entry) in queue.iter().enumerate() {
                        output.push_str(&format!("{:>3}. {}\n", i + 1, format_entry(entry)));
                    }
                }
                output.push_str(RULE);
                output.push('\n');
                return Some(output);
            }
            ServerAction::QueueUpdate { delta } => match delta {
                QueueDeltaDto::Added { entry, index } => {
                    format!("+ queued at #{}: {}", index + 1, format_entry(entry))
                }
                QueueDeltaDto::Removed { queue_id } => format!("- removed #{queue_id}"),
                QueueDeltaDto::Advanced { queue_id } => format!("> #{queue_id} now playing"),
            },
            ServerAction::QueueEnd => "Queue ended".to_string(),
            ServerAction::QueueUpNext { entry } => match entry {
                Some(entry) => format!("up next: {}", format_entry(entry)),
                None => "(nothing up next)".to_string(),
            },
            ServerAction::PlayerPlay { queue_id } => format!("▶ playing #{queue_id}"),
            ServerAction::PlayerPause => "⏸ paused".to_string(),
            ServerAction::PlayerNext { queue_id } => match queue_id {
                Some(id) => format!("⏭ next: #{id}"),
                None => "⏹ stopped".to_string(),
            },
            ServerAction::PlayerVolume { level } => format!("volume {level}"),
            ServerAction::PlayerState { player } => format!("player: {}", format_player(player)),
            ServerAction::EmitStatus { queue_id, position } => match queue_id {
                Some(id) => format!("#{id} at {position:.1}s"),
                None => format!("at {position:.1}s"),
            },
            ServerAction::EmitError { message } => format!("player error: {message}"),
            ServerAction::LibraryUpdate { artists, songs } => {
                format!("library updated: {} artists, {} songs", artists.len(), songs.len())
            }
            ServerAction::ArtistUpdate { artist } => {
                format!("artist updated: {} ({} songs)", artist.name, artist.song_ids.len())
            }
            ServerAction::SongUpdate { song } => {
                let star = if song.is_starred { "★" } else { "☆" };
                format!("{star} {} - {}", song.artist, song.title)
            }
            ServerAction::PrefsChange { prefs } => {
                let keys: Vec<&str> = prefs.keys().map(String::as_str).collect();
                format!("preferences changed: {}", keys.join(", "))
            }
            ServerAction::Ack { result } => format_ack(result),
            ServerAction::Error { kind, message } => format!("error [{kind}]: {message}"),
            ServerAction::SocketAuthError { kind, message } => {
                format!("auth error [{kind}]: {message}")
            }
        };

        Some(match &envelope.correlation_id {
            Some(id) => format!("\n[{id}] {body}\n"),
            None => format!("\n{body}\n"),
        })
    }

    /// Format a frame the client could not decode
    pub fn format_raw_message(text: &str) -> String {
        format!("\n(raw) {text}\n")
    }
}

fn format_entry(entry: &QueueEntryDto) -> String {
    let song = match (&entry.title, &entry.artist) {
        (Some(title), Some(artist)) => format!("{artist} - {title}"),
        (Some(title), None) => title.clone(),
        _ => format!("song {}", entry.song_id),
    };
    format!(
        "#{} {} (by {}, {})",
        entry.queue_id,
        song,
        entry.user_display_name,
        timestamp_to_rfc3339(entry.inserted_at)
    )
}

fn format_player(player: &PlayerStateDto) -> String {
    let status = match player.status {
        PlayerStatusDto::Stopped => "stopped",
        PlayerStatusDto::Playing => "playing",
        PlayerStatusDto::Paused => "paused",
    };
    let current = player
        .current_queue_id
        .map(|id| format!(" #{id}"))
        .unwrap_or_default();
    let holder = match &player.player_connection_id {
        Some(_) => "claimed",
        None => "unclaimed",
    };
    format!("{status}{current}, volume {}, {holder}", player.volume)
}

fn format_ack(result: &AckResultDto) -> String {
    match result {
        AckResultDto::Joined { room_id } => format!("ok: joined '{room_id}'"),
        AckResultDto::Left { room_id: Some(room_id) } => format!("ok: left '{room_id}'"),
        AckResultDto::Left { room_id: None } => "ok: not in a room".to_string(),
        AckResultDto::QueueAdded { entry } => format!("ok: queued #{}", entry.queue_id),
        AckResultDto::QueueRemoved { queue_id } => format!("ok: removed #{queue_id}"),
        AckResultDto::Player { player } => format!("ok: {}", format_player(player)),
        AckResultDto::SongUpdated { song } => format!("ok: song {}", song.song_id),
        AckResultDto::PrefsSaved { prefs } => format!("ok: {} preferences saved", prefs.len()),
        AckResultDto::LibraryRefreshed {
            artist_count,
            song_count,
        } => format!("ok: {artist_count} artists, {song_count} songs"),
        AckResultDto::Accepted => "ok".to_string(),
    }
}
