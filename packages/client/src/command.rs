//! Parsing of typed input lines.
//!
//! `/join main`, `/add 12`, `/play` のようなスラッシュコマンドを
//! サーバーへ送るアクション、またはクライアント内で完結する操作に変換する。

use std::collections::BTreeMap;

use karaoke_server::infrastructure::dto::websocket::ClientAction;
use serde_json::Value;
use thiserror::Error;

/// What a typed line asks the client to do
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Send an action to the server
    Send(ClientAction),
    /// Print the command list
    Help,
    /// End the session
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("commands start with '/'; type /help for the list")]
    NotACommand,

    #[error("unknown command '/{0}'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

pub const HELP: &str = "\
Commands:
  /join <room>          join (or switch to) a room
  /leave                leave the current room
  /snapshot             request the full room state
  /add <songId>         queue a song
  /remove <queueId>     remove a queue entry
  /claim | /release     take or give up player authority
  /play | /pause | /next
  /volume <0-100>
  /ended <queueId>      report that the current song finished
  /status <seconds>     report the playback position
  /refresh              rescan the media provider (admin)
  /star <songId>        toggle a star on a song
  /prefs key=value ...  save server preferences (admin)
  /help | /quit";

/// Parse one input line
pub fn parse_line(line: &str) -> Result<Input, CommandParseError> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Err(CommandParseError::NotACommand);
    };

    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let action = match name {
        "help" | "h" => return Ok(Input::Help),
        "quit" | "q" | "exit" => return Ok(Input::Quit),
        "join" => match args.as_slice() {
            [room_id] => ClientAction::Join {
                room_id: room_id.to_string(),
            },
            _ => return Err(CommandParseError::Usage("/join <room>")),
        },
        "leave" => ClientAction::Leave,
        "snapshot" => ClientAction::RoomSnapshotRequest,
        "add" => ClientAction::QueueAdd {
            song_id: single_number(&args, "/add <songId>")?,
        },
        "remove" | "rm" => ClientAction::QueueRemove {
            queue_id: single_number(&args, "/remove <queueId>")?,
        },
        "claim" => ClientAction::PlayerClaimRequest,
        "release" => ClientAction::PlayerReleaseRequest,
        "play" => ClientAction::PlayerPlayRequest,
        "pause" => ClientAction::PlayerPauseRequest,
        "next" | "skip" => ClientAction::PlayerNextRequest,
        "volume" | "vol" => ClientAction::PlayerVolumeRequest {
            level: single_number(&args, "/volume <0-100>")?,
        },
        "ended" => ClientAction::PlayerMediaEnded {
            queue_id: single_number(&args, "/ended <queueId>")?,
        },
        "status" => ClientAction::PlayerStatusReport {
            queue_id: None,
            position: single_number(&args, "/status <seconds>")?,
        },
        "refresh" => ClientAction::ProviderRefreshRequest,
        "star" => ClientAction::ToggleSongStarred {
            song_id: single_number(&args, "/star <songId>")?,
        },
        "prefs" => ClientAction::SetPrefs {
            prefs: parse_prefs(&args)?,
        },
        other => return Err(CommandParseError::Unknown(other.to_string())),
    };
    Ok(Input::Send(action))
}

fn single_number<T: std::str::FromStr>(args: &[&str], usage: &'static str) -> Result<T, CommandParseError> {
    match args {
        [value] => value.parse().map_err(|_| CommandParseError::Usage(usage)),
        _ => Err(CommandParseError::Usage(usage)),
    }
}

/// `key=value` pairs; values that parse as JSON keep their type, others are strings
fn parse_prefs(args: &[&str]) -> Result<BTreeMap<String, Value>, CommandParseError> {
    const USAGE: &str = "/prefs key=value ...";
    if args.is_empty() {
        return Err(CommandParseError::Usage(USAGE));
    }

    args.iter()
        .map(|pair| {
            let (key, raw) = pair
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or(CommandParseError::Usage(USAGE))?;
            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
            Ok((key.to_string(), value))
        })
        .collect()
}
