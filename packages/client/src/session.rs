//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use karaoke_server::infrastructure::dto::websocket::{
    ClientAction, ClientEnvelope, ServerAction, ServerEnvelope,
};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use crate::{
    command::{HELP, Input, parse_line},
    error::ClientError,
    formatter::MessageFormatter,
    ui::redisplay_prompt,
};

/// Connection settings for one session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:8080/ws`
    pub url: String,
    pub token: Option<String>,
    /// Room joined right after connecting (and again after a reconnect)
    pub room: Option<String>,
    /// Show player-scoped deltas
    pub player_view: bool,
}

impl SessionOptions {
    /// Endpoint with the token appended as a percent-encoded query parameter
    pub fn connect_url(&self) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.url)?;
        if let Some(token) = &self.token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url)
    }
}

/// Why the read side of a session stopped
enum ReadOutcome {
    Closed,
    AuthenticationFailed(String),
}

/// Run one connection until the user quits or the connection drops
///
/// `Ok(())` means the user ended the session.
pub async fn run_client_session(
    options: &SessionOptions,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    let (ws_stream, _) = connect_async(options.connect_url()?.as_str())
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to karaoke server!");
    println!("\nType /help for commands. Press Ctrl+C to exit.\n");

    let (mut write, mut read) = ws_stream.split();
    let formatter = MessageFormatter::new(options.player_view);

    // Spawn a task to handle incoming messages
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let envelope = match ServerEnvelope::parse(text.as_str()) {
                        Ok(envelope) => envelope,
                        Err(e) => {
                            tracing::debug!("Undecodable frame: {}", e);
                            print!("{}", MessageFormatter::format_raw_message(text.as_str()));
                            redisplay_prompt();
                            continue;
                        }
                    };

                    if let Some(formatted) = formatter.format(&envelope) {
                        print!("{}", formatted);
                        redisplay_prompt();
                    }

                    if let ServerAction::SocketAuthError { kind, message } = envelope.action
                        && kind == "UNAUTHENTICATED"
                    {
                        return ReadOutcome::AuthenticationFailed(message);
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break;
                }
                _ => {}
            }
        }
        ReadOutcome::Closed
    });

    let mut next_correlation = 1u64;
    let mut pending = Vec::new();
    if let Some(room_id) = &options.room {
        pending.push(ClientAction::Join {
            room_id: room_id.clone(),
        });
    }

    loop {
        for action in pending.drain(..) {
            let correlation_id = format!("c-{}", next_correlation);
            next_correlation += 1;

            let json = match ClientEnvelope::new(action, Some(correlation_id)).to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize action: {}", e);
                    continue;
                }
            };
            if let Err(e) = write.send(Message::Text(json.into())).await {
                read_task.abort();
                return Err(ClientError::ConnectionError(e.to_string()));
            }
        }

        tokio::select! {
            outcome = &mut read_task => {
                return match outcome {
                    Ok(ReadOutcome::AuthenticationFailed(message)) => {
                        Err(ClientError::AuthenticationFailed(message))
                    }
                    _ => Err(ClientError::ConnectionError("Connection lost".to_string())),
                };
            }
            line = input_rx.recv() => {
                let Some(line) = line else {
                    // 入力が閉じられた（Ctrl+C / Ctrl+D）
                    read_task.abort();
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                };

                match parse_line(&line) {
                    Ok(Input::Send(action)) => pending.push(action),
                    Ok(Input::Help) => {
                        println!("{}", HELP);
                        redisplay_prompt();
                    }
                    Ok(Input::Quit) => {
                        read_task.abort();
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(());
                    }
                    Err(e) => {
                        println!("{}", e);
                        redisplay_prompt();
                    }
                }
            }
        }
    }
}
