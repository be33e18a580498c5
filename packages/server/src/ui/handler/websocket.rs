//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{Stream, sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{ConnectionId, Request},
    infrastructure::dto::{conversion::RejectedFrame, websocket::ClientEnvelope},
    ui::state::AppState,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Opaque identity token; connections without one are anonymous
    #[serde(default)]
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.token))
}

/// Spawns a task that forwards queued frames to the WebSocket sink.
///
/// The task ends when the sink fails or the connection is unregistered
/// (the sending half of `rx` is dropped).
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, token: Option<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let connection = state
        .connect_participant_usecase
        .execute(token.as_deref(), tx)
        .await;
    let connection_id = connection.connection_id;

    let (sender, receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);

    let cancel = CancellationToken::new();
    let mut recv_task = tokio::spawn(receive_loop(
        state.clone(),
        connection_id.clone(),
        receiver,
        cancel.clone(),
    ));

    tokio::select! {
        _ = &mut recv_task => {}
        _ = &mut send_task => {
            // 処理中のフレームは中断せず、次のフレームを待つ前に止める
            cancel.cancel();
            if let Err(e) = (&mut recv_task).await {
                tracing::warn!("Receive task of '{}' failed: {}", connection_id, e);
            }
        }
    };
    send_task.abort();

    state
        .disconnect_participant_usecase
        .execute(&connection_id)
        .await;
}

/// Reads frames until the peer closes or `cancel` fires.
///
/// Cancellation is only observed while waiting for the next frame; a frame
/// already being dispatched always runs to completion, so a room's critical
/// section is never left half-applied.
async fn receive_loop<S>(
    state: Arc<AppState>,
    connection_id: ConnectionId,
    mut receiver: S,
    cancel: CancellationToken,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    // 1 接続のアクションは受信順に処理する
    loop {
        let msg = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Receive loop of '{}' cancelled", connection_id);
                break;
            }
            msg = receiver.next() => msg,
        };

        let msg = match msg {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                break;
            }
            None => break,
        };

        match msg {
            Message::Text(text) => {
                handle_frame(&state, &connection_id, text.as_str()).await;
            }
            Message::Binary(_) => {
                tracing::debug!("Ignoring binary frame from '{}'", connection_id);
            }
            Message::Close(_) => {
                tracing::info!("Connection '{}' requested close", connection_id);
                break;
            }
            // Ping/pong is handled by axum
            _ => {}
        }
    }
}

/// Decode one text frame and route it
async fn handle_frame(state: &AppState, connection_id: &ConnectionId, text: &str) {
    let envelope = ClientEnvelope::parse(text);

    match Request::try_from(envelope) {
        Ok(request) => {
            // 失敗時の通知は DispatchActionUseCase が送信済み
            let _ = state
                .dispatch_action_usecase
                .execute(connection_id, request)
                .await;
        }
        Err(RejectedFrame {
            correlation_id,
            error,
        }) => {
            tracing::debug!("Rejected frame from '{}': {}", connection_id, error);
            state
                .dispatch_action_usecase
                .reject(connection_id, correlation_id, error)
                .await;
        }
    }
}
