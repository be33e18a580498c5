//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::{net::TcpListener, sync::mpsc};
use tower_http::trace::TraceLayer;

use crate::domain::ConnectionId;

use super::{
    handler::{get_library, get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Karaoke room server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(app_state, fault_rx);
/// server.run("127.0.0.1", 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    /// Connections whose outbound channel failed
    faults: mpsc::UnboundedReceiver<ConnectionId>,
}

/// Build the HTTP / WebSocket routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket エンドポイント
        .route("/ws", get(websocket_handler))
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/api/rooms", get(get_rooms))
        .route("/api/rooms/{room_id}", get(get_room_detail))
        .route("/api/library", get(get_library))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl Server {
    pub fn new(state: Arc<AppState>, faults: mpsc::UnboundedReceiver<ConnectionId>) -> Self {
        Self { state, faults }
    }

    /// Bind to `host:port` and serve until Ctrl+C / SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Karaoke server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws?token=<token>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let reaper = spawn_fault_reaper(self.state.clone(), self.faults);

        let result = axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await;

        reaper.abort();
        result
    }
}

/// Disconnect connections whose outbound channel has failed
fn spawn_fault_reaper(
    state: Arc<AppState>,
    mut faults: mpsc::UnboundedReceiver<ConnectionId>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(connection_id) = faults.recv().await {
            tracing::warn!("Transport fault on '{}', disconnecting", connection_id);
            state
                .disconnect_participant_usecase
                .execute(&connection_id)
                .await;
        }
    })
}
