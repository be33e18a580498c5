//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{RepositoryError, RoomId},
    infrastructure::dto::http::{HealthDto, LibraryDto, RoomDetailDto, RoomSummaryDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
        connections: state.tracker.count().await,
        rooms: state.get_rooms_usecase.count().await,
    })
}

/// Get list of live rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(rooms.iter().map(RoomSummaryDto::from).collect())
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let room_id = RoomId::new(room_id).map_err(|e| {
        tracing::debug!("Invalid room id in path: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    match state.get_rooms_usecase.get(&room_id).await {
        Ok(snapshot) => Ok(Json(RoomDetailDto::from(&snapshot))),
        Err(RepositoryError::RoomNotFound(_)) => Err(StatusCode::NOT_FOUND),
    }
}

/// Get the song library
pub async fn get_library(State(state): State<Arc<AppState>>) -> Result<Json<LibraryDto>, StatusCode> {
    match state.library_usecase.library().await {
        Ok(library) => Ok(Json(LibraryDto::from(&library))),
        Err(e) => {
            tracing::warn!("Failed to load library: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
