//! UseCase 層
//!
//! 各ユースケースはドメイン層のトレイト（Repository / MessagePusher / Catalog）に
//! のみ依存し、具体的な実装は起動時に注入される。

pub mod connect_participant;
pub mod control_player;
pub mod disconnect_participant;
pub mod dispatch_action;
pub mod get_rooms;
pub mod join_room;
pub mod library;
pub mod manage_queue;
pub mod room_access;

#[cfg(test)]
mod test_support;

pub use connect_participant::ConnectParticipantUseCase;
pub use control_player::ControlPlayerUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use dispatch_action::DispatchActionUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::JoinRoomUseCase;
pub use library::LibraryUseCase;
pub use manage_queue::ManageQueueUseCase;
pub use room_access::{Member, RoomAccess};
