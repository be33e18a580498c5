//! Infrastructure layer: concrete implementations of the domain seams.

pub mod catalog;
pub mod dto;
pub mod identity;
pub mod message_pusher;
pub mod repository;
