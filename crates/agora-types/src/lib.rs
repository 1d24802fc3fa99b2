//! Shared types for the Agora discussion board.
//!
//! `models` are the hydrated views the core hands back to callers,
//! `reactions` is the closed vocabulary of the like/dislike subsystem and
//! `api` holds the inbound form/query payloads.

pub mod api;
pub mod models;
pub mod reactions;

pub type UserId = i64;
pub type PostId = i64;
pub type CommentId = i64;
pub type CategoryId = i64;
