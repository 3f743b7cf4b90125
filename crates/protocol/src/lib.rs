//! Shared protocol crate for the arena server.
//!
//! This crate contains:
//! - Client/server message definitions (JSON text frames)
//! - Public view types sent inside snapshots
//! - Protocol error types

mod error;
mod messages;

pub use error::ProtocolError;
pub use messages::{ClientMessage, ServerMessage};

use serde::{Deserialize, Serialize};

/// Represents a 2D position using glam's Vec2.
pub type Position = glam::Vec2;

/// Public view of a player, as sent in snapshots and join replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: u32,
    pub name: String,
    /// Head position.
    pub position: Position,
    /// Unit direction, or zero while parked.
    pub direction: Position,
    /// Trailing body positions, most recent first.
    pub body: Vec<Position>,
    pub score: u32,
    /// Render growth metric derived from score.
    pub length: u32,
    /// Render head radius derived from score.
    pub head_radius: f32,
    /// Hex display color.
    pub color: String,
}

/// Public view of a food item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodView {
    pub id: u32,
    pub position: Position,
    pub value: u32,
    pub color: String,
}

/// World bounds, reported to clients in the join reply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum WorldView {
    Wrap { width: f32, height: f32 },
    Circle { center: Position, radius: f32 },
}

/// Client-reported viewport dimensions, optionally sent with a join.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ViewportHint {
    pub width: f32,
    pub height: f32,
}
