//! Client <-> server message definitions.

use crate::{FoodView, PlayerView, ProtocolError, ViewportHint, WorldView};
use serde::{Deserialize, Serialize};

/// Parsed client message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Join the arena (or respawn) with a display name.
    #[serde(rename = "joinGame")]
    Join {
        #[serde(default)]
        name: String,
        /// Viewport dimensions, consulted once to size a circular world.
        #[serde(default)]
        viewport: Option<ViewportHint>,
    },
    /// Steering intent; a raw, not necessarily unit, direction vector.
    #[serde(rename = "updateDirection")]
    Direction { x: f32, y: f32 },
}

impl ClientMessage {
    /// Parse a client message from a websocket text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        if text.is_empty() {
            return Err(ProtocolError::EmptyMessage);
        }
        Ok(serde_json::from_str(text)?)
    }
}

/// Outbound server message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Reply to a successful join: the assigned id plus the current world.
    #[serde(rename_all = "camelCase")]
    GameJoined {
        player_id: u32,
        world: WorldView,
        players: Vec<PlayerView>,
        food: Vec<FoodView>,
    },
    /// Per-tick snapshot of every player and food item.
    GameUpdate {
        players: Vec<PlayerView>,
        food: Vec<FoodView>,
    },
    /// Sent to an eliminated player only.
    #[serde(rename_all = "camelCase")]
    GameOver { final_score: u32, message: String },
    /// Sent to everyone when a player is eliminated.
    #[serde(rename_all = "camelCase")]
    PlayerEliminated {
        player_id: u32,
        player_name: String,
        final_score: u32,
    },
    /// Sent to everyone but the joiner when a player joins.
    PlayerJoined { player: PlayerView },
    /// Sent to everyone when a player disconnects.
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: u32 },
}

impl ServerMessage {
    /// Encode this message as a websocket text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join() {
        let msg = ClientMessage::parse(r#"{"type":"joinGame","name":"slinky"}"#).unwrap();
        match msg {
            ClientMessage::Join { name, viewport } => {
                assert_eq!(name, "slinky");
                assert!(viewport.is_none());
            }
            other => panic!("expected join, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_join_with_viewport() {
        let msg = ClientMessage::parse(
            r#"{"type":"joinGame","name":"a","viewport":{"width":1920.0,"height":1080.0}}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Join { viewport, .. } => {
                let hint = viewport.unwrap();
                assert_eq!(hint.width, 1920.0);
                assert_eq!(hint.height, 1080.0);
            }
            other => panic!("expected join, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_direction() {
        let msg = ClientMessage::parse(r#"{"type":"updateDirection","x":3.0,"y":-4.0}"#).unwrap();
        match msg {
            ClientMessage::Direction { x, y } => {
                assert_eq!(x, 3.0);
                assert_eq!(y, -4.0);
            }
            other => panic!("expected direction, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ClientMessage::parse("").is_err());
        assert!(ClientMessage::parse("not json").is_err());
        assert!(ClientMessage::parse(r#"{"type":"teleport","x":1}"#).is_err());
    }

    #[test]
    fn test_encode_tags() {
        let over = ServerMessage::GameOver {
            final_score: 42,
            message: "Game Over! You scored 42 points.".to_string(),
        };
        let text = over.encode().unwrap();
        assert!(text.contains(r#""type":"gameOver""#));
        assert!(text.contains(r#""finalScore":42"#));

        let left = ServerMessage::PlayerLeft { player_id: 7 };
        assert!(left.encode().unwrap().contains(r#""type":"playerLeft""#));
    }
}
