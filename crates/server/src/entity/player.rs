//! Player entity: head, steering intent, and the trailing body.

use crate::world::Boundary;
use glam::Vec2;
use std::collections::VecDeque;

/// Minimum number of trailing segments a body holds.
pub const BODY_MINIMUM: usize = 4;
/// Spacing between the initial trailing segments at spawn.
const INITIAL_SEGMENT_SPACING: f32 = 20.0;
/// Base head radius before score growth.
const BASE_HEAD_RADIUS: f32 = 18.0;
/// Cap on the derived head radius.
const MAX_HEAD_RADIUS: f32 = 25.0;

/// A live player.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: u32,
    pub name: String,
    /// Head position.
    pub position: Vec2,
    /// Unit steering direction, or zero while parked.
    pub direction: Vec2,
    /// Trailing body segments (recorded past head positions), most
    /// recent first.
    pub body: VecDeque<Vec2>,
    pub score: u32,
    /// Hex display color.
    pub color: String,
}

impl Player {
    /// Create a player at a spawn position with the initial body laid out
    /// behind the head along the negative x axis.
    pub fn new(id: u32, name: String, position: Vec2, color: String) -> Self {
        let body = (1..=BODY_MINIMUM)
            .map(|i| position - Vec2::new(i as f32 * INITIAL_SEGMENT_SPACING, 0.0))
            .collect();
        Self {
            id,
            name,
            position,
            direction: Vec2::ZERO,
            body,
            score: 0,
            color,
        }
    }

    /// Store a steering intent. The raw vector is normalized to unit length;
    /// intents that cannot produce a finite unit vector (zero or non-finite)
    /// are dropped, so a parked player stays parked and a moving one keeps
    /// its heading.
    pub fn set_direction(&mut self, raw: Vec2) {
        if let Some(direction) = raw.try_normalize() {
            self.direction = direction;
        }
    }

    /// Whether the player has a live heading.
    pub fn is_moving(&self) -> bool {
        self.direction != Vec2::ZERO
    }

    /// Number of trailing segments the body should hold for the current
    /// score.
    pub fn target_body_len(&self) -> usize {
        BODY_MINIMUM.max(self.score as usize / 2 + BODY_MINIMUM)
    }

    /// Growth metric shown to clients.
    pub fn display_length(&self) -> u32 {
        5u32.max(self.score / 2 + 5)
    }

    /// Head radius shown to clients, growing with score up to a cap.
    pub fn head_radius(&self) -> f32 {
        (BASE_HEAD_RADIUS + (self.score / 10) as f32).min(MAX_HEAD_RADIUS)
    }

    /// Advance one tick: move the head by `speed` along the stored heading
    /// and apply the boundary policy. While moving, the vacated head
    /// position becomes the newest body segment and the tail is trimmed
    /// back to the score-derived target length.
    pub fn advance(&mut self, boundary: &Boundary, speed: f32) {
        if !self.is_moving() {
            return;
        }
        let previous_head = self.position;
        let candidate = self.position + self.direction * speed;
        self.position = boundary.constrain(candidate);

        self.body.push_front(previous_head);
        self.body.truncate(self.target_body_len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big_world() -> Boundary {
        Boundary::Wrap {
            width: 4000.0,
            height: 4000.0,
        }
    }

    fn spawn_player(x: f32, y: f32) -> Player {
        Player::new(1, "tester".to_string(), Vec2::new(x, y), "#FF6B6B".to_string())
    }

    #[test]
    fn test_new_player_body_trails_behind_head() {
        let player = spawn_player(500.0, 500.0);
        assert_eq!(player.score, 0);
        assert_eq!(player.direction, Vec2::ZERO);
        assert_eq!(player.body.len(), BODY_MINIMUM);
        let xs: Vec<f32> = player.body.iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![480.0, 460.0, 440.0, 420.0]);
        assert!(player.body.iter().all(|s| s.y == 500.0));
    }

    #[test]
    fn test_set_direction_normalizes() {
        let mut player = spawn_player(0.0, 0.0);
        player.set_direction(Vec2::new(3.0, 4.0));
        assert!((player.direction.x - 0.6).abs() < 1e-6);
        assert!((player.direction.y - 0.8).abs() < 1e-6);
        assert!((player.direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_intent_keeps_previous_heading() {
        let mut player = spawn_player(0.0, 0.0);
        player.set_direction(Vec2::ZERO);
        assert_eq!(player.direction, Vec2::ZERO);

        player.set_direction(Vec2::new(1.0, 0.0));
        player.set_direction(Vec2::ZERO);
        assert_eq!(player.direction, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_non_finite_intent_is_ignored() {
        let mut player = spawn_player(100.0, 100.0);
        player.set_direction(Vec2::new(1.0, 0.0));

        player.set_direction(Vec2::new(f32::INFINITY, 0.0));
        assert_eq!(player.direction, Vec2::new(1.0, 0.0));

        player.set_direction(Vec2::new(f32::NAN, f32::NAN));
        assert_eq!(player.direction, Vec2::new(1.0, 0.0));

        // Finite components whose squared length overflows are dropped too
        player.set_direction(Vec2::new(3.0e38, 0.0));
        assert_eq!(player.direction, Vec2::new(1.0, 0.0));

        player.advance(&big_world(), 3.0);
        assert!(player.position.is_finite());
        assert!(big_world().contains(player.position));
    }

    #[test]
    fn test_parked_player_does_not_drift() {
        let mut player = spawn_player(100.0, 100.0);
        let before = player.body.clone();
        player.advance(&big_world(), 3.0);
        assert_eq!(player.position, Vec2::new(100.0, 100.0));
        assert_eq!(player.body, before);
    }

    #[test]
    fn test_advance_moves_head_and_records_vacated_position() {
        let mut player = spawn_player(1000.0, 1000.0);
        player.set_direction(Vec2::new(1.0, 0.0));
        player.advance(&big_world(), 3.0);

        assert_eq!(player.position, Vec2::new(1003.0, 1000.0));
        // Newest segment sits where the head was, oldest initial one is gone
        assert_eq!(player.body.len(), BODY_MINIMUM);
        assert_eq!(player.body[0], Vec2::new(1000.0, 1000.0));
        assert!(player.body.iter().all(|s| s.x > 920.0));
    }

    #[test]
    fn test_body_length_tracks_score() {
        let mut player = spawn_player(2000.0, 2000.0);
        player.set_direction(Vec2::new(0.0, 1.0));

        // One point of score per tick raises the target every other move,
        // and the body keeps pace exactly
        for _ in 0..20 {
            player.score += 1;
            player.advance(&big_world(), 3.0);
            assert_eq!(player.body.len(), player.target_body_len());
        }
        assert_eq!(player.score, 20);
        assert_eq!(player.body.len(), 14);
    }

    #[test]
    fn test_body_never_shrinks_below_minimum() {
        let mut player = spawn_player(2000.0, 2000.0);
        player.set_direction(Vec2::new(1.0, 0.0));
        for _ in 0..50 {
            player.advance(&big_world(), 3.0);
        }
        assert_eq!(player.body.len(), BODY_MINIMUM);
    }

    #[test]
    fn test_advance_wraps_across_edge() {
        let mut player = spawn_player(3999.0, 500.0);
        player.set_direction(Vec2::new(1.0, 0.0));
        player.advance(&big_world(), 3.0);
        assert_eq!(player.position, Vec2::new(0.0, 500.0));
        // The recorded segment is the true pre-move head, not a rewind
        // through the seam
        assert_eq!(player.body[0], Vec2::new(3999.0, 500.0));
    }

    #[test]
    fn test_advance_clamps_to_circle_rim() {
        let boundary = Boundary::ClampCircle {
            center: Vec2::ZERO,
            radius: 1000.0,
            margin: 20.0,
        };
        let mut player = spawn_player(979.0, 0.0);
        player.set_direction(Vec2::new(1.0, 0.0));
        player.advance(&boundary, 3.0);
        assert!((player.position.x - 980.0).abs() < 1e-3);
        assert_eq!(player.position.y, 0.0);

        // Pushing further along the rim keeps the player pinned to it
        player.advance(&boundary, 3.0);
        assert!((player.position.length() - 980.0).abs() < 1e-3);
    }

    #[test]
    fn test_display_metrics_grow_with_score() {
        let mut player = spawn_player(0.0, 0.0);
        assert_eq!(player.display_length(), 5);
        assert_eq!(player.head_radius(), 18.0);

        player.score = 10;
        assert_eq!(player.display_length(), 10);
        assert_eq!(player.head_radius(), 19.0);

        player.score = 50;
        assert_eq!(player.head_radius(), 23.0);

        // The radius caps out no matter how large the score gets
        player.score = 1000;
        assert_eq!(player.head_radius(), 25.0);
        assert_eq!(player.display_length(), 505);
    }
}
