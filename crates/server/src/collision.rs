//! Collision detection and death-drop math.
//!
//! This module holds the pure per-tick scan logic:
//! - Food pickups (head close enough to a food item)
//! - Eliminations (head against another player's head or body)
//! - The drop plan converting a dead player's score back into food
//!
//! Scans never mutate the registry. The tick collects their outcomes and
//! applies removals afterwards, so two players running head-on into each
//! other are both eliminated in the same tick.

use crate::entity::{Food, Player};
use glam::Vec2;
use rand::Rng;
use std::collections::{HashMap, VecDeque};

/// A head eats food strictly closer than this.
pub const FOOD_EAT_RADIUS: f32 = 18.0;
/// Two heads strictly closer than this eliminate each other.
pub const HEAD_COLLISION_RADIUS: f32 = 30.0;
/// A head strictly closer than this to a foreign body segment is eliminated.
pub const BODY_COLLISION_RADIUS: f32 = 20.0;
/// At most this many food items drop from one elimination.
pub const MAX_DROP_COUNT: u32 = 50;
/// Death-drop scatter distance range from the death position.
pub const DROP_DISTANCE_MIN: f32 = 20.0;
pub const DROP_DISTANCE_MAX: f32 = 170.0;

/// True when two points are strictly closer than `radius`.
#[inline]
pub fn within(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) < radius * radius
}

/// Ids of the food items a player's head currently overlaps, in pool order.
pub fn food_hits(player: &Player, food: &VecDeque<Food>) -> Vec<u32> {
    food.iter()
        .filter(|f| within(player.position, f.position, FOOD_EAT_RADIUS))
        .map(|f| f.id)
        .collect()
}

/// Ids of players eliminated this tick. Every player is evaluated
/// independently against the full registry, so two mutually colliding
/// players both appear in the result.
pub fn check_eliminations(players: &HashMap<u32, Player>) -> Vec<u32> {
    let mut eliminated = Vec::new();
    'players: for player in players.values() {
        for other in players.values() {
            if other.id == player.id {
                continue;
            }
            if within(player.position, other.position, HEAD_COLLISION_RADIUS) {
                eliminated.push(player.id);
                continue 'players;
            }
            for &segment in &other.body {
                if within(player.position, segment, BODY_COLLISION_RADIUS) {
                    eliminated.push(player.id);
                    continue 'players;
                }
            }
        }
    }
    eliminated
}

/// Death-drop plan for a final score: `(count, value)` of the food items to
/// scatter. Scores too small to fund a single item drop nothing.
pub fn death_drop(score: u32) -> Option<(u32, u32)> {
    let count = (score / 2).min(MAX_DROP_COUNT);
    if count == 0 {
        return None;
    }
    let value = (score / count).max(1);
    Some((count, value))
}

/// Random scatter offset for one dropped food item.
pub fn drop_offset() -> Vec2 {
    let mut rng = rand::rng();
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    let distance = rng.random_range(DROP_DISTANCE_MIN..DROP_DISTANCE_MAX);
    Vec2::new(angle.cos(), angle.sin()) * distance
}
