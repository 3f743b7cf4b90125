//! World state management.
//!
//! The [`World`] owns the boundary policy, the player registry, and the
//! food pool. Tick sequencing lives in the server module; everything here
//! is synchronous state manipulation.

use crate::config::{BoundaryMode, WorldConfig};
use crate::entity::{Food, Player};
use glam::Vec2;
use rand::Rng;
use std::collections::{HashMap, VecDeque};

/// Hex palette shared by players and food.
pub const COLOR_PALETTE: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
];

/// Inset applied when clamping dropped food into a rectangular world.
const DROP_INSET: f32 = 20.0;

/// World boundary policy, fixed at startup.
#[derive(Debug, Clone, Copy)]
pub enum Boundary {
    /// Rectangular domain with wrap-around edges, coordinates in
    /// `[0, width] x [0, height]`.
    Wrap { width: f32, height: f32 },
    /// Circular domain. Positions past `radius - margin` are projected
    /// radially back onto that rim.
    ClampCircle {
        center: Vec2,
        radius: f32,
        margin: f32,
    },
}

impl Boundary {
    pub fn from_config(config: &WorldConfig) -> Self {
        match config.mode {
            BoundaryMode::Wrap => Boundary::Wrap {
                width: config.width,
                height: config.height,
            },
            BoundaryMode::Circle => Boundary::ClampCircle {
                center: Vec2::new(config.center_x, config.center_y),
                radius: config.radius,
                margin: config.margin,
            },
        }
    }

    /// Whether a position lies inside the domain.
    pub fn contains(&self, p: Vec2) -> bool {
        match *self {
            Boundary::Wrap { width, height } => {
                p.x >= 0.0 && p.x <= width && p.y >= 0.0 && p.y <= height
            }
            Boundary::ClampCircle { center, radius, .. } => p.distance(center) <= radius,
        }
    }

    /// Apply the policy to a candidate position. Wrap mode teleports across
    /// the crossed edge, clamp mode projects radially back inside the rim.
    pub fn constrain(&self, p: Vec2) -> Vec2 {
        match *self {
            Boundary::Wrap { width, height } => {
                let mut p = p;
                if p.x < 0.0 {
                    p.x = width;
                }
                if p.x > width {
                    p.x = 0.0;
                }
                if p.y < 0.0 {
                    p.y = height;
                }
                if p.y > height {
                    p.y = 0.0;
                }
                p
            }
            Boundary::ClampCircle {
                center,
                radius,
                margin,
            } => {
                let limit = radius - margin;
                let offset = p - center;
                let dist = offset.length();
                if dist > limit && dist > 0.0 {
                    center + offset * (limit / dist)
                } else {
                    p
                }
            }
        }
    }

    /// Clamp an arbitrary position into containment. Used for death drops,
    /// which may scatter beyond the boundary.
    pub fn clamp_inside(&self, p: Vec2) -> Vec2 {
        match *self {
            Boundary::Wrap { width, height } => Vec2::new(
                p.x.clamp(DROP_INSET, width - DROP_INSET),
                p.y.clamp(DROP_INSET, height - DROP_INSET),
            ),
            Boundary::ClampCircle { .. } => self.constrain(p),
        }
    }

    /// Uniform random position over the interior.
    pub fn random_position(&self) -> Vec2 {
        let mut rng = rand::rng();
        match *self {
            Boundary::Wrap { width, height } => Vec2::new(
                rng.random_range(0.0..width),
                rng.random_range(0.0..height),
            ),
            Boundary::ClampCircle {
                center,
                radius,
                margin,
            } => {
                // sqrt keeps the areal density uniform across the disk
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                let r = rng.random::<f32>().sqrt() * (radius - margin);
                center + Vec2::new(angle.cos(), angle.sin()) * r
            }
        }
    }

    /// Random spawn position biased toward the central third of the arena,
    /// away from the busy boundary.
    pub fn random_spawn_position(&self) -> Vec2 {
        let mut rng = rand::rng();
        match *self {
            Boundary::Wrap { width, height } => Vec2::new(
                rng.random_range(width / 3.0..width * 2.0 / 3.0),
                rng.random_range(height / 3.0..height * 2.0 / 3.0),
            ),
            Boundary::ClampCircle {
                center,
                radius,
                margin,
            } => {
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                let r = rng.random::<f32>().sqrt() * ((radius - margin) / 3.0);
                center + Vec2::new(angle.cos(), angle.sin()) * r
            }
        }
    }
}

/// Entity count statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counts {
    pub players: usize,
    pub food: usize,
}

/// The game world: one boundary policy over the player registry and the
/// food pool.
#[derive(Debug)]
pub struct World {
    /// Next entity ID to assign.
    next_id: u32,
    /// Boundary policy.
    pub boundary: Boundary,
    /// Live players by id.
    pub players: HashMap<u32, Player>,
    /// Food pool, oldest first so eviction pops from the front.
    pub food: VecDeque<Food>,
}

impl World {
    pub fn new(boundary: Boundary) -> Self {
        Self {
            next_id: 1,
            boundary,
            players: HashMap::with_capacity(64),
            food: VecDeque::with_capacity(512),
        }
    }

    /// Get the next entity ID.
    pub fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        if self.next_id == 0 {
            self.next_id = 1; // Skip 0
        }
        id
    }

    /// Pick a random palette color.
    pub fn random_color() -> String {
        let mut rng = rand::rng();
        COLOR_PALETTE[rng.random_range(0..COLOR_PALETTE.len())].to_string()
    }

    /// Spawn one value-1 food item at a uniform interior position.
    pub fn spawn_food(&mut self) -> u32 {
        let id = self.next_id();
        let position = self.boundary.random_position();
        self.food
            .push_back(Food::new(id, position, 1, Self::random_color()));
        id
    }

    /// Spawn a food item at a caller-supplied position, clamped into bounds.
    pub fn spawn_food_at(&mut self, position: Vec2, value: u32) -> u32 {
        let id = self.next_id();
        let position = self.boundary.clamp_inside(position);
        self.food
            .push_back(Food::new(id, position, value, Self::random_color()));
        id
    }

    /// Remove and return a food item by id. The caller decides whether a
    /// replacement spawns, so consumption and silent removal share this path.
    pub fn consume_food(&mut self, id: u32) -> Option<Food> {
        let index = self.food.iter().position(|f| f.id == id)?;
        self.food.remove(index)
    }

    /// Drop the oldest food items until the pool is back at
    /// `max_food + overflow_margin`. Returns the number evicted.
    pub fn evict_food(&mut self, max_food: usize, overflow_margin: usize) -> usize {
        let cap = max_food + overflow_margin;
        let mut evicted = 0;
        while self.food.len() > cap {
            self.food.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Top the pool up to the steady-state population.
    pub fn fill_food(&mut self, max_food: usize) {
        while self.food.len() < max_food {
            self.spawn_food();
        }
    }

    /// Insert a player, returning its id.
    pub fn add_player(&mut self, player: Player) -> u32 {
        let id = player.id;
        self.players.insert(id, player);
        id
    }

    /// Remove a player. Removing an absent id is a no-op.
    pub fn remove_player(&mut self, id: u32) -> Option<Player> {
        self.players.remove(&id)
    }

    /// Current entity counts.
    pub fn counts(&self) -> Counts {
        Counts {
            players: self.players.len(),
            food: self.food.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_world() -> World {
        World::new(Boundary::Wrap {
            width: 4000.0,
            height: 4000.0,
        })
    }

    fn circle() -> Boundary {
        Boundary::ClampCircle {
            center: Vec2::ZERO,
            radius: 1000.0,
            margin: 20.0,
        }
    }

    #[test]
    fn test_wrap_constrain_teleports_across_edges() {
        let b = Boundary::Wrap {
            width: 4000.0,
            height: 4000.0,
        };
        assert_eq!(b.constrain(Vec2::new(-1.0, 100.0)), Vec2::new(4000.0, 100.0));
        assert_eq!(b.constrain(Vec2::new(4003.0, 100.0)), Vec2::new(0.0, 100.0));
        assert_eq!(b.constrain(Vec2::new(100.0, -0.5)), Vec2::new(100.0, 4000.0));
        assert_eq!(b.constrain(Vec2::new(100.0, 4000.5)), Vec2::new(100.0, 0.0));
        // Interior positions pass through untouched
        assert_eq!(b.constrain(Vec2::new(1.0, 3999.0)), Vec2::new(1.0, 3999.0));
    }

    #[test]
    fn test_circle_constrain_projects_onto_rim() {
        let b = circle();
        let clamped = b.constrain(Vec2::new(1050.0, 0.0));
        assert!((clamped.x - 980.0).abs() < 1e-3);
        assert!(clamped.y.abs() < 1e-3);

        // Direction from the center is preserved
        let diagonal = b.constrain(Vec2::new(900.0, 900.0));
        assert!((diagonal.length() - 980.0).abs() < 1e-2);
        assert!((diagonal.x - diagonal.y).abs() < 1e-2);

        // Inside the rim nothing moves
        let inside = Vec2::new(300.0, -200.0);
        assert_eq!(b.constrain(inside), inside);
    }

    #[test]
    fn test_random_positions_contained() {
        let wrap = Boundary::Wrap {
            width: 500.0,
            height: 300.0,
        };
        let circ = circle();
        for _ in 0..200 {
            assert!(wrap.contains(wrap.random_position()));
            assert!(circ.contains(circ.random_position()));
            assert!(wrap.contains(wrap.random_spawn_position()));
            assert!(circ.contains(circ.random_spawn_position()));
        }
    }

    #[test]
    fn test_spawn_bias_stays_in_central_third() {
        let wrap = Boundary::Wrap {
            width: 3000.0,
            height: 3000.0,
        };
        for _ in 0..100 {
            let p = wrap.random_spawn_position();
            assert!(p.x >= 1000.0 && p.x <= 2000.0);
            assert!(p.y >= 1000.0 && p.y <= 2000.0);
        }
        let circ = circle();
        for _ in 0..100 {
            let p = circ.random_spawn_position();
            assert!(p.length() <= 980.0 / 3.0 + 1e-3);
        }
    }

    #[test]
    fn test_spawn_food_at_clamps_out_of_bounds_drops() {
        let mut world = wrap_world();
        world.spawn_food_at(Vec2::new(-50.0, 9000.0), 3);
        let food = world.food.back().unwrap();
        assert_eq!(food.position, Vec2::new(20.0, 3980.0));
        assert_eq!(food.value, 3);

        let mut world = World::new(circle());
        world.spawn_food_at(Vec2::new(2000.0, 0.0), 1);
        let food = world.food.back().unwrap();
        assert!(food.position.length() <= 980.0 + 1e-3);
    }

    #[test]
    fn test_consume_food_removes_by_id() {
        let mut world = wrap_world();
        let a = world.spawn_food();
        let b = world.spawn_food();
        assert_eq!(world.food.len(), 2);

        let eaten = world.consume_food(a);
        assert!(eaten.is_some());
        assert_eq!(eaten.map(|f| f.id), Some(a));
        assert_eq!(world.food.len(), 1);
        assert_eq!(world.food.front().map(|f| f.id), Some(b));

        // Unknown ids leave the pool untouched
        assert!(world.consume_food(9999).is_none());
        assert_eq!(world.food.len(), 1);
    }

    #[test]
    fn test_evict_food_drops_oldest_back_to_cap() {
        let mut world = wrap_world();
        for _ in 0..320 {
            world.spawn_food();
        }
        let oldest: Vec<u32> = world.food.iter().take(20).map(|f| f.id).collect();

        let evicted = world.evict_food(200, 100);
        assert_eq!(evicted, 20);
        assert_eq!(world.food.len(), 300);
        for id in oldest {
            assert!(world.food.iter().all(|f| f.id != id));
        }

        // Already at the cap, nothing to do
        assert_eq!(world.evict_food(200, 100), 0);
        assert_eq!(world.food.len(), 300);
    }

    #[test]
    fn test_fill_food_reaches_steady_state() {
        let mut world = wrap_world();
        world.fill_food(200);
        assert_eq!(world.food.len(), 200);
        world.fill_food(200);
        assert_eq!(world.food.len(), 200);
        for food in &world.food {
            assert_eq!(food.value, 1);
            assert!(world.boundary.contains(food.position));
        }
    }

    #[test]
    fn test_next_id_is_sequential_and_nonzero() {
        let mut world = wrap_world();
        let first = world.next_id();
        let second = world.next_id();
        assert_ne!(first, 0);
        assert_eq!(second, first + 1);
    }
}
