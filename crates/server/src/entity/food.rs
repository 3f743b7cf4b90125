//! Food item.

use glam::Vec2;

/// A food item that players consume to grow.
#[derive(Debug, Clone)]
pub struct Food {
    pub id: u32,
    pub position: Vec2,
    /// Score granted when eaten, always at least 1.
    pub value: u32,
    /// Hex display color.
    pub color: String,
}

impl Food {
    /// Create a new food item.
    pub fn new(id: u32, position: Vec2, value: u32, color: String) -> Self {
        Self {
            id,
            position,
            value: value.max(1),
            color,
        }
    }
}
