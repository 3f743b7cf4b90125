//! Game entities.
//!
//! This module defines the things that live in the world.

mod food;
mod player;

pub use food::Food;
pub use player::{Player, BODY_MINIMUM};
