//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub food: FoodConfig,
    #[serde(default)]
    pub player: PlayerConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            world: WorldConfig::default(),
            food: FoodConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}

/// Server networking and general settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

fn default_port() -> u16 {
    5001
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_tick_interval() -> u64 {
    16
}

/// World boundary selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryMode {
    /// Rectangular world whose edges wrap around.
    #[default]
    Wrap,
    /// Circular world that clamps players to the boundary.
    Circle,
}

/// World boundary configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorldConfig {
    #[serde(default)]
    pub mode: BoundaryMode,
    /// Rectangle width (wrap mode).
    #[serde(default = "default_world_size")]
    pub width: f32,
    /// Rectangle height (wrap mode).
    #[serde(default = "default_world_size")]
    pub height: f32,
    /// Circle center (circle mode).
    #[serde(default)]
    pub center_x: f32,
    #[serde(default)]
    pub center_y: f32,
    /// Circle radius (circle mode). Zero or negative means the radius is
    /// adopted once from the first join's viewport hint.
    #[serde(default)]
    pub radius: f32,
    /// Distance kept between players and the circular boundary.
    #[serde(default = "default_world_margin")]
    pub margin: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            mode: BoundaryMode::default(),
            width: default_world_size(),
            height: default_world_size(),
            center_x: 0.0,
            center_y: 0.0,
            radius: 0.0,
            margin: default_world_margin(),
        }
    }
}

fn default_world_size() -> f32 {
    4000.0
}
fn default_world_margin() -> f32 {
    20.0
}

/// Food pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoodConfig {
    /// Steady-state food population.
    #[serde(default = "default_max_food")]
    pub max_food: usize,
    /// Slack above max_food tolerated before oldest-first eviction kicks in.
    #[serde(default = "default_overflow_margin")]
    pub overflow_margin: usize,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            max_food: default_max_food(),
            overflow_margin: default_overflow_margin(),
        }
    }
}

fn default_max_food() -> usize {
    200
}
fn default_overflow_margin() -> usize {
    100
}

/// Player configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    /// Movement speed in world units per tick.
    #[serde(default = "default_player_speed")]
    pub speed: f32,
    /// Maximum display name length.
    #[serde(default = "default_max_nick_length")]
    pub max_nick_length: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: default_player_speed(),
            max_nick_length: default_max_nick_length(),
        }
    }
}

fn default_player_speed() -> f32 {
    3.0
}
fn default_max_nick_length() -> usize {
    15
}
