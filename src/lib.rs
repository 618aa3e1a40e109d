//! Tank Arena - grid arena tank battle simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, tanks, bullets, waves, game state)
//! - `tuning`: Data-driven game balance
//! - `highscores`: Single high score persistence
//! - `platform`: Logging setup and the browser entry point

pub mod highscores;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use highscores::HighScore;
pub use tuning::{LevelTier, Tuning};

/// Game configuration constants (reference balance)
pub mod consts {
    /// Simulation ticks per second (one tick per rendered frame)
    pub const TICKS_PER_SECOND: u32 = 60;

    /// Reference arena dimensions
    pub const GRID_WIDTH: i32 = 61;
    pub const GRID_HEIGHT: i32 = 61;
    /// Smallest arena the terrain layout fits in
    pub const MIN_GRID_SIZE: i32 = 25;

    /// Number of difficulty tiers in the level table
    pub const LEVEL_TIERS: usize = 5;

    /// Distance from tank center to barrel tip, in cells
    pub const BARREL_TIP: f32 = 0.8;
    /// Bullet-to-tank hit radii, in cells
    pub const PLAYER_HIT_RADIUS: f32 = 0.6;
    pub const ENEMY_HIT_RADIUS: f32 = 0.5;
    /// Minimum bullet power that passes through fences
    pub const FENCE_PENETRATION_POWER: u32 = 2;

    /// Screen shake cap and per-tick decay
    pub const MAX_SCREEN_SHAKE: f32 = 30.0;
    pub const SHAKE_PER_MAGNITUDE: f32 = 10.0;
    pub const SHAKE_DECAY: f32 = 1.0;
}
