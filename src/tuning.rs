//! Data-driven game balance
//!
//! Every number the simulation reads lives here. Defaults reproduce the
//! reference balance; a JSON file may override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading or saving a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed tuning JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(&'static str),
}

/// One row of the difficulty table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTier {
    /// Concurrently alive enemies allowed
    pub max_enemies: usize,
    /// Ticks between spawn attempts
    pub spawn_interval: u32,
    /// Enemies spawned per wave
    pub max_per_wave: u32,
    /// Enemy fire cooldown is rolled from this inclusive range at spawn
    pub fire_cooldown_min: u32,
    pub fire_cooldown_max: u32,
}

impl LevelTier {
    const fn new(
        max_enemies: usize,
        spawn_interval: u32,
        max_per_wave: u32,
        fire_cooldown_min: u32,
        fire_cooldown_max: u32,
    ) -> Self {
        Self {
            max_enemies,
            spawn_interval,
            max_per_wave,
            fire_cooldown_min,
            fire_cooldown_max,
        }
    }
}

/// Reference difficulty table, tiers 1 through 5
pub const DEFAULT_LEVELS: [LevelTier; LEVEL_TIERS] = [
    LevelTier::new(6, 120, 20, 120, 180),
    LevelTier::new(8, 100, 22, 105, 165),
    LevelTier::new(10, 80, 24, 90, 150),
    LevelTier::new(12, 60, 26, 75, 135),
    LevelTier::new(15, 50, 30, 60, 90),
];

/// Complete balance sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Arena ===
    pub grid_width: i32,
    pub grid_height: i32,
    /// Random 3-cell segments placed per generated map (inclusive)
    pub min_random_segments: u32,
    pub max_random_segments: u32,
    /// Placement attempts before generation gives up
    pub max_placement_attempts: u32,
    pub brick_health: u32,
    pub base_health: u32,

    // === Waves ===
    pub levels: [LevelTier; LEVEL_TIERS],
    /// Pause between a cleared wave and the next spawn
    pub wave_clear_ticks: u32,

    // === Bullets ===
    pub bullet_pool_capacity: usize,
    pub player_bullet_range: f32,
    pub enemy_bullet_range: f32,
    pub bullet_max_lifetime: u32,
    pub player_bullet_speed: f32,
    pub rapid_fire_bullet_speed: f32,

    // === Player tank ===
    pub starting_lives: u32,
    pub max_lives: u32,
    /// Active ticks per regenerated life
    pub life_regen_ticks: u32,
    pub player_move_interval: u32,
    pub move_interval_floor: u32,
    pub player_fire_cooldown: u32,
    pub rapid_fire_cooldown: u32,
    pub player_max_bullets: u32,
    pub rapid_fire_max_bullets: u32,
    pub respawn_delay_ticks: u32,
    pub respawn_shield_ticks: u32,
    pub spawn_shield_ticks: u32,

    // === Power-ups ===
    pub shield_ticks: u32,
    pub rapid_fire_ticks: u32,
    pub power_ticks: u32,
    pub power_bullet_power: u32,
    pub cooldown_ticks: u32,
    pub cooldown_move_bonus: u32,
    pub freeze_ticks: u32,
    pub power_up_score: u64,
    pub bomb_score: u64,
    pub brick_drop_chance: f64,
    pub enemy_drop_chance: f64,
    pub field_power_up_chance: f64,
    pub max_field_power_ups: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            grid_width: GRID_WIDTH,
            grid_height: GRID_HEIGHT,
            min_random_segments: 69,
            max_random_segments: 119,
            max_placement_attempts: 20_000,
            brick_health: 2,
            base_health: 3,

            levels: DEFAULT_LEVELS,
            wave_clear_ticks: TICKS_PER_SECOND,

            bullet_pool_capacity: 50,
            player_bullet_range: 20.0,
            enemy_bullet_range: 10.0,
            bullet_max_lifetime: 300,
            player_bullet_speed: 0.2,
            rapid_fire_bullet_speed: 0.18,

            starting_lives: 3,
            max_lives: 5,
            life_regen_ticks: 300,
            player_move_interval: 6,
            move_interval_floor: 3,
            player_fire_cooldown: 18,
            rapid_fire_cooldown: 9,
            player_max_bullets: 1,
            rapid_fire_max_bullets: 3,
            respawn_delay_ticks: 120,
            respawn_shield_ticks: 600,
            spawn_shield_ticks: 180,

            shield_ticks: 600,
            rapid_fire_ticks: 600,
            power_ticks: 480,
            power_bullet_power: 2,
            cooldown_ticks: 300,
            cooldown_move_bonus: 2,
            freeze_ticks: 300,
            power_up_score: 500,
            bomb_score: 1000,
            brick_drop_chance: 0.2,
            enemy_drop_chance: 0.15,
            field_power_up_chance: 0.005,
            max_field_power_ups: 3,
        }
    }
}

impl Tuning {
    /// Highest configured level; later levels reuse it
    pub fn max_level(&self) -> u32 {
        LEVEL_TIERS as u32
    }

    /// Difficulty tier for a 1-based level index
    pub fn tier(&self, level: u32) -> LevelTier {
        let index = level.clamp(1, self.max_level()) - 1;
        self.levels[index as usize]
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.grid_width < MIN_GRID_SIZE || self.grid_height < MIN_GRID_SIZE {
            return Err(TuningError::Invalid("grid must be at least 25x25"));
        }
        if self.min_random_segments > self.max_random_segments {
            return Err(TuningError::Invalid("min_random_segments exceeds max_random_segments"));
        }
        if self.brick_health == 0 || self.base_health == 0 {
            return Err(TuningError::Invalid("brick and base health must be positive"));
        }
        if self.move_interval_floor == 0 {
            return Err(TuningError::Invalid("move_interval_floor must be positive"));
        }
        let chances = [
            self.brick_drop_chance,
            self.enemy_drop_chance,
            self.field_power_up_chance,
        ];
        if chances.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(TuningError::Invalid("drop chances must lie in 0..=1"));
        }
        for tier in &self.levels {
            if tier.spawn_interval == 0 {
                return Err(TuningError::Invalid("spawn_interval must be positive"));
            }
            if tier.max_per_wave == 0 || tier.max_enemies == 0 {
                return Err(TuningError::Invalid("max_per_wave and max_enemies must be positive"));
            }
            if tier.fire_cooldown_min > tier.fire_cooldown_max {
                return Err(TuningError::Invalid("fire cooldown range is inverted"));
            }
        }
        Ok(())
    }

    /// Parse and validate a tuning document; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load a tuning file from disk
    pub fn load(path: &Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Load a tuning file, falling back to defaults when absent or invalid
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("Using default tuning");
            return Self::default();
        }
        match Self::load(path) {
            Ok(tuning) => tuning,
            Err(err) => {
                log::warn!("Ignoring tuning file {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Write the tuning as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), TuningError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
