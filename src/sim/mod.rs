//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (tank creation order, pool slot order)
//! - No rendering or platform dependencies

pub mod ai;
pub mod collision;
pub mod grid;
pub mod pathfind;
pub mod pool;
pub mod state;
pub mod tank;
pub mod terrain;
pub mod tick;
pub mod wave;

pub use collision::{BulletResolution, Termination, check_termination, resolve_bullets};
pub use grid::{Cell, Direction, Grid, cell_at, cell_center};
pub use pathfind::first_step;
pub use pool::{Handle, Pool, PoolStats, Poolable, SlotState};
pub use state::{
    Bullet, BulletSide, EffectKind, EnemyKind, GameEvent, GamePhase, GameState, HudSummary,
    Modifiers, PowerUp, PowerUpKind, Role, Tank, TankId, TankKind, TankStatus,
};
pub use tank::{HitOutcome, PowerUpEffect};
pub use terrain::{Layout, TerrainError};
pub use tick::{PlayerIntent, TickInput, tick};
pub use wave::{WavePhase, WaveState};
