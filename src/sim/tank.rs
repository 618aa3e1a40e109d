//! Tank actions: turning, moving, firing, taking hits and power-ups
//!
//! These work on individual tanks (or the tank list when occupancy matters)
//! so the tick pipeline, AI and tests can drive them directly.

use glam::IVec2;

use super::grid::{Direction, Grid};
use super::pool::{Handle, Pool};
use super::state::{Bullet, BulletParams, ModifierKind, PowerUpKind, Tank, TankKind, TankStatus};
use crate::tuning::Tuning;

/// Result of a bullet striking a tank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Shielded or not in play; nothing changed
    Absorbed,
    /// Armor left after the hit
    Damaged { armor: u32 },
    /// Enemy destroyed or player knocked out
    Destroyed,
}

/// What a collected power-up asks of the rest of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpEffect {
    Applied,
    /// Collected but nothing changed (life already full)
    NoEffect,
    WipeEnemies,
    FreezeEnemies,
}

/// Face `dir` without moving
pub fn turn(tank: &mut Tank, dir: Direction) {
    tank.facing = dir;
}

/// Step the tank at `index` one cell toward `dir`.
///
/// Fails without touching anything when the move cooldown is running, the
/// destination is out of bounds or not empty terrain, or another active tank
/// occupies it. Turning is separate; see [`turn`].
pub fn move_tank(grid: &Grid, tanks: &mut [Tank], index: usize, dir: Direction, tuning: &Tuning) -> bool {
    let Some(tank) = tanks.get(index) else {
        return false;
    };
    if !tank.is_active() || tank.move_cooldown > 0 {
        return false;
    }
    let dest = tank.cell + dir.offset();
    if !grid.is_passable(dest) {
        return false;
    }
    let id = tank.id;
    if tanks.iter().any(|t| t.id != id && t.is_active() && t.cell == dest) {
        return false;
    }

    let tank = &mut tanks[index];
    tank.cell = dest;
    tank.move_cooldown = tank.move_interval(tuning);
    true
}

/// Launch a bullet from the barrel tip if the cooldown and bullet cap allow
pub fn fire(tank: &mut Tank, bullets: &mut Pool<Bullet>, tuning: &Tuning) -> Option<Handle> {
    if !tank.is_active() || tank.fire_cooldown > 0 || tank.active_bullets >= tank.bullet_cap(tuning) {
        return None;
    }

    let params = BulletParams {
        pos: tank.barrel_tip(),
        dir: tank.facing,
        speed: tank.bullet_speed(tuning),
        power: tank.bullet_power(tuning),
        owner: tank.id,
        range: tank.bullet_range(tuning),
        max_age: tuning.bullet_max_lifetime,
    };
    let handle = bullets.acquire(tank.bullet_side(), params);
    tank.active_bullets += 1;
    tank.fire_cooldown = tank.reload_ticks(tuning);
    Some(handle)
}

/// Apply a bullet of `power` to a tank.
///
/// Players are knocked out by any unshielded hit: they lose `power` lives
/// and wait to respawn, or leave play when none remain. Enemies lose armor
/// and are destroyed at zero.
pub fn apply_hit(tank: &mut Tank, power: u32, tuning: &Tuning) -> HitOutcome {
    if !tank.is_active() || tank.is_shielded() {
        return HitOutcome::Absorbed;
    }
    tank.armor = tank.armor.saturating_sub(power);

    match tank.kind {
        TankKind::Player { .. } => {
            tank.cancel_timers();
            tank.status = if tank.armor > 0 {
                TankStatus::Respawning {
                    ticks: tuning.respawn_delay_ticks.max(1),
                }
            } else {
                TankStatus::Out
            };
            HitOutcome::Destroyed
        }
        TankKind::Enemy { .. } if tank.armor == 0 => {
            tank.cancel_timers();
            tank.status = TankStatus::Out;
            HitOutcome::Destroyed
        }
        TankKind::Enemy { .. } => HitOutcome::Damaged { armor: tank.armor },
    }
}

/// Apply a power-up to the collecting tank. Timed effects replace any
/// countdown already running rather than stacking.
pub fn apply_power_up(tank: &mut Tank, kind: PowerUpKind, tuning: &Tuning) -> PowerUpEffect {
    match kind {
        PowerUpKind::Health => {
            if tank.armor >= tuning.max_lives {
                return PowerUpEffect::NoEffect;
            }
            tank.armor += 1;
        }
        PowerUpKind::Life => tank.armor = (tank.armor + 1).min(tuning.max_lives),
        PowerUpKind::Shield => tank.modifiers.set(ModifierKind::Shield, tuning.shield_ticks),
        PowerUpKind::RapidFire => tank.modifiers.set(ModifierKind::RapidFire, tuning.rapid_fire_ticks),
        PowerUpKind::Power => tank.modifiers.set(ModifierKind::Power, tuning.power_ticks),
        PowerUpKind::Cooldown => {
            tank.modifiers.set(ModifierKind::Cooldown, tuning.cooldown_ticks);
            tank.move_cooldown = tank.move_cooldown.min(tank.move_interval(tuning));
        }
        PowerUpKind::Bomb => return PowerUpEffect::WipeEnemies,
        PowerUpKind::Clock => return PowerUpEffect::FreezeEnemies,
    }
    PowerUpEffect::Applied
}

/// Score awarded for collecting `kind`
pub fn power_up_score(kind: PowerUpKind, tuning: &Tuning) -> u64 {
    match kind {
        PowerUpKind::Bomb => tuning.bomb_score,
        _ => tuning.power_up_score,
    }
}

/// Count every tank countdown down by one tick. Returns true when a
/// knocked-out player is due to respawn.
pub fn advance_timers(tank: &mut Tank, tuning: &Tuning) -> bool {
    match tank.status {
        TankStatus::Respawning { ticks } if ticks <= 1 => return true,
        TankStatus::Respawning { ticks } => {
            tank.status = TankStatus::Respawning { ticks: ticks - 1 };
            return false;
        }
        TankStatus::Out => return false,
        TankStatus::Active => {}
    }

    tank.move_cooldown = tank.move_cooldown.saturating_sub(1);
    tank.fire_cooldown = tank.fire_cooldown.saturating_sub(1);
    tank.frozen = tank.frozen.saturating_sub(1);
    tank.modifiers.tick();

    if tank.is_player() && tank.armor < tuning.max_lives {
        tank.regen_ticks += 1;
        if tank.regen_ticks >= tuning.life_regen_ticks {
            tank.armor += 1;
            tank.regen_ticks = 0;
        }
    }
    false
}

/// Bring the player at `index` back at `spawn`, or the first free neighbor
/// (left, right, up, down). When every candidate is blocked the player is
/// out for good.
pub fn respawn(grid: &Grid, tanks: &mut [Tank], index: usize, spawn: IVec2, tuning: &Tuning) -> bool {
    let Some(id) = tanks.get(index).map(|t| t.id) else {
        return false;
    };
    let candidates = [
        spawn,
        spawn + IVec2::NEG_X,
        spawn + IVec2::X,
        spawn + IVec2::NEG_Y,
        spawn + IVec2::Y,
    ];
    let target = candidates.into_iter().find(|&cell| {
        grid.is_passable(cell) && !tanks.iter().any(|t| t.id != id && t.is_active() && t.cell == cell)
    });

    let tank = &mut tanks[index];
    tank.cancel_timers();
    match target {
        Some(cell) => {
            tank.cell = cell;
            tank.facing = Direction::Up;
            tank.status = TankStatus::Active;
            tank.modifiers.set(ModifierKind::Shield, tuning.respawn_shield_ticks);
            true
        }
        None => {
            tank.armor = 0;
            tank.status = TankStatus::Out;
            false
        }
    }
}
