//! Bullet flight and termination
//!
//! Each live bullet advances once per tick and is then checked against, in
//! order: range and arena bounds, terrain, the base, tanks, and lifetime.
//! The first match ends the bullet.

use glam::{IVec2, Vec2};
use rand::Rng;

use super::grid::{Cell, Grid, cell_at, cell_center};
use super::pool::Handle;
use super::state::{Bullet, EffectKind, GameEvent, GamePhase, GameState, Tank, TankId, TankKind};
use super::tank::{self, HitOutcome};

/// Why a bullet stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Out of range or outside the arena
    Boundary,
    /// Hit a brick or a fence it can't pass
    Terrain { cell: IVec2 },
    Base,
    Tank { id: TankId },
    /// Exceeded its lifetime
    Timeout,
}

/// A bullet that ended this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulletResolution {
    pub handle: Handle,
    pub owner: TankId,
    pub pos: Vec2,
    pub termination: Termination,
}

/// First termination condition that applies to `bullet`, if any
pub fn check_termination(grid: &Grid, tanks: &[Tank], bullet: &Bullet) -> Option<Termination> {
    let pos = bullet.pos;
    let outside = pos.x < 0.0 || pos.y < 0.0 || pos.x >= grid.width() as f32 || pos.y >= grid.height() as f32;
    if bullet.traveled > bullet.range || outside {
        return Some(Termination::Boundary);
    }

    let cell = cell_at(pos);
    match grid.get(cell) {
        Some(terrain) if terrain.stops_bullet(bullet.power) => return Some(Termination::Terrain { cell }),
        Some(Cell::Base) => return Some(Termination::Base),
        _ => {}
    }

    if let Some(target) = tanks
        .iter()
        .find(|t| t.is_active() && t.id != bullet.owner && t.center().distance(pos) < t.hit_radius())
    {
        return Some(Termination::Tank { id: target.id });
    }

    if bullet.age > bullet.max_age {
        return Some(Termination::Timeout);
    }
    None
}

/// Advance every live bullet and apply the consequences of those that stop.
///
/// Stops early once a bullet ends the match; the rest stay frozen in flight
/// so the final score matches the one reported with `GameOver`.
pub fn resolve_bullets(state: &mut GameState) -> Vec<BulletResolution> {
    let mut resolved = Vec::new();

    for handle in state.bullets.active_handles() {
        if state.phase == GamePhase::GameOver {
            break;
        }
        let Some(bullet) = state.bullets.get_mut(handle) else {
            continue;
        };
        bullet.advance();
        let bullet = *bullet;

        let Some(termination) = check_termination(&state.grid, &state.tanks, &bullet) else {
            continue;
        };

        state.bullets.release(handle);
        if let Some(owner) = state.tank_mut(bullet.owner) {
            owner.active_bullets = owner.active_bullets.saturating_sub(1);
        }
        apply_termination(state, &bullet, termination);

        resolved.push(BulletResolution {
            handle,
            owner: bullet.owner,
            pos: bullet.pos,
            termination,
        });
    }
    resolved
}

fn apply_termination(state: &mut GameState, bullet: &Bullet, termination: Termination) {
    match termination {
        Termination::Boundary | Termination::Timeout => {}
        Termination::Terrain { cell } => hit_terrain(state, bullet, cell),
        Termination::Base => hit_base(state, bullet),
        Termination::Tank { id } => hit_tank(state, bullet, id),
    }
}

fn hit_terrain(state: &mut GameState, bullet: &Bullet, cell: IVec2) {
    match state.grid.damage(cell, bullet.power) {
        Some(true) => {
            state.explosion(cell_center(cell), 1.0);
            if state.rng.random_bool(state.tuning.brick_drop_chance) {
                state.drop_power_up(cell);
            }
        }
        // Damaged brick or a fence
        _ => state.effect(EffectKind::Spark, bullet.pos, 0.5),
    }
}

fn hit_base(state: &mut GameState, bullet: &Bullet) {
    state.base_health = state.base_health.saturating_sub(bullet.power);
    state.emit(GameEvent::BaseHealthChanged {
        current: state.base_health,
        max: state.tuning.base_health,
    });
    state.explosion(cell_center(state.grid.base()), 1.5);
    log::debug!("Base hit, {} health left", state.base_health);

    if state.base_health == 0 {
        state.trigger_game_over();
    }
}

fn hit_tank(state: &mut GameState, bullet: &Bullet, id: TankId) {
    let Some(index) = state.tank_index(id) else {
        return;
    };
    let outcome = tank::apply_hit(&mut state.tanks[index], bullet.power, &state.tuning);
    let target = &state.tanks[index];
    let (center, cell, kind, armor) = (target.center(), target.cell, target.kind, target.armor);

    match (outcome, kind) {
        (HitOutcome::Absorbed, _) => state.effect(EffectKind::Spark, bullet.pos, 0.5),
        (HitOutcome::Damaged { .. }, _) => state.effect(EffectKind::Hit, center, 1.0),
        (HitOutcome::Destroyed, TankKind::Enemy { kind, .. }) => {
            let award = kind.stats().score * u64::from(state.multiplier());
            state.score += award;
            state.kill_streak += 1;
            state.explosion(center, 2.0);
            state.emit(GameEvent::EnemyDestroyed { id, kind, score: award });
            state.remove_tank(id);
            if state.rng.random_bool(state.tuning.enemy_drop_chance) {
                state.drop_power_up(cell);
            }
        }
        (HitOutcome::Destroyed, TankKind::Player { slot }) => {
            state.kill_streak = 0;
            state.explosion(center, 2.0);
            state.emit(GameEvent::PlayerDown { slot, lives: armor });
            log::info!("Player {} down, {} lives left", slot + 1, armor);
            if state.all_players_out() {
                state.trigger_game_over();
            }
        }
    }
}
