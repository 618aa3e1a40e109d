//! Enemy decision making and the demo autopilot
//!
//! Enemies decide on a timer set by their kind: pick a target from their
//! role, take the first step of a shortest path toward it (or a random legal
//! step when boxed in), then maybe fire.

use glam::IVec2;
use rand::Rng;

use super::grid::{Cell, Direction, Grid};
use super::pathfind;
use super::state::{GameState, Role, TankId, TankKind};
use super::tank;
use super::tick::PlayerIntent;

/// Base chance of a new enemy going for the base instead of a player
const BASE_DESTROYER_CHANCE: f64 = 0.3;
/// Added per level above the first
const BASE_DESTROYER_PER_LEVEL: f64 = 0.05;
/// Fire chance grows by this fraction per level
const FIRE_CHANCE_PER_LEVEL: f64 = 0.1;

/// Pick a role for a freshly spawned enemy. `players` lists active player
/// ids by slot; with none, every enemy targets the base.
pub fn roll_role<R: Rng>(rng: &mut R, level: u32, players: &[TankId]) -> Role {
    let chance = BASE_DESTROYER_CHANCE + f64::from(level.saturating_sub(1)) * BASE_DESTROYER_PER_LEVEL;
    if players.is_empty() || rng.random_bool(chance.clamp(0.0, 1.0)) {
        return Role::BaseDestroyer;
    }
    let target = if players.len() > 1 && rng.random_bool(0.5) {
        players[1]
    } else {
        players[0]
    };
    Role::PlayerHunter { target }
}

/// Run one AI update for every active enemy, in creation order
pub fn update_enemies(state: &mut GameState) {
    let enemies: Vec<TankId> = state
        .tanks
        .iter()
        .filter(|t| t.is_enemy() && t.is_active())
        .map(|t| t.id)
        .collect();

    for id in enemies {
        // An earlier enemy may have destroyed this one
        let Some(index) = state.tank_index(id) else {
            continue;
        };
        think(state, index);
    }
}

fn think(state: &mut GameState, index: usize) {
    let level = state.wave.level;
    let tank = &mut state.tanks[index];
    if !tank.is_active() || tank.frozen > 0 {
        return;
    }
    let Some(kind) = tank.enemy_kind() else {
        return;
    };
    let stats = kind.stats();

    tank.ai_timer += 1;
    if tank.ai_timer < stats.move_interval {
        return;
    }
    tank.ai_timer = 0;

    let (id, start) = (tank.id, tank.cell);
    let target = resolve_target(state, index);

    let step = {
        let (grid, tanks) = (&state.grid, &state.tanks);
        let open = |cell: IVec2| grid.is_passable(cell) && !tanks.iter().any(|t| t.id != id && t.is_active() && t.cell == cell);
        pathfind::first_step(grid, start, target, open)
    };
    let step = match step {
        Some(dir) => Some(dir),
        None => {
            let legal = pathfind::legal_moves(start, |cell| state.can_enter(cell, Some(id)));
            (!legal.is_empty()).then(|| legal[state.rng.random_range(0..legal.len())])
        }
    };

    if let Some(dir) = step {
        tank::turn(&mut state.tanks[index], dir);
        tank::move_tank(&state.grid, &mut state.tanks, index, dir, &state.tuning);
    }

    let chance = stats.shoot_chance * (1.0 + f64::from(level) * FIRE_CHANCE_PER_LEVEL);
    if state.rng.random_bool(chance.clamp(0.0, 1.0)) {
        state.fire_tank(index);
    }
}

/// Cell the enemy at `index` is heading for. A hunter whose player is gone
/// switches to another active player, or falls back to the base.
fn resolve_target(state: &mut GameState, index: usize) -> IVec2 {
    let base = state.grid.base();
    let TankKind::Enemy { role, .. } = state.tanks[index].kind else {
        return base;
    };
    let Role::PlayerHunter { target } = role else {
        return base;
    };

    if let Some(player) = state.tank(target).filter(|t| t.is_active()) {
        return player.cell;
    }
    let Some((player, cell)) = state
        .tanks
        .iter()
        .find(|t| t.is_player() && t.is_active())
        .map(|t| (t.id, t.cell))
    else {
        return base;
    };
    if let TankKind::Enemy { role, .. } = &mut state.tanks[index].kind {
        *role = Role::PlayerHunter { target: player };
    }
    cell
}

/// Intent for a computer-driven player in demo mode: shoot enemies lined up
/// with a clear shot, otherwise drive toward the nearest one.
pub fn autopilot_intent(state: &GameState, slot: usize) -> PlayerIntent {
    let Some(me) = state
        .tanks
        .iter()
        .find(|t| t.player_slot() == Some(slot) && t.is_active())
    else {
        return PlayerIntent::default();
    };
    let enemies = || state.tanks.iter().filter(|t| t.is_enemy() && t.is_active());

    if let Some(dir) = enemies().find_map(|e| line_of_fire(&state.grid, me.cell, e.cell)) {
        return PlayerIntent {
            move_dir: Some(dir),
            fire: true,
        };
    }

    let Some(nearest) = enemies().min_by_key(|e| (e.cell - me.cell).abs().element_sum()) else {
        return PlayerIntent::default();
    };
    let step = pathfind::first_step(&state.grid, me.cell, nearest.cell, |cell| {
        state.can_enter(cell, Some(me.id))
    });
    // Boxed in: shoot whatever is ahead
    PlayerIntent {
        move_dir: step,
        fire: step.is_none(),
    }
}

/// Direction from `from` to `to` when they share a row or column and no
/// terrain in between would stop a standard bullet
fn line_of_fire(grid: &Grid, from: IVec2, to: IVec2) -> Option<Direction> {
    if from == to || (from.x != to.x && from.y != to.y) {
        return None;
    }
    let dir = Direction::from_offset((to - from).signum())?;
    let mut cell = from + dir.offset();
    while cell != to {
        match grid.get(cell)? {
            c if c.stops_bullet(1) => return None,
            Cell::Base => return None,
            _ => {}
        }
        cell += dir.offset();
    }
    Some(dir)
}
