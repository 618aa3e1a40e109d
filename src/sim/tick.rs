//! Fixed timestep simulation tick
//!
//! One call advances the match by exactly one tick. Order within a tick:
//! timers and respawns, player intents, enemy AI, bullets, power-up pickup,
//! wave scheduling, random field drops, HUD.

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ai;
use super::collision;
use super::grid::Direction;
use super::state::{GameEvent, GamePhase, GameState, PowerUpKind, TankKind};
use super::tank::{self, PowerUpEffect};
use super::wave;
use crate::consts::SHAKE_DECAY;

/// What one player wants to do this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIntent {
    /// Turn toward and step in this direction
    pub move_dir: Option<Direction>,
    pub fire: bool,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    /// Intents by player slot; slot 1 is ignored in single-player matches
    pub players: [PlayerIntent; 2],
    /// Pause toggle
    pub pause: bool,
    /// Skip to next wave (debug/testing)
    pub skip_wave: bool,
    /// Demo mode - the autopilot drives every player
    pub idle_mode: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    if input.pause {
        state.toggle_pause();
    }
    if state.phase != GamePhase::Running {
        return;
    }

    let mut input = input.clone();
    if input.idle_mode {
        for (slot, intent) in input.players.iter_mut().enumerate() {
            *intent = ai::autopilot_intent(state, slot);
        }
    }
    let input = &input;

    if input.skip_wave {
        skip_wave(state);
    }

    state.time_ticks += 1;
    state.screen_shake = (state.screen_shake - SHAKE_DECAY).max(0.0);

    advance_timers(state);
    if state.phase == GamePhase::Running {
        apply_player_intents(state, input);
        ai::update_enemies(state);
        collision::resolve_bullets(state);
    }
    if state.phase == GamePhase::Running {
        collect_power_ups(state);
        wave::update_waves(state);
        spawn_field_power_up(state);
    }

    let hud = state.hud();
    state.emit(GameEvent::Hud(hud));
}

/// Count down every tank timer and bring back players whose delay ran out
fn advance_timers(state: &mut GameState) {
    for index in 0..state.tanks.len() {
        if tank::advance_timers(&mut state.tanks[index], &state.tuning) {
            respawn_player(state, index);
        }
    }
}

fn respawn_player(state: &mut GameState, index: usize) {
    let TankKind::Player { slot } = state.tanks[index].kind else {
        return;
    };
    let spawn = state.layout.player_spawns[slot];
    if tank::respawn(&state.grid, &mut state.tanks, index, spawn, &state.tuning) {
        log::debug!("Player {} respawned", slot + 1);
        state.emit(GameEvent::PlayerRespawned { slot });
        return;
    }

    log::warn!("Player {} could not respawn, spawn area blocked", slot + 1);
    state.emit(GameEvent::PlayerDown { slot, lives: 0 });
    if state.all_players_out() {
        state.trigger_game_over();
    }
}

fn apply_player_intents(state: &mut GameState, input: &TickInput) {
    let slots = if state.two_player { 2 } else { 1 };
    for (slot, intent) in input.players.iter().take(slots).enumerate() {
        let Some(index) = state.player_index(slot).filter(|&i| state.tanks[i].is_active()) else {
            continue;
        };
        if let Some(dir) = intent.move_dir {
            // Facing only changes when the tank could also step
            if state.tanks[index].move_cooldown == 0 {
                tank::turn(&mut state.tanks[index], dir);
                tank::move_tank(&state.grid, &mut state.tanks, index, dir, &state.tuning);
            }
        }
        if intent.fire {
            state.fire_tank(index);
        }
    }
}

/// Hand power-ups to any active player standing on them
fn collect_power_ups(state: &mut GameState) {
    let mut i = 0;
    while i < state.power_ups.len() {
        let power_up = state.power_ups[i];
        let collector = state
            .tanks
            .iter()
            .position(|t| t.is_player() && t.is_active() && t.cell == power_up.cell);
        match collector {
            Some(index) => {
                state.power_ups.remove(i);
                collect(state, index, power_up.kind);
            }
            None => i += 1,
        }
    }
}

fn collect(state: &mut GameState, index: usize, kind: PowerUpKind) {
    let Some(slot) = state.tanks[index].player_slot() else {
        return;
    };
    let effect = tank::apply_power_up(&mut state.tanks[index], kind, &state.tuning);
    match effect {
        PowerUpEffect::WipeEnemies => wipe_enemies(state),
        PowerUpEffect::FreezeEnemies => {
            let ticks = state.tuning.freeze_ticks;
            for enemy in state.tanks.iter_mut().filter(|t| t.is_enemy()) {
                enemy.frozen = ticks;
            }
        }
        PowerUpEffect::Applied | PowerUpEffect::NoEffect => {}
    }

    let score = match effect {
        PowerUpEffect::NoEffect => 0,
        _ => tank::power_up_score(kind, &state.tuning),
    };
    state.score += score;
    log::debug!("Player {} collected {:?} (+{})", slot + 1, kind, score);
    state.emit(GameEvent::PowerUpCollected { slot, kind, score });
}

/// Destroy every enemy on the field without awarding kill score
fn wipe_enemies(state: &mut GameState) {
    let enemies: Vec<_> = state
        .tanks
        .iter()
        .filter(|t| t.is_enemy())
        .map(|t| (t.id, t.center()))
        .collect();
    for (id, center) in enemies {
        state.explosion(center, 2.0);
        state.remove_tank(id);
    }
}

/// Occasionally drop a random power-up on a free cell
fn spawn_field_power_up(state: &mut GameState) {
    if state.power_ups.len() >= state.tuning.max_field_power_ups
        || !state.rng.random_bool(state.tuning.field_power_up_chance)
    {
        return;
    }
    let (width, height) = (state.grid.width(), state.grid.height());
    let cell = IVec2::new(
        state.rng.random_range(1..width - 1),
        state.rng.random_range(1..height - 1),
    );
    if state.can_enter(cell, None) {
        state.drop_power_up(cell);
    }
}

/// Debug: end the current wave immediately
fn skip_wave(state: &mut GameState) {
    let enemies: Vec<_> = state.tanks.iter().filter(|t| t.is_enemy()).map(|t| t.id).collect();
    for id in enemies {
        state.remove_tank(id);
    }
    state.bullets.clear();
    for tank in &mut state.tanks {
        tank.active_bullets = 0;
    }
    wave::clear_wave(state);
}
