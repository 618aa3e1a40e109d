//! Wave scheduling and difficulty progression
//!
//! Enemies spawn on a fixed interval from one of three lanes until the wave
//! quota is met. Once every spawned enemy is gone the wave clears: the level
//! steps up (capped at the last tier), fresh terrain is laid, and play
//! resumes after a short breather.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ai;
use super::state::{EnemyKind, GameEvent, GameState, TankId};
use super::terrain;

/// Scheduler phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavePhase {
    Spawning,
    /// Breather between waves; counts down to the next wave
    WaveClear { ticks: u32 },
}

/// Wave progress counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveState {
    /// Difficulty level, 1-based
    pub level: u32,
    /// Wave number, 1-based
    pub wave: u32,
    /// Enemies spawned this wave
    pub spawned: u32,
    /// Ticks since the wave began
    pub timer: u32,
    pub phase: WavePhase,
}

impl Default for WaveState {
    fn default() -> Self {
        Self {
            level: 1,
            wave: 1,
            spawned: 0,
            timer: 0,
            phase: WavePhase::Spawning,
        }
    }
}

/// Advance the scheduler by one tick
pub fn update_waves(state: &mut GameState) {
    if let WavePhase::WaveClear { ticks } = state.wave.phase {
        state.wave.phase = if ticks > 1 {
            WavePhase::WaveClear { ticks: ticks - 1 }
        } else {
            WavePhase::Spawning
        };
        return;
    }

    state.wave.timer += 1;
    let tier = state.tuning.tier(state.wave.level);
    if state.wave.spawned < tier.max_per_wave && state.wave.timer % tier.spawn_interval == 0 {
        try_spawn_enemy(state);
    }

    if wave_complete(state) {
        clear_wave(state);
    }
}

/// Quota spawned and every enemy gone
pub fn wave_complete(state: &GameState) -> bool {
    let tier = state.tuning.tier(state.wave.level);
    state.wave.spawned >= tier.max_per_wave && state.enemy_count() == 0
}

/// Spawn a random enemy in a random lane if the caps allow and the lane is
/// free. A blocked lane skips this attempt without counting it.
pub fn try_spawn_enemy(state: &mut GameState) -> Option<TankId> {
    let tier = state.tuning.tier(state.wave.level);
    if state.enemy_count() >= tier.max_enemies || state.wave.spawned >= tier.max_per_wave {
        return None;
    }

    let lanes = state.layout.enemy_lanes;
    let lane = lanes[state.rng.random_range(0..lanes.len())];
    if !state.can_enter(lane, None) {
        log::trace!("Spawn lane {lane} blocked");
        return None;
    }

    let kind = EnemyKind::ALL[state.rng.random_range(0..EnemyKind::ALL.len())];
    let players = state.active_player_ids();
    let role = ai::roll_role(&mut state.rng, state.wave.level, &players);
    let fire_interval = state
        .rng
        .random_range(tier.fire_cooldown_min..=tier.fire_cooldown_max);

    let id = state.add_enemy(kind, role, lane, fire_interval);
    state.wave.spawned += 1;
    log::debug!(
        "Spawned {:?} ({:?}) at {} [{}/{}]",
        kind,
        role,
        lane,
        state.wave.spawned,
        tier.max_per_wave
    );
    Some(id)
}

/// Finish the current wave and set up the next one
pub fn clear_wave(state: &mut GameState) {
    let cleared = state.wave.wave;
    state.wave.wave += 1;
    state.wave.level = (state.wave.level + 1).min(state.tuning.max_level());
    state.wave.spawned = 0;
    state.wave.timer = 0;

    let keep: Vec<_> = state
        .tanks
        .iter()
        .filter(|t| t.is_active())
        .map(|t| t.cell)
        .chain(state.power_ups.iter().map(|p| p.cell))
        .collect();
    match terrain::refill(&mut state.grid, &keep, &state.tuning, &mut state.rng) {
        Ok(changed) => log::debug!("Terrain refill changed {changed} cells"),
        Err(err) => log::error!("Terrain refill failed, keeping the current map: {err}"),
    }

    log::info!(
        "Wave {} cleared, wave {} at level {}",
        cleared,
        state.wave.wave,
        state.wave.level
    );
    state.emit(GameEvent::WaveCleared {
        wave: cleared,
        level: state.wave.level,
    });

    state.wave.phase = match state.tuning.wave_clear_ticks {
        0 => WavePhase::Spawning,
        ticks => WavePhase::WaveClear { ticks },
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::Cell;
    use crate::sim::state::{EnemyKind, Role};
    use glam::IVec2;

    #[test]
    fn test_spawns_on_interval() {
        let mut state = GameState::sandbox(4);
        let interval = state.tuning.tier(1).spawn_interval;
        for _ in 0..interval - 1 {
            update_waves(&mut state);
        }
        assert_eq!(state.enemy_count(), 0);
        update_waves(&mut state);
        assert_eq!(state.enemy_count(), 1);
        assert_eq!(state.wave.spawned, 1);

        let enemy = state.tanks.iter().find(|t| t.is_enemy()).unwrap();
        assert!(state.layout.enemy_lanes.contains(&enemy.cell));
        assert!((120..=180).contains(&enemy.fire_interval));
    }

    #[test]
    fn test_blocked_lanes_do_not_count() {
        let mut state = GameState::sandbox(4);
        for lane in state.layout.enemy_lanes {
            state.grid.set(lane, Cell::Fence, 2);
        }
        for _ in 0..10 {
            assert!(try_spawn_enemy(&mut state).is_none());
        }
        assert_eq!(state.wave.spawned, 0);
    }

    #[test]
    fn test_concurrent_cap() {
        let mut state = GameState::sandbox(4);
        let max = state.tuning.tier(1).max_enemies;
        for i in 0..max {
            state.add_enemy(EnemyKind::Basic, Role::BaseDestroyer, IVec2::new(i as i32 + 1, 1), 100);
        }
        assert!(try_spawn_enemy(&mut state).is_none());
    }

    #[test]
    fn test_quota_never_exceeded() {
        let mut state = GameState::sandbox(4);
        let quota = state.tuning.tier(1).max_per_wave;
        for _ in 0..quota * 4 {
            try_spawn_enemy(&mut state);
            // Clear the field so only the quota limits spawning
            let enemies: Vec<_> = state.tanks.iter().filter(|t| t.is_enemy()).map(|t| t.id).collect();
            if state.wave.spawned < quota {
                for id in enemies {
                    state.remove_tank(id);
                }
            }
            assert!(state.wave.spawned <= quota);
        }
        assert_eq!(state.wave.spawned, quota);
    }

    #[test]
    fn test_wave_clear_advances_level() {
        let mut state = GameState::sandbox(4);
        state.wave.spawned = state.tuning.tier(1).max_per_wave;
        update_waves(&mut state);

        assert_eq!(state.wave.wave, 2);
        assert_eq!(state.wave.level, 2);
        assert_eq!(state.wave.spawned, 0);
        assert_eq!(state.wave.phase, WavePhase::WaveClear { ticks: 60 });
        assert!(state.events().iter().any(|e| matches!(e, GameEvent::WaveCleared { wave: 1, level: 2 })));

        // Breather, then spawning resumes
        for _ in 0..60 {
            update_waves(&mut state);
        }
        assert_eq!(state.wave.phase, WavePhase::Spawning);
        assert_eq!(state.wave.timer, 0);
    }

    #[test]
    fn test_wave_waits_for_last_enemy() {
        let mut state = GameState::sandbox(4);
        state.wave.spawned = state.tuning.tier(1).max_per_wave;
        let straggler = state.add_enemy(EnemyKind::Basic, Role::BaseDestroyer, IVec2::new(5, 5), 100);

        for _ in 0..10 {
            update_waves(&mut state);
        }
        assert_eq!(state.wave.wave, 1);
        assert_eq!(state.wave.level, 1);
        assert_eq!(state.wave.phase, WavePhase::Spawning);
        assert_eq!(state.enemy_count(), 1);

        state.remove_tank(straggler);
        update_waves(&mut state);
        assert_eq!(state.wave.wave, 2);
        assert_eq!(state.wave.level, 2);
        assert_eq!(state.wave.phase, WavePhase::WaveClear { ticks: 60 });
    }

    #[test]
    fn test_level_capped() {
        let mut state = GameState::sandbox(4);
        for _ in 0..8 {
            clear_wave(&mut state);
        }
        assert_eq!(state.wave.level, 5);
        assert_eq!(state.wave.wave, 9);
    }

    #[test]
    fn test_refill_keeps_tanks_and_base() {
        let mut state = GameState::sandbox(4);
        let player = IVec2::new(7, 7);
        state.add_player(0, player);
        state.grid.set(IVec2::new(3, 3), Cell::Destructible, 2);
        state.grid.damage(IVec2::new(3, 3), 1);

        clear_wave(&mut state);
        assert_eq!(state.grid.get(player), Some(Cell::Empty));
        assert_eq!(state.grid.get(state.grid.base()), Some(Cell::Base));
        assert_eq!(state.grid.health(IVec2::new(3, 3)), 1);
    }
}
