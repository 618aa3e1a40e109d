//! Game state and core simulation types
//!
//! All state the tick pipeline mutates is owned by [`GameState`]. Entities
//! refer to each other by id, never by reference.

use glam::{IVec2, Vec2};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::grid::{Direction, Grid, cell_center};
use super::pool::{Pool, Poolable};
use super::tank;
use super::terrain::{self, Layout, TerrainError};
use super::wave::WaveState;
use crate::consts::*;
use crate::tuning::Tuning;

/// Unique tank id; never reused within a match
pub type TankId = u32;

/// Match lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for a match to start
    Menu,
    /// Active gameplay
    Running,
    /// Simulation frozen, nothing reset
    Paused,
    /// Base destroyed or all players out
    GameOver,
}

/// Enemy tank variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Basic,
    Armored,
    Fast,
    Heavy,
}

/// Per-variant enemy behavior table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub armor: u32,
    /// Ticks between AI decisions (lower is faster)
    pub move_interval: u32,
    /// Fire probability per decision at level 0
    pub shoot_chance: f64,
    pub score: u64,
    pub bullet_speed: f32,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 4] = [
        EnemyKind::Basic,
        EnemyKind::Armored,
        EnemyKind::Fast,
        EnemyKind::Heavy,
    ];

    pub fn stats(self) -> EnemyStats {
        match self {
            EnemyKind::Basic => EnemyStats {
                armor: 1,
                move_interval: 12,
                shoot_chance: 0.008,
                score: 100,
                bullet_speed: 0.08,
            },
            EnemyKind::Armored => EnemyStats {
                armor: 3,
                move_interval: 18,
                shoot_chance: 0.01,
                score: 200,
                bullet_speed: 0.10,
            },
            EnemyKind::Fast => EnemyStats {
                armor: 1,
                move_interval: 6,
                shoot_chance: 0.015,
                score: 300,
                bullet_speed: 0.12,
            },
            EnemyKind::Heavy => EnemyStats {
                armor: 5,
                move_interval: 20,
                shoot_chance: 0.007,
                score: 400,
                bullet_speed: 0.15,
            },
        }
    }
}

/// What an enemy drives toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    BaseDestroyer,
    PlayerHunter { target: TankId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TankKind {
    Player { slot: usize },
    Enemy { kind: EnemyKind, role: Role },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TankStatus {
    Active,
    /// Knocked out player waiting to re-enter
    Respawning { ticks: u32 },
    /// Permanently removed from play
    Out,
}

/// Timed tank modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierKind {
    Shield,
    RapidFire,
    Power,
    Cooldown,
}

/// Remaining ticks per modifier; zero means inactive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shield: u32,
    pub rapid_fire: u32,
    pub power: u32,
    pub cooldown: u32,
}

impl Modifiers {
    pub fn get(&self, kind: ModifierKind) -> u32 {
        match kind {
            ModifierKind::Shield => self.shield,
            ModifierKind::RapidFire => self.rapid_fire,
            ModifierKind::Power => self.power,
            ModifierKind::Cooldown => self.cooldown,
        }
    }

    /// Start a modifier, replacing any countdown already running
    pub fn set(&mut self, kind: ModifierKind, ticks: u32) {
        match kind {
            ModifierKind::Shield => self.shield = ticks,
            ModifierKind::RapidFire => self.rapid_fire = ticks,
            ModifierKind::Power => self.power = ticks,
            ModifierKind::Cooldown => self.cooldown = ticks,
        }
    }

    pub fn tick(&mut self) {
        self.shield = self.shield.saturating_sub(1);
        self.rapid_fire = self.rapid_fire.saturating_sub(1);
        self.power = self.power.saturating_sub(1);
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A player or enemy tank
#[derive(Debug, Clone, PartialEq)]
pub struct Tank {
    pub id: TankId,
    pub kind: TankKind,
    pub cell: IVec2,
    pub facing: Direction,
    /// Hit points; a player's armor is its life count
    pub armor: u32,
    pub move_cooldown: u32,
    pub fire_cooldown: u32,
    /// Bullets in flight owned by this tank
    pub active_bullets: u32,
    pub modifiers: Modifiers,
    /// Enemy freeze countdown (Clock power-up)
    pub frozen: u32,
    /// Ticks since the last AI decision
    pub ai_timer: u32,
    pub status: TankStatus,
    /// Active ticks toward the next regenerated life
    pub regen_ticks: u32,
    /// Enemy reload time, rolled from the level table at spawn
    pub fire_interval: u32,
}

impl Tank {
    pub fn player(id: TankId, slot: usize, cell: IVec2, tuning: &Tuning) -> Self {
        Self {
            id,
            kind: TankKind::Player { slot },
            cell,
            facing: Direction::Up,
            armor: tuning.starting_lives,
            move_cooldown: 0,
            fire_cooldown: 0,
            active_bullets: 0,
            modifiers: Modifiers::default(),
            frozen: 0,
            ai_timer: 0,
            status: TankStatus::Active,
            regen_ticks: 0,
            fire_interval: tuning.player_fire_cooldown,
        }
    }

    pub fn enemy(id: TankId, kind: EnemyKind, role: Role, cell: IVec2, fire_interval: u32) -> Self {
        Self {
            id,
            kind: TankKind::Enemy { kind, role },
            cell,
            facing: Direction::Down,
            armor: kind.stats().armor,
            move_cooldown: 0,
            fire_cooldown: 0,
            active_bullets: 0,
            modifiers: Modifiers::default(),
            frozen: 0,
            ai_timer: 0,
            status: TankStatus::Active,
            regen_ticks: 0,
            fire_interval,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, TankKind::Player { .. })
    }

    pub fn is_enemy(&self) -> bool {
        matches!(self.kind, TankKind::Enemy { .. })
    }

    pub fn is_active(&self) -> bool {
        self.status == TankStatus::Active
    }

    pub fn player_slot(&self) -> Option<usize> {
        match self.kind {
            TankKind::Player { slot } => Some(slot),
            TankKind::Enemy { .. } => None,
        }
    }

    pub fn enemy_kind(&self) -> Option<EnemyKind> {
        match self.kind {
            TankKind::Enemy { kind, .. } => Some(kind),
            TankKind::Player { .. } => None,
        }
    }

    pub fn is_shielded(&self) -> bool {
        self.modifiers.shield > 0
    }

    pub fn center(&self) -> Vec2 {
        cell_center(self.cell)
    }

    /// Spawn point for this tank's bullets
    pub fn barrel_tip(&self) -> Vec2 {
        self.center() + self.facing.unit() * BARREL_TIP
    }

    pub fn hit_radius(&self) -> f32 {
        if self.is_player() {
            PLAYER_HIT_RADIUS
        } else {
            ENEMY_HIT_RADIUS
        }
    }

    /// Movement cooldown applied after a step
    pub fn move_interval(&self, tuning: &Tuning) -> u32 {
        let base = match self.kind {
            TankKind::Player { .. } => tuning.player_move_interval,
            TankKind::Enemy { kind, .. } => kind.stats().move_interval,
        };
        if self.modifiers.cooldown > 0 {
            base.saturating_sub(tuning.cooldown_move_bonus)
                .max(tuning.move_interval_floor)
        } else {
            base
        }
    }

    /// Fire cooldown applied after a shot
    pub fn reload_ticks(&self, tuning: &Tuning) -> u32 {
        match self.kind {
            TankKind::Player { .. } if self.modifiers.rapid_fire > 0 => tuning.rapid_fire_cooldown,
            _ => self.fire_interval,
        }
    }

    pub fn bullet_cap(&self, tuning: &Tuning) -> u32 {
        match self.kind {
            TankKind::Player { .. } if self.modifiers.rapid_fire > 0 => tuning.rapid_fire_max_bullets,
            TankKind::Player { .. } => tuning.player_max_bullets,
            TankKind::Enemy { .. } => 1,
        }
    }

    pub fn bullet_power(&self, tuning: &Tuning) -> u32 {
        if self.modifiers.power > 0 {
            tuning.power_bullet_power
        } else {
            1
        }
    }

    pub fn bullet_speed(&self, tuning: &Tuning) -> f32 {
        match self.kind {
            TankKind::Player { .. } if self.modifiers.rapid_fire > 0 => tuning.rapid_fire_bullet_speed,
            TankKind::Player { .. } => tuning.player_bullet_speed,
            TankKind::Enemy { kind, .. } => kind.stats().bullet_speed,
        }
    }

    pub fn bullet_range(&self, tuning: &Tuning) -> f32 {
        if self.is_player() {
            tuning.player_bullet_range
        } else {
            tuning.enemy_bullet_range
        }
    }

    pub fn bullet_side(&self) -> BulletSide {
        if self.is_player() {
            BulletSide::Player
        } else {
            BulletSide::Enemy
        }
    }

    /// Stop every countdown the tank owns
    pub fn cancel_timers(&mut self) {
        self.move_cooldown = 0;
        self.fire_cooldown = 0;
        self.frozen = 0;
        self.ai_timer = 0;
        self.regen_ticks = 0;
        self.modifiers.clear();
    }
}

/// Which side fired a bullet; bullets are only reused within a side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BulletSide {
    Player,
    Enemy,
}

/// Initial values for a fired bullet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulletParams {
    pub pos: Vec2,
    pub dir: Direction,
    pub speed: f32,
    pub power: u32,
    pub owner: TankId,
    pub range: f32,
    pub max_age: u32,
}

/// A projectile in flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bullet {
    pub side: BulletSide,
    pub pos: Vec2,
    pub dir: Direction,
    pub speed: f32,
    pub power: u32,
    /// Weak owner reference; the owner may already be gone
    pub owner: TankId,
    pub range: f32,
    pub traveled: f32,
    pub age: u32,
    pub max_age: u32,
}

impl Bullet {
    /// Move one tick along the flight direction
    pub fn advance(&mut self) {
        self.age += 1;
        self.pos += self.dir.unit() * self.speed;
        self.traveled += self.speed;
    }
}

impl Poolable for Bullet {
    type Kind = BulletSide;
    type Params = BulletParams;

    fn create(side: BulletSide, p: BulletParams) -> Self {
        Self {
            side,
            pos: p.pos,
            dir: p.dir,
            speed: p.speed,
            power: p.power,
            owner: p.owner,
            range: p.range,
            traveled: 0.0,
            age: 0,
            max_age: p.max_age,
        }
    }

    fn kind(&self) -> BulletSide {
        self.side
    }

    fn reset(&mut self, p: BulletParams) {
        *self = Self::create(self.side, p);
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// +1 life when below the cap
    Health,
    /// Destroys every enemy on the field
    Bomb,
    /// Freezes every enemy
    Clock,
    Shield,
    RapidFire,
    /// Heavier bullets that pass fences
    Power,
    /// +1 life, capped
    Life,
    /// Shorter movement cooldown
    Cooldown,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 8] = [
        PowerUpKind::Health,
        PowerUpKind::Bomb,
        PowerUpKind::Clock,
        PowerUpKind::Shield,
        PowerUpKind::RapidFire,
        PowerUpKind::Power,
        PowerUpKind::Life,
        PowerUpKind::Cooldown,
    ];
}

/// A power-up lying on the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub cell: IVec2,
    pub kind: PowerUpKind,
}

/// Presentation effect kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Explosion,
    Spark,
    Hit,
    MuzzleFlash,
}

/// Per-tick HUD numbers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudSummary {
    /// Lives per player slot (0 for an absent second player)
    pub lives: [u32; 2],
    pub score: u64,
    pub level: u32,
    pub wave: u32,
    pub multiplier: u32,
}

/// Events emitted for presentation and persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Effect { kind: EffectKind, pos: Vec2, magnitude: f32 },
    CameraShake(f32),
    Hud(HudSummary),
    BaseHealthChanged { current: u32, max: u32 },
    PowerUpCollected { slot: usize, kind: PowerUpKind, score: u64 },
    EnemyDestroyed { id: TankId, kind: EnemyKind, score: u64 },
    PlayerDown { slot: usize, lives: u32 },
    PlayerRespawned { slot: usize },
    WaveCleared { wave: u32, level: u32 },
    GameOver { score: u64, new_high_score: bool },
}

/// Complete simulation state
#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub layout: Layout,
    pub phase: GamePhase,
    pub two_player: bool,
    /// Single random source for generation, AI, spawns and drops
    pub rng: Pcg32,
    pub grid: Grid,
    /// Tanks in creation order
    pub tanks: Vec<Tank>,
    pub bullets: Pool<Bullet>,
    pub power_ups: Vec<PowerUp>,
    pub wave: WaveState,
    pub score: u64,
    pub kill_streak: u32,
    pub base_health: u32,
    /// Best score known to the persistence layer
    pub high_score: u64,
    pub screen_shake: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a state in the menu with the given seed
    pub fn new(seed: u64, tuning: Tuning, high_score: u64) -> Self {
        let layout = Layout::for_size(tuning.grid_width, tuning.grid_height);
        Self {
            seed,
            layout,
            phase: GamePhase::Menu,
            two_player: false,
            rng: Pcg32::seed_from_u64(seed),
            grid: Grid::new(layout.width, layout.height, layout.base),
            tanks: Vec::new(),
            bullets: Pool::new(tuning.bullet_pool_capacity),
            power_ups: Vec::new(),
            wave: WaveState::default(),
            score: 0,
            kill_streak: 0,
            base_health: tuning.base_health,
            high_score,
            screen_shake: 0.0,
            time_ticks: 0,
            events: Vec::new(),
            next_id: 1,
            tuning,
        }
    }

    /// Generate the arena, place the players and begin play
    pub fn start_match(&mut self, two_player: bool) -> Result<(), TerrainError> {
        if self.phase != GamePhase::Menu {
            log::warn!("start_match ignored in phase {:?}", self.phase);
            return Ok(());
        }

        self.grid = terrain::generate(self.layout.width, self.layout.height, &self.tuning, &mut self.rng)?;
        self.two_player = two_player;

        let players = if two_player { 2 } else { 1 };
        let shield = self.tuning.spawn_shield_ticks;
        for slot in 0..players {
            let spawn = self.layout.player_spawns[slot];
            let id = self.add_player(slot, spawn);
            if let Some(tank) = self.tank_mut(id) {
                tank.modifiers.shield = shield;
            }
        }

        self.phase = GamePhase::Running;
        log::info!(
            "Match started (seed {}, {} player{})",
            self.seed,
            players,
            if two_player { "s" } else { "" }
        );
        self.emit(GameEvent::BaseHealthChanged {
            current: self.base_health,
            max: self.tuning.base_health,
        });
        let hud = self.hud();
        self.emit(GameEvent::Hud(hud));
        Ok(())
    }

    /// Flip between Running and Paused; other phases are unaffected
    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            GamePhase::Running => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Running,
            other => other,
        };
    }

    /// Drop all entities, terrain and counters and return to the menu
    pub fn reset(&mut self) {
        self.tanks.clear();
        self.bullets.clear();
        self.power_ups.clear();
        self.wave = WaveState::default();
        self.score = 0;
        self.kill_streak = 0;
        self.base_health = self.tuning.base_health;
        self.grid = Grid::new(self.layout.width, self.layout.height, self.layout.base);
        self.screen_shake = 0.0;
        self.time_ticks = 0;
        self.two_player = false;
        self.events.clear();
        self.phase = GamePhase::Menu;
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events emitted since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn tank_index(&self, id: TankId) -> Option<usize> {
        self.tanks.iter().position(|t| t.id == id)
    }

    pub fn tank(&self, id: TankId) -> Option<&Tank> {
        self.tanks.iter().find(|t| t.id == id)
    }

    pub fn tank_mut(&mut self, id: TankId) -> Option<&mut Tank> {
        self.tanks.iter_mut().find(|t| t.id == id)
    }

    /// Index of the player tank in `slot`, whatever its status
    pub fn player_index(&self, slot: usize) -> Option<usize> {
        self.tanks.iter().position(|t| t.player_slot() == Some(slot))
    }

    /// Ids of players currently on the field, by slot
    pub fn active_player_ids(&self) -> Vec<TankId> {
        let mut players: Vec<&Tank> = self
            .tanks
            .iter()
            .filter(|t| t.is_player() && t.is_active())
            .collect();
        players.sort_by_key(|t| t.player_slot());
        players.into_iter().map(|t| t.id).collect()
    }

    pub fn enemy_count(&self) -> usize {
        self.tanks.iter().filter(|t| t.is_enemy()).count()
    }

    /// An active tank other than `exclude` sits on `cell`
    pub fn is_occupied(&self, cell: IVec2, exclude: Option<TankId>) -> bool {
        self.tanks
            .iter()
            .any(|t| Some(t.id) != exclude && t.is_active() && t.cell == cell)
    }

    /// Empty terrain and no tank in the way
    pub fn can_enter(&self, cell: IVec2, exclude: Option<TankId>) -> bool {
        self.grid.is_passable(cell) && !self.is_occupied(cell, exclude)
    }

    pub fn add_player(&mut self, slot: usize, cell: IVec2) -> TankId {
        let id = self.next_entity_id();
        self.tanks.push(Tank::player(id, slot, cell, &self.tuning));
        id
    }

    pub fn add_enemy(&mut self, kind: EnemyKind, role: Role, cell: IVec2, fire_interval: u32) -> TankId {
        let id = self.next_entity_id();
        self.tanks.push(Tank::enemy(id, kind, role, cell, fire_interval));
        id
    }

    /// Remove a tank for good, stopping its countdowns first
    pub fn remove_tank(&mut self, id: TankId) {
        if let Some(index) = self.tank_index(id) {
            let mut tank = self.tanks.remove(index);
            tank.cancel_timers();
            tank.status = TankStatus::Out;
        }
    }

    /// Fire from the tank at `index`; emits a muzzle flash on success
    pub fn fire_tank(&mut self, index: usize) -> bool {
        let Some(shooter) = self.tanks.get_mut(index) else {
            return false;
        };
        if tank::fire(shooter, &mut self.bullets, &self.tuning).is_none() {
            return false;
        }
        let tip = shooter.barrel_tip();
        self.effect(EffectKind::MuzzleFlash, tip, 1.0);
        true
    }

    /// Put a power-up on an empty, unclaimed cell
    pub fn spawn_power_up(&mut self, cell: IVec2, kind: PowerUpKind) -> bool {
        if !self.grid.is_passable(cell) || self.power_ups.iter().any(|p| p.cell == cell) {
            return false;
        }
        let id = self.next_entity_id();
        self.power_ups.push(PowerUp { id, cell, kind });
        true
    }

    /// Drop a random power-up at `cell`
    pub fn drop_power_up(&mut self, cell: IVec2) -> bool {
        let kind = PowerUpKind::ALL[self.rng.random_range(0..PowerUpKind::ALL.len())];
        self.spawn_power_up(cell, kind)
    }

    pub fn effect(&mut self, kind: EffectKind, pos: Vec2, magnitude: f32) {
        self.emit(GameEvent::Effect { kind, pos, magnitude });
    }

    /// Explosion effect plus matching camera shake
    pub fn explosion(&mut self, pos: Vec2, magnitude: f32) {
        self.effect(EffectKind::Explosion, pos, magnitude);
        self.screen_shake = (self.screen_shake + magnitude * SHAKE_PER_MAGNITUDE).min(MAX_SCREEN_SHAKE);
        self.emit(GameEvent::CameraShake(self.screen_shake));
    }

    /// Score multiplier shown on the HUD
    pub fn multiplier(&self) -> u32 {
        self.kill_streak + 1
    }

    pub fn hud(&self) -> HudSummary {
        let mut lives = [0; 2];
        for tank in &self.tanks {
            if let Some(slot) = tank.player_slot() {
                if let Some(l) = lives.get_mut(slot) {
                    *l = tank.armor;
                }
            }
        }
        HudSummary {
            lives,
            score: self.score,
            level: self.wave.level,
            wave: self.wave.wave,
            multiplier: self.multiplier(),
        }
    }

    /// No player can come back
    pub fn all_players_out(&self) -> bool {
        self.tanks
            .iter()
            .filter(|t| t.is_player())
            .all(|t| t.status == TankStatus::Out)
    }

    /// Freeze the match and record a beaten high score
    pub fn trigger_game_over(&mut self) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.phase = GamePhase::GameOver;
        let new_high_score = self.score > self.high_score;
        if new_high_score {
            self.high_score = self.score;
        }
        log::info!(
            "Game over: score {} (wave {}, level {}){}",
            self.score,
            self.wave.wave,
            self.wave.level,
            if new_high_score { " - new high score" } else { "" }
        );
        self.emit(GameEvent::GameOver {
            score: self.score,
            new_high_score,
        });
    }

    /// Running state on an open 25x25 field with no tanks, for tests
    #[cfg(test)]
    pub(crate) fn sandbox(seed: u64) -> Self {
        let tuning = Tuning {
            grid_width: 25,
            grid_height: 25,
            min_random_segments: 5,
            max_random_segments: 10,
            ..Tuning::default()
        };
        let mut state = Self::new(seed, tuning, 0);
        state.phase = GamePhase::Running;
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_match_places_shielded_players() {
        let mut state = GameState::new(42, Tuning::default(), 0);
        state.start_match(true).unwrap();

        assert_eq!(state.phase, GamePhase::Running);
        let players: Vec<&Tank> = state.tanks.iter().filter(|t| t.is_player()).collect();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].cell, IVec2::new(20, 59));
        assert_eq!(players[1].cell, IVec2::new(40, 59));
        assert!(players.iter().all(|t| t.is_shielded() && t.armor == 3));
        assert!(state.grid.is_passable(IVec2::new(20, 59)));
    }

    #[test]
    fn test_start_match_only_from_menu() {
        let mut state = GameState::new(1, Tuning::default(), 0);
        state.start_match(false).unwrap();
        let tanks = state.tanks.len();
        state.start_match(false).unwrap();
        assert_eq!(state.tanks.len(), tanks);
    }

    #[test]
    fn test_pause_toggle() {
        let mut state = GameState::sandbox(1);
        state.toggle_pause();
        assert_eq!(state.phase, GamePhase::Paused);
        state.toggle_pause();
        assert_eq!(state.phase, GamePhase::Running);

        state.phase = GamePhase::Menu;
        state.toggle_pause();
        assert_eq!(state.phase, GamePhase::Menu);
    }

    #[test]
    fn test_reset_returns_to_menu() {
        let mut state = GameState::new(5, Tuning::default(), 1234);
        state.start_match(false).unwrap();
        state.score = 900;
        state.kill_streak = 4;
        state.spawn_power_up(IVec2::new(21, 59), PowerUpKind::Bomb);

        state.reset();
        assert_eq!(state.phase, GamePhase::Menu);
        assert!(state.tanks.is_empty());
        assert!(state.power_ups.is_empty());
        assert_eq!(state.score, 0);
        assert_eq!(state.multiplier(), 1);
        assert_eq!(state.high_score, 1234);
        assert_eq!(state.grid.count(crate::sim::grid::Cell::Base), 1);
        assert!(state.start_match(false).is_ok());
    }

    #[test]
    fn test_game_over_records_high_score_once() {
        let mut state = GameState::sandbox(1);
        state.high_score = 100;
        state.score = 250;
        state.trigger_game_over();
        state.trigger_game_over();

        assert_eq!(state.high_score, 250);
        let game_overs = state
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);
    }

    #[test]
    fn test_power_up_needs_free_cell() {
        let mut state = GameState::sandbox(1);
        let cell = IVec2::new(3, 3);
        assert!(state.spawn_power_up(cell, PowerUpKind::Life));
        assert!(!state.spawn_power_up(cell, PowerUpKind::Bomb));
        assert!(!state.spawn_power_up(state.layout.base, PowerUpKind::Bomb));
    }

    #[test]
    fn test_shake_is_capped() {
        let mut state = GameState::sandbox(1);
        for _ in 0..10 {
            state.explosion(Vec2::ZERO, 2.0);
        }
        assert_eq!(state.screen_shake, MAX_SCREEN_SHAKE);
    }

    #[test]
    fn test_enemy_stat_table() {
        assert_eq!(EnemyKind::Heavy.stats().armor, 5);
        assert_eq!(EnemyKind::Fast.stats().move_interval, 6);
        assert_eq!(EnemyKind::Armored.stats().score, 200);
    }
}
