//! Browser entry point
//!
//! JS owns rendering, audio and the frame loop; it calls [`WebGame::tick`]
//! once per frame and drains events as JSON.

use wasm_bindgen::prelude::*;

use super::{decode_intent, init_logging};
use crate::highscores::HighScore;
use crate::sim::{GameEvent, GameState, TickInput, tick};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    init_logging();
    log::info!("Tank Arena starting...");
}

/// Game instance holding all state
#[wasm_bindgen]
pub struct WebGame {
    state: GameState,
    high_score: HighScore,
    idle_mode: bool,
}

#[wasm_bindgen]
impl WebGame {
    /// New game in the menu; `seed` is typically `Date.now()`
    #[wasm_bindgen(constructor)]
    pub fn new(seed: f64) -> WebGame {
        let high_score = HighScore::load();
        let seed = seed as u64;
        log::info!("Game initialized with seed: {}", seed);
        WebGame {
            state: GameState::new(seed, Tuning::default(), high_score.best()),
            high_score,
            idle_mode: false,
        }
    }

    /// Start a match from the menu. Returns false if the arena could not be built.
    pub fn start(&mut self, two_player: bool) -> bool {
        match self.state.start_match(two_player) {
            Ok(()) => true,
            Err(err) => {
                log::error!("Failed to start match: {err}");
                false
            }
        }
    }

    /// Advance one tick with compact intent codes per player
    pub fn tick(&mut self, player1: u8, player2: u8, pause: bool, skip_wave: bool) {
        let input = TickInput {
            players: [decode_intent(player1), decode_intent(player2)],
            pause,
            skip_wave,
            idle_mode: self.idle_mode,
        };
        tick(&mut self.state, &input);
    }

    pub fn set_idle_mode(&mut self, idle: bool) {
        self.idle_mode = idle;
        log::info!("Idle mode: {}", idle);
    }

    /// Events since the last call, as a JSON array. Persists a beaten high score.
    pub fn drain_events_json(&mut self) -> String {
        let events = self.state.drain_events();
        for event in &events {
            if let GameEvent::GameOver { score, .. } = event {
                if self.high_score.record(*score) {
                    self.high_score.save();
                }
            }
        }
        serde_json::to_string(&events).unwrap_or_else(|err| {
            log::error!("Failed to encode events: {err}");
            "[]".to_string()
        })
    }

    pub fn hud_json(&self) -> String {
        serde_json::to_string(&self.state.hud()).unwrap_or_default()
    }

    /// Current phase name ("Menu", "Running", "Paused", "GameOver")
    pub fn phase(&self) -> String {
        format!("{:?}", self.state.phase)
    }

    pub fn high_score(&self) -> f64 {
        self.high_score.best() as f64
    }

    /// Back to the menu with a fresh seed
    pub fn restart(&mut self, seed: f64) {
        self.state = GameState::new(seed as u64, self.state.tuning.clone(), self.high_score.best());
    }
}
