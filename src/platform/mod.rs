//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logger setup
//! - Compact input codes from JS
//! - The browser-facing game wrapper

use crate::sim::{Direction, PlayerIntent};

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Install the logger for the current platform
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    // A test harness or embedding app may already have one
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Install the logger for the current platform
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Bit set in an intent code when the player fires
pub const FIRE_BIT: u8 = 0b1000;

/// Decode a compact intent code: the low three bits select the move
/// (0 none, 1 up, 2 down, 3 left, 4 right), [`FIRE_BIT`] requests a shot.
pub fn decode_intent(code: u8) -> PlayerIntent {
    let move_dir = match code & 0b111 {
        1 => Some(Direction::Up),
        2 => Some(Direction::Down),
        3 => Some(Direction::Left),
        4 => Some(Direction::Right),
        _ => None,
    };
    PlayerIntent {
        move_dir,
        fire: code & FIRE_BIT != 0,
    }
}
