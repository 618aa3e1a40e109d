//! Tank Arena headless runner
//!
//! Plays a seeded demo match with the autopilot at full speed, logging wave
//! progress and persisting the high score. The browser build drives the
//! library through `platform::web` instead.
//!
//! Usage: `tank-arena [seed] [max_ticks] [--two-player]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::path::Path;
    use std::time::{SystemTime, UNIX_EPOCH};

    use tank_arena::consts::TICKS_PER_SECOND;
    use tank_arena::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
    use tank_arena::{HighScore, Tuning};

    tank_arena::platform::init_logging();
    log::info!("Tank Arena (native) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let two_player = args.iter().any(|a| a == "--two-player");
    let mut numbers = args.iter().filter_map(|a| a.parse::<u64>().ok());
    let seed = numbers.next().unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    });
    let max_ticks = numbers.next().unwrap_or(u64::from(TICKS_PER_SECOND) * 60 * 10);

    let tuning = Tuning::load_or_default(Path::new("tank-arena-tuning.json"));
    let score_path = Path::new("tank-arena-highscore.json");
    let mut high_score = HighScore::load_or_default(score_path);

    let mut state = GameState::new(seed, tuning, high_score.best());
    if let Err(err) = state.start_match(two_player) {
        log::error!("Could not build the arena: {err}");
        std::process::exit(1);
    }
    log::info!("Game initialized with seed: {}", seed);

    let input = TickInput {
        idle_mode: true,
        ..TickInput::default()
    };
    let report_every = u64::from(TICKS_PER_SECOND) * 30;

    while state.time_ticks < max_ticks && state.phase == GamePhase::Running {
        tick(&mut state, &input);

        for event in state.drain_events() {
            match event {
                GameEvent::GameOver { score, .. } => {
                    if high_score.record(score) {
                        if let Err(err) = high_score.save_to(score_path) {
                            log::warn!("Could not save high score: {err}");
                        }
                    }
                }
                GameEvent::Hud(hud) if state.time_ticks % report_every == 0 => {
                    log::info!(
                        "[{:>5}s] lives {:?} score {} wave {} level {} x{}",
                        state.time_ticks / u64::from(TICKS_PER_SECOND),
                        hud.lives,
                        hud.score,
                        hud.wave,
                        hud.level,
                        hud.multiplier
                    );
                }
                _ => {}
            }
        }
    }

    println!(
        "seed {} | {} ticks | score {} | wave {} | level {} | best {}",
        seed,
        state.time_ticks,
        state.score,
        state.wave.wave,
        state.wave.level,
        high_score.best()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::wasm_start, this is just to satisfy the compiler
}
