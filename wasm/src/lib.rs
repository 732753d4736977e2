use luckysweeper as ls;
use wasm_bindgen::prelude::*;

/// Solver polls allowed per lucky click. The browser has no monotonic
/// clock reachable from std, so the budget counts work instead of time.
const NODE_BUDGET: u64 = 200_000;

fn load(bts: &[u8]) -> Result<ls::GameSession, String> {
    ls::GameSession::from_snapshot(bts).map_err(|e| e.to_string())
}

fn store(game: &ls::GameSession) -> Result<Vec<u8>, String> {
    game.snapshot().map_err(|e| e.to_string())
}

fn luck_from_code(luck: u8) -> ls::Luck {
    match luck {
        1 => ls::Luck::Great,
        2 => ls::Luck::Good,
        3 => ls::Luck::Bad,
        _ => ls::Luck::Neutral,
    }
}

fn outcome_code(outcome: ls::ClickOutcome) -> u8 {
    match outcome {
        ls::ClickOutcome::Ignored => 0,
        ls::ClickOutcome::Revealed => 1,
        ls::ClickOutcome::Exploded => 2,
        ls::ClickOutcome::Won => 3,
    }
}

#[wasm_bindgen]
pub fn create_game(size_level: u8, density_level: u8, luck: u8) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let settings = ls::Settings {
        size_level: usize::from(size_level).min(ls::config::MAX_LEVEL),
        density_level: usize::from(density_level).min(ls::config::MAX_LEVEL),
        luck: luck_from_code(luck),
        node_budget: Some(NODE_BUDGET),
        ..ls::Settings::default()
    };
    store(&ls::GameSession::new(settings))
}

/// Returns the new snapshot with the click outcome appended as its last byte.
#[wasm_bindgen]
pub fn click(bts: Vec<u8>, x: usize, y: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = load(&bts)?;
    let outcome = game.click(ls::Point { x, y });
    let mut xs = store(&game)?;
    xs.push(outcome_code(outcome));
    Ok(xs)
}

/// Returns the new snapshot with the chord outcome appended as its last byte.
#[wasm_bindgen]
pub fn chord(bts: Vec<u8>, x: usize, y: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = load(&bts)?;
    let outcome = game.chord_reveal(ls::Point { x, y });
    let mut xs = store(&game)?;
    xs.push(outcome_code(outcome));
    Ok(xs)
}

#[wasm_bindgen]
pub fn mark(bts: Vec<u8>, x: usize, y: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = load(&bts)?;
    game.cycle_mark(ls::Point { x, y });
    store(&game)
}

#[wasm_bindgen]
pub fn claim_victory(bts: Vec<u8>) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = load(&bts)?;
    game.claim_victory();
    store(&game)
}

/// 0 density up, 1 density down, 2 size up, 3 size down. A level that
/// moved starts a new game; at either end of a table nothing changes.
#[wasm_bindgen]
pub fn step_level(bts: Vec<u8>, step: u8) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let step = match step {
        0 => ls::LevelStep::DensityUp,
        1 => ls::LevelStep::DensityDown,
        2 => ls::LevelStep::SizeUp,
        3 => ls::LevelStep::SizeDown,
        _ => return Err(format!("unknown level step {step}")),
    };
    let mut game = load(&bts)?;
    game.step_level(step);
    store(&game)
}

/// Row-major cell codes: -1 hidden, -2 flag, -3 question mark, -4 mine
/// (shown after the game), -5 exploded, -6 wrong flag, 0..=8 revealed count.
#[wasm_bindgen]
pub fn get_cells(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let game = load(&bts)?;
    let over = game.state() != ls::GameState::Playing;
    Ok(game
        .grid()
        .cells()
        .map(|(_, cell)| {
            if cell.exploded {
                -5
            } else if cell.mistake {
                -6
            } else if cell.flag {
                -2
            } else if cell.question_mark {
                -3
            } else if cell.visible {
                cell.adjacent_mines as i8
            } else if over && cell.mine {
                -4
            } else {
                -1
            }
        })
        .collect())
}

#[wasm_bindgen]
pub fn width(bts: Vec<u8>) -> Result<usize, String> {
    Ok(load(&bts)?.grid().width())
}

/// 0 playing, 1 won, 2 lost.
#[wasm_bindgen]
pub fn status(bts: Vec<u8>) -> Result<u8, String> {
    Ok(match load(&bts)?.state() {
        ls::GameState::Playing => 0,
        ls::GameState::Won => 1,
        ls::GameState::Lost => 2,
    })
}

#[wasm_bindgen]
pub fn mines_displayed(bts: Vec<u8>) -> Result<i32, String> {
    Ok(load(&bts)?.mines_displayed() as i32)
}
