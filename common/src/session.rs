use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{LevelStep, Luck, Settings};
use crate::engine::{self, Adjustment};
use crate::grid::{Grid, Point};
use crate::solver::{Deadline, WorkBudget};

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// What a click or chord did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The click had no effect (game over, marked cell, already revealed...).
    Ignored,
    Revealed,
    Exploded,
    Won,
}

/// One player's game: the grid plus everything needed to play it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    grid: Grid,
    pub settings: Settings,
    state: GameState,
    first_move: bool,
    #[serde(skip, default = "StdRng::from_os_rng")]
    rng: StdRng,
}

impl GameSession {
    /// Starts a game from `settings` with an OS-seeded random source.
    pub fn new(settings: Settings) -> Self {
        Self::with_rng(settings, StdRng::from_os_rng())
    }

    pub fn with_rng(settings: Settings, rng: StdRng) -> Self {
        let (width, height) = settings.dimensions();
        let mut session = GameSession {
            grid: Grid::new(width, height),
            settings,
            state: GameState::Playing,
            first_move: true,
            rng,
        };
        session.restart();
        session
    }

    /// Deserializes a session from bytes. The random source is reseeded.
    pub fn from_snapshot(bts: &[u8]) -> anyhow::Result<Self> {
        Ok(bcs::from_bytes(bts)?)
    }

    /// Serializes the session (without its random source) to bytes.
    pub fn snapshot(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_first_move(&self) -> bool {
        self.first_move
    }

    /// Replaces the grid with a fresh one, each cell mined independently
    /// with probability `density` (clamped to `[0, 1]`).
    pub fn new_game(&mut self, width: usize, height: usize, density: f64) {
        let density = if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) };
        self.grid = Grid::new(width, height);
        for point in self.grid.points() {
            if self.rng.random_bool(density) {
                self.grid.place_mine(point);
            }
        }
        self.state = GameState::Playing;
        self.first_move = true;
        debug!(width, height, mines = self.grid.mines_total(), "new game");
    }

    /// A new game sized by the current settings.
    pub fn restart(&mut self) {
        let (width, height) = self.settings.dimensions();
        self.new_game(width, height, self.settings.density());
    }

    pub fn reveal(&mut self, at: Point) {
        self.grid.reveal(at);
    }

    pub fn try_adjust_mine(
        &mut self,
        at: Point,
        want_mine: bool,
        timeout: std::time::Duration,
    ) -> Adjustment {
        let deadline = Deadline::after(timeout);
        self.try_adjust_mine_with(at, want_mine, &mut || deadline.expired())
    }

    pub fn try_adjust_mine_with(
        &mut self,
        at: Point,
        want_mine: bool,
        cancel: &mut dyn FnMut() -> bool,
    ) -> Adjustment {
        let mut solver = self.settings.backend.build();
        engine::try_adjust_mine(
            &mut self.grid,
            &mut self.rng,
            solver.as_mut(),
            at,
            want_mine,
            cancel,
        )
    }

    /// Uses the node budget when one is configured, the wall clock otherwise.
    fn lucky_adjust(&mut self, at: Point, want_mine: bool) -> bool {
        let adjustment = match self.settings.node_budget {
            Some(polls) => {
                let mut budget = WorkBudget::new(polls);
                self.try_adjust_mine_with(at, want_mine, &mut || budget.exhausted())
            }
            None => self.try_adjust_mine(at, want_mine, self.settings.timeout),
        };
        adjustment.succeeded()
    }

    pub fn mines_total(&self) -> usize {
        self.grid.mines_total()
    }

    pub fn mines_remaining(&self) -> isize {
        self.grid.mines_remaining()
    }

    /// What the mine counter shows: remaining while playing, total after.
    pub fn mines_displayed(&self) -> isize {
        match self.state {
            GameState::Playing => self.mines_remaining(),
            _ => self.mines_total() as isize,
        }
    }

    /// An ordinary left click, bent by the configured luck.
    ///
    /// The first click of a game is always treated as great luck unless
    /// luck is bad. Good luck only helps next to cells already revealed.
    pub fn click(&mut self, at: Point) -> ClickOutcome {
        if self.state != GameState::Playing || !self.grid.contains(at) {
            return ClickOutcome::Ignored;
        }
        let cell = *self.grid.cell(at);
        if cell.is_marked() || cell.visible {
            return ClickOutcome::Ignored;
        }

        let luck = if self.first_move && self.settings.luck != Luck::Bad {
            Luck::Great
        } else {
            self.settings.luck
        };
        let force_mine = luck == Luck::Bad;
        let force_safe = luck == Luck::Great
            || (luck == Luck::Good && self.grid.count_adjacent_visible(at) > 0);

        let explode = if cell.mine {
            !(force_safe && self.lucky_adjust(at, false))
        } else {
            force_mine && self.lucky_adjust(at, true)
        };
        self.first_move = false;

        if explode {
            self.grid.cell_mut(at).exploded = true;
            self.end_game(false);
            return ClickOutcome::Exploded;
        }
        self.grid.reveal(at);
        self.check_cleared()
    }

    /// Reveals the unmarked neighbors of a revealed number once the player
    /// has flagged as many neighbors as it shows. Never consults the
    /// engine: chording gets no luck.
    pub fn chord_reveal(&mut self, at: Point) -> ClickOutcome {
        if self.state != GameState::Playing || !self.grid.contains(at) {
            return ClickOutcome::Ignored;
        }
        if !self.grid.cell(at).visible {
            return ClickOutcome::Ignored;
        }
        let neighbors: Vec<Point> = self.grid.neighbors(at).collect();
        if neighbors.iter().any(|&n| self.grid.cell(n).question_mark) {
            return ClickOutcome::Ignored;
        }
        if usize::from(self.grid.cell(at).adjacent_mines) != self.grid.count_adjacent_flags(at) {
            return ClickOutcome::Ignored;
        }

        let mut exploded = false;
        for neighbor in neighbors {
            let cell = *self.grid.cell(neighbor);
            if cell.visible || cell.is_marked() {
                continue;
            }
            if cell.mine {
                self.grid.cell_mut(neighbor).exploded = true;
                exploded = true;
            } else {
                self.grid.reveal(neighbor);
            }
        }

        if exploded {
            self.end_game(false);
            return ClickOutcome::Exploded;
        }
        self.check_cleared()
    }

    fn check_cleared(&mut self) -> ClickOutcome {
        if self.grid.all_safe_cells_visible() {
            self.end_game(true);
            ClickOutcome::Won
        } else {
            ClickOutcome::Revealed
        }
    }

    /// Cycles a hidden cell through flag, question mark (when enabled) and
    /// unmarked. Returns whether anything changed.
    pub fn cycle_mark(&mut self, at: Point) -> bool {
        if self.state != GameState::Playing || !self.grid.contains(at) {
            return false;
        }
        let question_marks = self.settings.question_marks;
        let cell = self.grid.cell_mut(at);
        if cell.visible {
            return false;
        }
        if cell.flag {
            cell.flag = false;
            cell.question_mark = question_marks;
        } else if cell.question_mark {
            cell.question_mark = false;
        } else {
            cell.flag = true;
        }
        true
    }

    /// The smiley button: while playing with every mine flagged, win iff the
    /// flags are exactly the mines; while playing otherwise, give up; once
    /// the game is over, start a new one.
    pub fn claim_victory(&mut self) -> GameState {
        match self.state {
            GameState::Playing if self.mines_remaining() == 0 => {
                let won = self.grid.cells().all(|(_, c)| c.flag == c.mine);
                self.end_game(won);
            }
            GameState::Playing => self.end_game(false),
            GameState::Won | GameState::Lost => self.restart(),
        }
        self.state
    }

    pub fn end_game(&mut self, won: bool) {
        self.state = if won { GameState::Won } else { GameState::Lost };
        self.grid.mark_flag_mistakes();
        debug!(won, "game over");
    }

    pub fn toggle_question_marks(&mut self) {
        self.settings.question_marks = !self.settings.question_marks;
        if !self.settings.question_marks {
            for cell in self.grid.cells_mut() {
                cell.question_mark = false;
            }
        }
    }

    pub fn cycle_luck(&mut self) -> Luck {
        self.settings.luck = self.settings.luck.next();
        self.settings.luck
    }

    /// Moves a density or size level and starts a new game if it moved.
    pub fn step_level(&mut self, step: LevelStep) -> bool {
        let moved = self.settings.step(step);
        if moved {
            self.restart();
        }
        moved
    }
}
