//! Minesweeper with luck.
//!
//! With luck enabled, a click can be bent toward safety (or disaster): the
//! hidden mines are rearranged on the spot, as long as some arrangement
//! still agrees with every number the player has seen and with the total
//! mine count. Finding that arrangement is a 0/1 feasibility problem over
//! the hidden cells next to revealed numbers, solved under a time budget.

pub mod config;
pub mod constraints;
pub mod engine;
pub mod grid;
pub mod partition;
mod reveal;
pub mod sampler;
pub mod session;
pub mod solver;

pub use config::{LevelStep, Luck, Settings};
pub use engine::{Adjustment, try_adjust_mine};
pub use grid::{Cell, Grid, Point};
pub use session::{ClickOutcome, GameSession, GameState};
pub use solver::{Feasibility, FeasibilitySolver, SolverBackend};
