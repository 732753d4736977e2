use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::solver::SolverBackend;

/// How long a single click may spend looking for a lucky arrangement.
pub const COMPUTE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Mine probability per cell, by density level.
pub const MINE_DENSITY: [f64; 10] = [0., 0.05, 0.10, 0.12, 0.14, 0.17, 0.20, 0.25, 0.50, 1.];

/// (width, height) by size level.
pub const GRID_SIZES: [(usize, usize); 10] = [
    (5, 3),
    (8, 5),
    (13, 8),
    (21, 13),
    (34, 21),
    (55, 34),
    (89, 55),
    (144, 89),
    (233, 144),
    (377, 233),
];

pub const MAX_LEVEL: usize = 9;

/// Which way the engine bends the outcome of a click.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Luck {
    /// Mines stay where they are.
    #[default]
    Neutral,
    /// Every click is made safe when possible.
    Great,
    /// Clicks next to revealed cells are made safe when possible.
    Good,
    /// Every click is made a mine when possible.
    Bad,
}

impl Luck {
    pub fn next(self) -> Self {
        match self {
            Luck::Neutral => Luck::Great,
            Luck::Great => Luck::Good,
            Luck::Good => Luck::Bad,
            Luck::Bad => Luck::Neutral,
        }
    }
}

/// One press of a density or size +/- button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStep {
    DensityUp,
    DensityDown,
    SizeUp,
    SizeDown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub density_level: usize,
    pub size_level: usize,
    pub luck: Luck,
    pub question_marks: bool,
    pub timeout: Duration,
    /// Cancel after this many solver polls instead of watching the clock.
    pub node_budget: Option<u64>,
    pub backend: SolverBackend,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            density_level: 5,
            size_level: 4,
            luck: Luck::Neutral,
            question_marks: false,
            timeout: COMPUTE_TIMEOUT,
            node_budget: None,
            backend: SolverBackend::Search,
        }
    }
}

impl Settings {
    pub fn density(&self) -> f64 {
        MINE_DENSITY[self.density_level.min(MAX_LEVEL)]
    }

    pub fn dimensions(&self) -> (usize, usize) {
        GRID_SIZES[self.size_level.min(MAX_LEVEL)]
    }

    /// Returns whether the level moved.
    pub fn increment_density(&mut self) -> bool {
        step_up(&mut self.density_level)
    }

    pub fn decrement_density(&mut self) -> bool {
        step_down(&mut self.density_level)
    }

    pub fn increment_size(&mut self) -> bool {
        step_up(&mut self.size_level)
    }

    pub fn decrement_size(&mut self) -> bool {
        step_down(&mut self.size_level)
    }

    pub fn step(&mut self, step: LevelStep) -> bool {
        match step {
            LevelStep::DensityUp => self.increment_density(),
            LevelStep::DensityDown => self.decrement_density(),
            LevelStep::SizeUp => self.increment_size(),
            LevelStep::SizeDown => self.decrement_size(),
        }
    }
}

fn step_up(level: &mut usize) -> bool {
    if *level >= MAX_LEVEL {
        return false;
    }
    *level += 1;
    true
}

fn step_down(level: &mut usize) -> bool {
    if *level == 0 {
        return false;
    }
    *level -= 1;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.density(), 0.17);
        assert_eq!(settings.dimensions(), (34, 21));
        assert_eq!(settings.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_levels_clamp() {
        let mut settings = Settings::default();
        while settings.increment_size() {}
        assert_eq!(settings.size_level, MAX_LEVEL);
        assert!(!settings.increment_size());

        while settings.decrement_density() {}
        assert_eq!(settings.density(), 0.);
        assert!(settings.increment_density());
        assert_eq!(settings.density(), 0.05);
    }

    #[test]
    fn test_luck_cycles() {
        let mut luck = Luck::default();
        let mut seen = vec![luck];
        for _ in 0..4 {
            luck = luck.next();
            seen.push(luck);
        }
        assert_eq!(
            seen,
            vec![Luck::Neutral, Luck::Great, Luck::Good, Luck::Bad, Luck::Neutral]
        );
    }
}
