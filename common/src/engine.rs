//! Rearranging hidden mines so one cell gets the outcome the caller wants,
//! without contradicting anything the player has already seen.
//!
//! Hidden cells split into two groups. Shallow cells touch a revealed cell
//! and become solver variables, constrained by every revealed number around
//! them. Deep cells touch nothing revealed, so any arrangement of them is
//! as good as any other; once the shallow cells are settled the leftover
//! mines are scattered over the deep cells uniformly at random.
//!
//! The grid is only written after an arrangement is known to exist. Every
//! failure leaves it exactly as it was.

use rand::Rng;
use tracing::{debug, info, warn};

use crate::constraints::{self, Pin};
use crate::grid::{Grid, Point};
use crate::partition::{Depth, Partition};
use crate::sampler::sample_subset;
use crate::solver::{Feasibility, FeasibilitySolver};

/// What [`try_adjust_mine`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adjustment {
    /// The cell already had the requested status. Nothing changed.
    AlreadySatisfied,
    /// Deep mines were reshuffled without running the solver.
    Relocated,
    /// The solver produced an arrangement and it was committed.
    Solved,
    /// The request can never be met: the cell is revealed, there are no
    /// mines to move, or there is nowhere to move one to.
    Impossible,
    /// No arrangement agrees with the revealed numbers.
    Infeasible,
    /// The solver was cancelled. Handled like `Infeasible`; only the log differs.
    TimedOut,
    /// The backend reported an internal error, carried as text.
    SolverFailed(String),
}

impl Adjustment {
    /// True when the grid now reflects the request.
    pub fn succeeded(&self) -> bool {
        matches!(
            self,
            Adjustment::AlreadySatisfied | Adjustment::Relocated | Adjustment::Solved
        )
    }
}

/// Makes `at` a mine (or not, per `want_mine`) while keeping every revealed
/// number and the total mine count unchanged.
///
/// `cancel` is handed to the solver and polled while it runs. On success the
/// grid holds the new arrangement with consistent adjacency counts; on any
/// failure the grid is untouched.
pub fn try_adjust_mine<R: Rng + ?Sized>(
    grid: &mut Grid,
    rng: &mut R,
    solver: &mut dyn FeasibilitySolver,
    at: Point,
    want_mine: bool,
    cancel: &mut dyn FnMut() -> bool,
) -> Adjustment {
    let cell = *grid.cell(at);
    if cell.mine == want_mine {
        return Adjustment::AlreadySatisfied;
    }
    if cell.visible {
        debug!(x = at.x, y = at.y, "refusing to move a mine under a revealed cell");
        return Adjustment::Impossible;
    }
    let mut total_mines = grid.mines_total();
    if total_mines == 0 {
        warn!("no mines to move");
        return Adjustment::Impossible;
    }
    if total_mines == grid.area() && !want_mine {
        warn!("grid is full of mines; nowhere to move one");
        return Adjustment::Impossible;
    }

    let partition = Partition::scan(grid);
    assert_eq!(
        partition.mines(),
        total_mines,
        "every mine must be shallow or deep"
    );
    debug!(
        shallow = partition.shallow.len(),
        deep = partition.deep.len(),
        sources = partition.sources.len(),
        shallow_mines = partition.shallow_mines,
        deep_mines = partition.deep_mines,
        "partitioned hidden cells"
    );

    let clicked_is_deep = match partition.depth(at) {
        Some(depth) => depth == Depth::Deep,
        None => unreachable!("hidden cell ({}, {}) was not classified", at.x, at.y),
    };
    let mut deep_cells = partition.deep.len();
    if clicked_is_deep {
        // The clicked cell is decided by the caller; leave it out of the pool.
        deep_cells -= 1;
        if want_mine {
            total_mines -= 1;
        }
    }

    let shallow_assignment = if partition.sources.is_empty() {
        if total_mines > deep_cells {
            warn!("not enough hidden cells to absorb the mines");
            return Adjustment::Impossible;
        }
        None
    } else if clicked_is_deep && want_mine && partition.deep_mines > 0 {
        None
    } else if clicked_is_deep && !want_mine && partition.deep_mines < deep_cells {
        None
    } else {
        let pin = partition.variable(at).map(|variable| Pin {
            variable,
            mine: want_mine,
        });
        let problem = constraints::encode(grid, &partition, total_mines, deep_cells, pin);
        match solver.solve(&problem, cancel) {
            Ok(Feasibility::Feasible(assignment)) => {
                debug_assert!(problem.is_satisfied_by(&assignment));
                Some(assignment)
            }
            Ok(Feasibility::Infeasible) => {
                warn!(x = at.x, y = at.y, want_mine, "no compatible minefield configuration exists");
                return Adjustment::Infeasible;
            }
            Ok(Feasibility::TimedOut) => {
                warn!(x = at.x, y = at.y, want_mine, "computation timeout exceeded");
                return Adjustment::TimedOut;
            }
            Err(err) => {
                warn!(x = at.x, y = at.y, want_mine, "solver failed: {err:#}");
                return Adjustment::SolverFailed(format!("{err:#}"));
            }
        }
    };

    let shallow_mines = match &shallow_assignment {
        Some(assignment) => assignment.iter().filter(|&&mine| mine).count(),
        None => partition.shallow_mines,
    };
    let deep_mask = sample_subset(rng, deep_cells, total_mines - shallow_mines);

    let solved = shallow_assignment.is_some();
    if let Some(assignment) = shallow_assignment {
        for (&point, mine) in partition.shallow.iter().zip(assignment) {
            grid.cell_mut(point).mine = mine;
        }
    }
    let deep_points = partition.deep.iter().filter(|&&point| point != at);
    for (&point, mine) in deep_points.zip(deep_mask) {
        grid.cell_mut(point).mine = mine;
    }
    if clicked_is_deep {
        grid.cell_mut(at).mine = want_mine;
    }
    grid.recompute_all_adjacency();

    info!(x = at.x, y = at.y, want_mine, solved, "shuffled mines around");
    if solved {
        Adjustment::Solved
    } else {
        Adjustment::Relocated
    }
}
