//! Binary feasibility solving for the mine placement problem.
//!
//! Backends only answer "is there a 0/1 vector meeting every row"; they
//! never optimize. Each one polls a caller-supplied cancellation predicate
//! and gives up with [`Feasibility::TimedOut`] once it returns true.

mod sat;
mod search;

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::constraints::Problem;

pub use sat::SatSolver;
pub use search::SearchSolver;

/// Outcome of a solve that did not fail internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feasibility {
    /// One value per variable, in variable order.
    Feasible(Vec<bool>),
    Infeasible,
    TimedOut,
}

pub trait FeasibilitySolver {
    /// Looks for any assignment satisfying `problem`.
    ///
    /// `cancel` is evaluated periodically; once it returns true the solver
    /// stops and reports [`Feasibility::TimedOut`]. Backend failures are
    /// returned as `Err`.
    fn solve(
        &mut self,
        problem: &Problem,
        cancel: &mut dyn FnMut() -> bool,
    ) -> anyhow::Result<Feasibility>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum SolverBackend {
    /// Branch and propagate over the linear rows.
    #[default]
    Search,
    /// CNF cardinality encoding handed to varisat.
    Sat,
}

impl SolverBackend {
    pub fn build(self) -> Box<dyn FeasibilitySolver> {
        match self {
            SolverBackend::Search => Box::new(SearchSolver::default()),
            SolverBackend::Sat => Box::new(SatSolver),
        }
    }
}

/// A wall-clock budget turned into a cancellation predicate.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    until: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Deadline {
            until: Instant::now() + budget,
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.until
    }
}

/// Cancels after a fixed number of polls. For targets without a monotonic
/// clock, and for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct WorkBudget {
    remaining: u64,
}

impl WorkBudget {
    pub fn new(polls: u64) -> Self {
        WorkBudget { remaining: polls }
    }

    pub fn exhausted(&mut self) -> bool {
        if self.remaining == 0 {
            return true;
        }
        self.remaining -= 1;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{LinearConstraint, Relation};

    fn both() -> [Box<dyn FeasibilitySolver>; 2] {
        [SolverBackend::Search.build(), SolverBackend::Sat.build()]
    }

    fn never() -> impl FnMut() -> bool {
        || false
    }

    /// Three cells in a row, "1" on each side of the middle pair:
    /// x0 + x1 = 1, x1 + x2 = 1, total exactly 1.
    fn chain() -> Problem {
        Problem {
            variables: 3,
            constraints: vec![
                LinearConstraint::count([0, 1], Relation::Eq, 1),
                LinearConstraint::count([1, 2], Relation::Eq, 1),
                LinearConstraint::count(0..3, Relation::Ge, 1),
                LinearConstraint::count(0..3, Relation::Le, 1),
            ],
        }
    }

    #[test]
    fn test_feasible_assignment_satisfies_every_row() {
        for mut solver in both() {
            let problem = chain();
            match solver.solve(&problem, &mut never()).unwrap() {
                Feasibility::Feasible(x) => {
                    assert!(problem.is_satisfied_by(&x));
                    assert_eq!(x, vec![false, true, false]);
                }
                other => panic!("expected a solution, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_contradiction_is_infeasible() {
        for mut solver in both() {
            let mut problem = chain();
            problem
                .constraints
                .push(LinearConstraint::count([1], Relation::Eq, 0));
            assert_eq!(
                solver.solve(&problem, &mut never()).unwrap(),
                Feasibility::Infeasible
            );
        }
    }

    #[test]
    fn test_immediate_cancel_times_out() {
        for mut solver in both() {
            let mut cancel = || true;
            assert_eq!(
                solver.solve(&chain(), &mut cancel).unwrap(),
                Feasibility::TimedOut
            );
        }
    }

    #[test]
    fn test_empty_problem_is_trivially_feasible() {
        for mut solver in both() {
            let problem = Problem::default();
            assert_eq!(
                solver.solve(&problem, &mut never()).unwrap(),
                Feasibility::Feasible(vec![])
            );
        }
    }

    #[test]
    fn test_large_cardinality_rows() {
        // 30 variables, pairs sum to one, total between 15 and 15.
        let mut constraints: Vec<LinearConstraint> = (0..15)
            .map(|i| LinearConstraint::count([2 * i, 2 * i + 1], Relation::Eq, 1))
            .collect();
        constraints.push(LinearConstraint::count(0..30, Relation::Ge, 15));
        constraints.push(LinearConstraint::count(0..30, Relation::Le, 15));
        constraints.push(LinearConstraint::count([4], Relation::Eq, 1));
        let problem = Problem {
            variables: 30,
            constraints,
        };

        for mut solver in both() {
            match solver.solve(&problem, &mut never()).unwrap() {
                Feasibility::Feasible(x) => {
                    assert!(problem.is_satisfied_by(&x));
                    assert!(x[4] && !x[5]);
                }
                other => panic!("expected a solution, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_work_budget_counts_down() {
        let mut budget = WorkBudget::new(2);
        assert!(!budget.exhausted());
        assert!(!budget.exhausted());
        assert!(budget.exhausted());
        assert!(budget.exhausted());
    }

    #[test]
    fn test_deadline() {
        assert!(Deadline::after(Duration::ZERO).expired());
        assert!(!Deadline::after(Duration::from_secs(3600)).expired());
    }
}
