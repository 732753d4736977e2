use std::collections::VecDeque;

use crate::constraints::{Problem, Relation};

use super::{Feasibility, FeasibilitySolver};

/// Depth-first search over 0/1 assignments with bound propagation.
///
/// Every row tracks the sum of its assigned terms plus the smallest and
/// largest amount its free terms could still add. A row whose range no
/// longer contains its right-hand side is a conflict; a free variable
/// whose value would push the range past the right-hand side is forced.
/// Backtracking is chronological. The cancellation predicate is polled
/// once per node.
#[derive(Debug, Default)]
pub struct SearchSolver {
    nodes: u64,
}

impl SearchSolver {
    /// Nodes expanded by the most recent solve.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }
}

struct Row {
    terms: Vec<(usize, i64)>,
    relation: Relation,
    rhs: i64,
    fixed: i64,
    min_free: i64,
    max_free: i64,
}

impl Row {
    fn lo(&self) -> i64 {
        self.fixed + self.min_free
    }

    fn hi(&self) -> i64 {
        self.fixed + self.max_free
    }

    fn bounded_above(&self) -> bool {
        matches!(self.relation, Relation::Eq | Relation::Le)
    }

    fn bounded_below(&self) -> bool {
        matches!(self.relation, Relation::Eq | Relation::Ge)
    }

    fn violated(&self) -> bool {
        (self.bounded_above() && self.lo() > self.rhs)
            || (self.bounded_below() && self.hi() < self.rhs)
    }

    /// The value `coefficient`'s variable is forced to, if any.
    fn forced(&self, coefficient: i64) -> Option<bool> {
        if self.bounded_above() && self.lo() + coefficient.abs() > self.rhs {
            return Some(coefficient < 0);
        }
        if self.bounded_below() && self.hi() - coefficient.abs() < self.rhs {
            return Some(coefficient > 0);
        }
        None
    }
}

struct State {
    rows: Vec<Row>,
    occurrences: Vec<Vec<(usize, i64)>>,
    values: Vec<Option<bool>>,
    /// Assigned variables, innermost last; `true` marks a decision.
    trail: Vec<(usize, bool)>,
    queue: VecDeque<usize>,
    queued: Vec<bool>,
    cursor: usize,
}

impl State {
    fn new(problem: &Problem) -> Self {
        let mut occurrences = vec![Vec::new(); problem.variables];
        let rows: Vec<Row> = problem
            .constraints
            .iter()
            .enumerate()
            .map(|(r, constraint)| {
                for &(v, c) in &constraint.terms {
                    occurrences[v].push((r, c));
                }
                Row {
                    terms: constraint.terms.clone(),
                    relation: constraint.relation,
                    rhs: constraint.rhs,
                    fixed: 0,
                    min_free: constraint.terms.iter().map(|&(_, c)| c.min(0)).sum(),
                    max_free: constraint.terms.iter().map(|&(_, c)| c.max(0)).sum(),
                }
            })
            .collect();
        let row_count = rows.len();

        State {
            rows,
            occurrences,
            values: vec![None; problem.variables],
            trail: Vec::new(),
            queue: (0..row_count).collect(),
            queued: vec![true; row_count],
            cursor: 0,
        }
    }

    fn assign(&mut self, variable: usize, value: bool, decision: bool) {
        debug_assert!(self.values[variable].is_none());
        self.values[variable] = Some(value);
        self.trail.push((variable, decision));
        for &(r, c) in &self.occurrences[variable] {
            let row = &mut self.rows[r];
            if value {
                row.fixed += c;
            }
            if c > 0 {
                row.max_free -= c;
            } else {
                row.min_free -= c;
            }
            if !self.queued[r] {
                self.queued[r] = true;
                self.queue.push_back(r);
            }
        }
    }

    fn unassign(&mut self, variable: usize) {
        let value = self.values[variable].take().unwrap_or(false);
        for &(r, c) in &self.occurrences[variable] {
            let row = &mut self.rows[r];
            if value {
                row.fixed -= c;
            }
            if c > 0 {
                row.max_free += c;
            } else {
                row.min_free += c;
            }
        }
        self.cursor = self.cursor.min(variable);
    }

    /// Runs queued rows to a fixpoint. Returns false on conflict.
    fn propagate(&mut self) -> bool {
        while let Some(r) = self.queue.pop_front() {
            self.queued[r] = false;
            let row = &self.rows[r];
            if row.violated() {
                return false;
            }
            let forced = row
                .terms
                .iter()
                .filter(|&&(v, _)| self.values[v].is_none())
                .find_map(|&(v, c)| row.forced(c).map(|value| (v, value)));
            if let Some((v, value)) = forced {
                // Re-queues this row too, so the remaining terms get checked.
                self.assign(v, value, false);
            }
        }
        true
    }

    fn clear_queue(&mut self) {
        for r in self.queue.drain(..) {
            self.queued[r] = false;
        }
    }

    /// Undoes assignments back to the latest decision and takes its other
    /// branch. Returns false once no decision is left to flip.
    fn backtrack(&mut self) -> bool {
        self.clear_queue();
        while let Some((variable, decision)) = self.trail.pop() {
            let value = self.values[variable].unwrap_or(false);
            self.unassign(variable);
            if decision {
                self.assign(variable, !value, false);
                return true;
            }
        }
        false
    }

    fn next_free(&mut self) -> Option<usize> {
        while self.cursor < self.values.len() {
            if self.values[self.cursor].is_none() {
                return Some(self.cursor);
            }
            self.cursor += 1;
        }
        None
    }
}

impl FeasibilitySolver for SearchSolver {
    fn solve(
        &mut self,
        problem: &Problem,
        cancel: &mut dyn FnMut() -> bool,
    ) -> anyhow::Result<Feasibility> {
        if let Some(constraint) = problem
            .constraints
            .iter()
            .find(|c| c.terms.iter().any(|&(v, _)| v >= problem.variables))
        {
            anyhow::bail!("constraint `{constraint}` names a variable past {}", problem.variables);
        }

        self.nodes = 0;
        let mut state = State::new(problem);

        loop {
            self.nodes += 1;
            if cancel() {
                tracing::debug!(nodes = self.nodes, "search cancelled");
                return Ok(Feasibility::TimedOut);
            }

            if !state.propagate() {
                if !state.backtrack() {
                    tracing::debug!(nodes = self.nodes, "search space exhausted");
                    return Ok(Feasibility::Infeasible);
                }
                continue;
            }

            match state.next_free() {
                Some(variable) => state.assign(variable, false, true),
                None => {
                    tracing::debug!(nodes = self.nodes, "search found an assignment");
                    let assignment = state.values.iter().map(|v| v.unwrap_or(false)).collect();
                    return Ok(Feasibility::Feasible(assignment));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::LinearConstraint;

    fn solve(problem: &Problem) -> Feasibility {
        SearchSolver::default()
            .solve(problem, &mut || false)
            .unwrap()
    }

    #[test]
    fn test_negative_and_weighted_coefficients() {
        // 2a - b + c = 2, a + b <= 1
        let problem = Problem {
            variables: 3,
            constraints: vec![
                LinearConstraint {
                    terms: vec![(0, 2), (1, -1), (2, 1)],
                    relation: Relation::Eq,
                    rhs: 2,
                },
                LinearConstraint::count([0, 1], Relation::Le, 1),
            ],
        };

        match solve(&problem) {
            Feasibility::Feasible(x) => assert!(problem.is_satisfied_by(&x)),
            other => panic!("expected a solution, got {other:?}"),
        }
    }

    #[test]
    fn test_needs_backtracking() {
        // x0 is tried false first; the parity of the rows forces it true.
        let problem = Problem {
            variables: 4,
            constraints: vec![
                LinearConstraint::count([0, 1, 2, 3], Relation::Eq, 3),
                LinearConstraint::count([1, 2], Relation::Le, 1),
                LinearConstraint::count([2, 3], Relation::Ge, 1),
            ],
        };

        match solve(&problem) {
            Feasibility::Feasible(x) => {
                assert!(problem.is_satisfied_by(&x));
                assert!(x[0]);
            }
            other => panic!("expected a solution, got {other:?}"),
        }
    }

    #[test]
    fn test_pigeonhole_is_infeasible() {
        // Three pigeons, two holes: p_i = x[2i] + x[2i+1] = 1, each hole <= 1.
        let mut constraints: Vec<LinearConstraint> = (0..3)
            .map(|p| LinearConstraint::count([2 * p, 2 * p + 1], Relation::Eq, 1))
            .collect();
        constraints.push(LinearConstraint::count([0, 2, 4], Relation::Le, 1));
        constraints.push(LinearConstraint::count([1, 3, 5], Relation::Le, 1));
        let problem = Problem {
            variables: 6,
            constraints,
        };

        assert_eq!(solve(&problem), Feasibility::Infeasible);
    }

    #[test]
    fn test_empty_row_with_positive_lower_bound_is_infeasible() {
        let problem = Problem {
            variables: 2,
            constraints: vec![LinearConstraint::count(Vec::new(), Relation::Ge, 1)],
        };
        assert_eq!(solve(&problem), Feasibility::Infeasible);
    }

    #[test]
    fn test_cancellation_is_polled_per_node() {
        let problem = Problem {
            variables: 40,
            constraints: vec![LinearConstraint::count(0..40, Relation::Eq, 20)],
        };
        let mut polls = 0;
        let mut solver = SearchSolver::default();
        let outcome = solver
            .solve(&problem, &mut || {
                polls += 1;
                polls > 5
            })
            .unwrap();

        assert_eq!(outcome, Feasibility::TimedOut);
        assert_eq!(solver.nodes(), 6);
    }

    #[test]
    fn test_unknown_variable_is_an_error() {
        let problem = Problem {
            variables: 1,
            constraints: vec![LinearConstraint::count([3], Relation::Eq, 1)],
        };
        let err = SearchSolver::default()
            .solve(&problem, &mut || false)
            .unwrap_err();
        assert!(err.to_string().contains("x_3 = 1"));
    }
}
